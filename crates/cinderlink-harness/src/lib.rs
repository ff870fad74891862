//! Deterministic test harness for the Cinderlink protocol.
//!
//! Provides seeded implementations of the Environment and Transport traits
//! so every flow can run reproducibly and fully in memory:
//!
//! - [`SimEnv`]: virtual clock plus a seeded ChaCha RNG. Same seed, same key
//!   material, same link.
//! - [`MemoryTransport`]: a one-shot envelope store with the collaborator's
//!   exact consume/expiry/rate-limit semantics. It records every value that
//!   crosses the transport boundary, which is what lets the confidentiality
//!   tests prove key material never does.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod memory_transport;
pub mod sim_env;

pub use memory_transport::{MemoryTransport, ObservedCall};
pub use sim_env::{SimEnv, SimInstant};
