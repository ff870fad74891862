//! Cinderlink Protocol Core
//!
//! Shared building blocks for the one-shot secret link protocol: the share
//! link codec, the transport collaborator contract with its closed error
//! taxonomy, and the environment abstraction that keeps time and randomness
//! at the seam for deterministic testing.
//!
//! # Link anatomy
//!
//! ```text
//! https://host/read/<token>#key=<k>&iv=<i>
//! └──────────┬──────────────┘└─────┬──────┘
//!    sent to the server       fragment: parsed client-side only,
//!    on retrieval             never part of any outgoing request
//! ```
//!
//! The fragment is the sole carrier of key material between sender and
//! recipient. The server observes the token and the sealed ciphertext,
//! nothing else.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod link;
pub mod transport;

pub use env::Environment;
pub use link::{KeyFragment, LinkError, ShareableLink, compose_link, parse_fragment};
pub use transport::{CreateRequest, SecretToken, Transport, TransportError};
