//! Cinderlink Client
//!
//! Sans-IO state machines for the two view sessions of a one-shot secret
//! link: the sender's create flow and the recipient's reveal flow. Sessions
//! consume events and produce actions for the caller to execute; no I/O
//! happens inside the state machines.
//!
//! # Architecture
//!
//! - [`CreateSession`]: encrypts locally, hands the ciphertext-only request
//!   to the transport, and composes the share link once the token arrives.
//! - [`RevealSession`]: gates the decrypted content behind an explicit user
//!   confirmation, caches the plaintext so the one-shot fetch happens at
//!   most once, and treats every failure as terminal.
//! - [`task`]: cancellable fetch tasks with a generation-stamped result
//!   channel, so a result arriving after the view is torn down is discarded
//!   instead of mutating dead state.
//! - [`UiContext`]: explicit per-process configuration (host, locale,
//!   theme) threaded through session construction instead of ambient
//!   globals.
//!
//! # Confidentiality invariant
//!
//! Nothing handed to the transport - neither [`CreateAction::SubmitCreate`]
//! payloads nor read tokens - ever contains the key or IV. The fragment of
//! the composed link is the sole carrier of key material.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod create;
mod error;
mod reveal;
mod system_env;
pub mod task;

pub use cinderlink_core::{
    Environment, KeyFragment, LinkError, SecretToken, ShareableLink, Transport, TransportError,
};
pub use config::{Locale, Theme, UiContext};
pub use create::{CreateAction, CreateEvent, CreateSession, CreateState};
pub use error::RevealErrorKind;
pub use reveal::{RevealAction, RevealEvent, RevealSession, RevealState};
pub use system_env::SystemEnv;
