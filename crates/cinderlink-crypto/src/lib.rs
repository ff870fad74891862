//! Cinderlink Envelope Encryption
//!
//! Client-side cryptography for one-shot secret links. Pure functions with
//! deterministic outputs. Callers provide random bytes for deterministic
//! testing.
//!
//! # Envelope Lifecycle
//!
//! Every message gets fresh key material. The key and IV never accompany the
//! ciphertext to the server; they travel only inside the URL fragment of the
//! share link.
//!
//! ```text
//! Plaintext
//!     │
//!     ▼
//! AES-256-GCM seal (fresh 256-bit key, fresh 96-bit IV)
//!     │
//!     ├── ciphertext + tag ──► base64url ──► server
//!     └── key, IV ──────────► base64url ──► URL fragment (client-side only)
//! ```
//!
//! # Security
//!
//! Confidentiality:
//! - Key material is generated per message and never reused
//! - The server only ever observes the sealed ciphertext
//!
//! Authenticity:
//! - AES-256-GCM provides tamper-proof encryption
//! - Failed authentication tag -> [`EnvelopeError::DecryptionFailed`]
//!
//! One-shot semantics:
//! - A failed decryption after the server has released the ciphertext is
//!   unrecoverable: the envelope no longer exists server-side

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod encoding;
mod envelope;
mod error;
mod material;

pub use encoding::{decode, decode_array, encode};
pub use envelope::{GCM_TAG_SIZE, SealedEnvelope, open, seal};
pub use error::EnvelopeError;
pub use material::{IV_SIZE, KEY_SIZE, KeyMaterial};
