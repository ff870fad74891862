//! Error classification for the reveal flow.

use cinderlink_core::TransportError;
use cinderlink_crypto::EnvelopeError;
use thiserror::Error;

/// Terminal failure kinds for a reveal session.
///
/// Every failure ends the attempt; there is no transient case. The crypto
/// variant records whether the one-shot fetch had already succeeded when the
/// failure happened, because that changes what the user must be told: a
/// decryption failure after consumption means the message is permanently
/// lost, not that they should try again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RevealErrorKind {
    /// The transport refused or could not find the envelope.
    #[error(transparent)]
    Transport(TransportError),

    /// Decryption-side failure.
    #[error("{source}")]
    Crypto {
        /// The underlying envelope error.
        source: EnvelopeError,
        /// True if the server had already released (and consumed) the
        /// ciphertext when this failure occurred.
        consumed: bool,
    },
}

impl RevealErrorKind {
    /// True if the secret is gone for good: the one-shot envelope was
    /// consumed server-side but the client could not recover the plaintext.
    pub fn is_permanent_loss(&self) -> bool {
        matches!(self, Self::Crypto { consumed: true, .. })
    }

    /// Stable localization key for the user-facing message.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::Transport(error) => error.message_key(),
            Self::Crypto { source, consumed } => match source {
                // The envelope is consumed; a mangled link or failed tag
                // check at this point is unrecoverable.
                _ if *consumed => "messagePermanentlyLost",
                EnvelopeError::KeyMaterialMissing { .. } => "linkMissingKeyMaterial",
                EnvelopeError::DecryptionFailed => "messageCorrupted",
                EnvelopeError::CryptoUnavailable => "encryptionUnavailable",
            },
        }
    }
}
