//! Error types for envelope encryption.

use thiserror::Error;

/// Errors produced by sealing and opening message envelopes.
///
/// All variants are fatal for the current attempt. There is no transient
/// case: a one-shot ciphertext cannot be re-fetched, so the caller must not
/// retry on any of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Key or IV absent, not decodable, or the wrong length.
    ///
    /// Typically means the URL fragment was stripped or mangled before the
    /// recipient opened the link.
    #[error("key material missing or unparsable: {reason}")]
    KeyMaterialMissing {
        /// What failed to parse.
        reason: String,
    },

    /// Authentication check failed.
    ///
    /// Wrong key, wrong IV, corrupted ciphertext, or deliberate tampering.
    /// Indistinguishable by design; GCM rejects all of them the same way.
    #[error("decryption failed: ciphertext rejected by authentication check")]
    DecryptionFailed,

    /// The AEAD backend refused the operation.
    #[error("cryptographic backend unavailable")]
    CryptoUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_does_not_leak_inputs() {
        let err = EnvelopeError::KeyMaterialMissing { reason: "iv wrong length".to_string() };
        let msg = err.to_string();
        assert!(msg.contains("key material"));

        // DecryptionFailed carries no payload at all; nothing to leak.
        assert_eq!(
            EnvelopeError::DecryptionFailed.to_string(),
            "decryption failed: ciphertext rejected by authentication check"
        );
    }
}
