//! Transport-safe encoding of binary values.
//!
//! Everything that leaves this crate as a string - ciphertext, key, IV - is
//! unpadded base64url. The alphabet is safe in URL fragments without percent
//! escaping, and the encoding is byte-for-byte reversible.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::error::EnvelopeError;

/// Encode bytes as unpadded base64url.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode an unpadded base64url string.
///
/// # Errors
///
/// - [`EnvelopeError::KeyMaterialMissing`] if the input is not valid
///   base64url. The `what` label names the value for the error message
///   without echoing its content.
pub fn decode(encoded: &str, what: &str) -> Result<Vec<u8>, EnvelopeError> {
    URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| EnvelopeError::KeyMaterialMissing { reason: format!("{what} is not base64url") })
}

/// Decode an unpadded base64url string into a fixed-size array.
///
/// # Errors
///
/// - [`EnvelopeError::KeyMaterialMissing`] if the input is not valid
///   base64url or decodes to a different length than `N`.
pub fn decode_array<const N: usize>(encoded: &str, what: &str) -> Result<[u8; N], EnvelopeError> {
    let bytes = decode(encoded, what)?;
    bytes.try_into().map_err(|_| EnvelopeError::KeyMaterialMissing {
        reason: format!("{what} has the wrong length"),
    })
}
