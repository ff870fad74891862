//! Message envelope sealing and opening using AES-256-GCM.
//!
//! All functions are pure - random bytes must be provided by the caller via
//! [`KeyMaterial`]. This enables deterministic testing and keeps the RNG at
//! the environment seam.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};

use crate::{
    encoding,
    error::EnvelopeError,
    material::{IV_SIZE, KEY_SIZE, KeyMaterial},
};

/// GCM authentication tag size (16 bytes), appended to the ciphertext.
pub const GCM_TAG_SIZE: usize = 16;

/// A sealed message ready for the create flow.
///
/// All three fields are unpadded base64url. Only `ciphertext` is ever handed
/// to the transport; `key` and `iv` go into the share link fragment and
/// nowhere else.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedEnvelope {
    /// Ciphertext with the 16-byte GCM tag appended.
    pub ciphertext: String,
    /// Encoded 256-bit key. Fragment-only.
    pub key: String,
    /// Encoded 96-bit IV. Fragment-only.
    pub iv: String,
}

// Debug must not expose the fragment-only fields.
impl std::fmt::Debug for SealedEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedEnvelope")
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

/// Seal a plaintext message with fresh key material.
///
/// The plaintext is not retained; the returned envelope is the only output.
///
/// # Errors
///
/// - [`EnvelopeError::CryptoUnavailable`] if the AEAD backend rejects the
///   operation. This does not happen with valid key material; it is surfaced
///   rather than asserted so the caller decides how to report it.
pub fn seal(plaintext: &str, material: &KeyMaterial) -> Result<SealedEnvelope, EnvelopeError> {
    let cipher = Aes256Gcm::new(material.key().into());
    let nonce = Nonce::from_slice(material.iv());

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|_| EnvelopeError::CryptoUnavailable)?;

    Ok(SealedEnvelope {
        ciphertext: encoding::encode(&ciphertext),
        key: material.encoded_key(),
        iv: material.encoded_iv(),
    })
}

/// Open a sealed message.
///
/// Pure function: no network access, no retries. A failure here is final for
/// this ciphertext instance - the one-shot source cannot be re-fetched.
///
/// # Errors
///
/// - [`EnvelopeError::KeyMaterialMissing`] if `key` or `iv` does not decode
///   to the expected length
/// - [`EnvelopeError::DecryptionFailed`] if the ciphertext is undecodable,
///   the authentication tag is rejected (wrong key, wrong IV, corruption,
///   tampering), or the plaintext is not UTF-8
pub fn open(ciphertext: &str, key: &str, iv: &str) -> Result<String, EnvelopeError> {
    let key_bytes: [u8; KEY_SIZE] = encoding::decode_array(key, "key")?;
    let iv_bytes: [u8; IV_SIZE] = encoding::decode_array(iv, "iv")?;

    // An undecodable ciphertext is corruption, not missing key material.
    let ciphertext_bytes =
        encoding::decode(ciphertext, "ciphertext").map_err(|_| EnvelopeError::DecryptionFailed)?;

    let cipher = Aes256Gcm::new(&key_bytes.into());
    let nonce = Nonce::from_slice(&iv_bytes);

    let plaintext_bytes = cipher
        .decrypt(nonce, ciphertext_bytes.as_slice())
        .map_err(|_| EnvelopeError::DecryptionFailed)?;

    String::from_utf8(plaintext_bytes).map_err(|_| EnvelopeError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn test_material() -> KeyMaterial {
        let mut key = [0u8; KEY_SIZE];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        KeyMaterial::from_random(key, [0x42; IV_SIZE])
    }

    #[test]
    fn seal_open_roundtrip() {
        let material = test_material();
        let sealed = seal("Hello, World!", &material).unwrap();
        let opened = open(&sealed.ciphertext, &sealed.key, &sealed.iv).unwrap();

        assert_eq!(opened, "Hello, World!");
    }

    #[test]
    fn seal_open_empty_message() {
        let material = test_material();
        let sealed = seal("", &material).unwrap();

        assert_eq!(open(&sealed.ciphertext, &sealed.key, &sealed.iv).unwrap(), "");
    }

    #[test]
    fn seal_open_multibyte_utf8() {
        let material = test_material();
        let plaintext = "金庫のパスワード: 🔑 “quoted”";
        let sealed = seal(plaintext, &material).unwrap();

        assert_eq!(open(&sealed.ciphertext, &sealed.key, &sealed.iv).unwrap(), plaintext);
    }

    #[test]
    fn ciphertext_carries_tag_overhead() {
        let material = test_material();
        let plaintext = "test message";
        let sealed = seal(plaintext, &material).unwrap();

        let raw = encoding::decode(&sealed.ciphertext, "ciphertext").unwrap();
        assert_eq!(raw.len(), plaintext.len() + GCM_TAG_SIZE);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let material = test_material();
        let sealed = seal("secret", &material).unwrap();

        let other = KeyMaterial::from_random([0xFF; KEY_SIZE], *material.iv());
        let result = open(&sealed.ciphertext, &other.encoded_key(), &sealed.iv);

        assert_eq!(result, Err(EnvelopeError::DecryptionFailed));
    }

    #[test]
    fn wrong_iv_fails_authentication() {
        let material = test_material();
        let sealed = seal("secret", &material).unwrap();

        let wrong_iv = encoding::encode(&[0xFF; IV_SIZE]);
        let result = open(&sealed.ciphertext, &sealed.key, &wrong_iv);

        assert_eq!(result, Err(EnvelopeError::DecryptionFailed));
    }

    #[test]
    fn missing_key_material_is_distinguished_from_tampering() {
        let material = test_material();
        let sealed = seal("secret", &material).unwrap();

        // Truncated key: parse failure, not an authentication failure.
        let result = open(&sealed.ciphertext, &sealed.key[..10], &sealed.iv);
        assert!(matches!(result, Err(EnvelopeError::KeyMaterialMissing { .. })));

        let result = open(&sealed.ciphertext, &sealed.key, "");
        assert!(matches!(result, Err(EnvelopeError::KeyMaterialMissing { .. })));
    }

    #[test]
    fn garbage_ciphertext_fails_closed() {
        let material = test_material();
        let sealed = seal("secret", &material).unwrap();

        let result = open("@@not-base64@@", &sealed.key, &sealed.iv);
        assert_eq!(result, Err(EnvelopeError::DecryptionFailed));
    }

    #[test]
    fn debug_output_omits_key_and_iv() {
        let material = test_material();
        let sealed = seal("secret", &material).unwrap();
        let rendered = format!("{sealed:?}");

        assert!(!rendered.contains(&sealed.key));
        assert!(!rendered.contains(&sealed.iv));
    }

    proptest! {
        /// Round-trip property: open(seal(p)) == p for arbitrary strings.
        #[test]
        fn roundtrip_arbitrary_strings(
            plaintext in ".{0,512}",
            key in prop::array::uniform32(any::<u8>()),
            iv in prop::array::uniform12(any::<u8>()),
        ) {
            let material = KeyMaterial::from_random(key, iv);
            let sealed = seal(&plaintext, &material).unwrap();
            let opened = open(&sealed.ciphertext, &sealed.key, &sealed.iv).unwrap();

            prop_assert_eq!(opened, plaintext);
        }

        /// Tamper detection: flipping any single bit of the raw ciphertext
        /// (body or tag) yields DecryptionFailed.
        #[test]
        fn any_bit_flip_is_detected(
            plaintext in ".{1,64}",
            bit in 0usize..64,
        ) {
            let material = test_material();
            let sealed = seal(&plaintext, &material).unwrap();

            let mut raw = encoding::decode(&sealed.ciphertext, "ciphertext").unwrap();
            let target = bit % (raw.len() * 8);
            raw[target / 8] ^= 1 << (target % 8);
            let tampered = encoding::encode(&raw);

            prop_assert_eq!(
                open(&tampered, &sealed.key, &sealed.iv),
                Err(EnvelopeError::DecryptionFailed)
            );
        }

        /// Same plaintext under independent key material yields unrelated
        /// ciphertexts; neither envelope opens with the other's keys.
        #[test]
        fn key_material_is_not_interchangeable(
            plaintext in ".{1,64}",
            key_a in prop::array::uniform32(any::<u8>()),
            key_b in prop::array::uniform32(any::<u8>()),
        ) {
            prop_assume!(key_a != key_b);

            let mat_a = KeyMaterial::from_random(key_a, [1; IV_SIZE]);
            let mat_b = KeyMaterial::from_random(key_b, [2; IV_SIZE]);

            let sealed_a = seal(&plaintext, &mat_a).unwrap();
            let sealed_b = seal(&plaintext, &mat_b).unwrap();

            prop_assert_ne!(&sealed_a.ciphertext, &sealed_b.ciphertext);
            prop_assert_eq!(
                open(&sealed_a.ciphertext, &sealed_b.key, &sealed_b.iv),
                Err(EnvelopeError::DecryptionFailed)
            );
        }
    }
}
