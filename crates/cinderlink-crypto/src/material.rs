//! Per-message symmetric key material.

use zeroize::Zeroize;

use crate::encoding;

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the GCM initialization vector in bytes (96 bits, the recommended
/// nonce length for AES-GCM).
pub const IV_SIZE: usize = 12;

/// Fresh symmetric key material for exactly one message.
///
/// Owned exclusively by the creating flow until encoded into a share link;
/// after that, whoever holds the link holds the key. Never serialized into
/// anything that crosses the transport boundary.
#[derive(Clone)]
pub struct KeyMaterial {
    /// 256-bit AES key.
    key: [u8; KEY_SIZE],
    /// 96-bit GCM initialization vector.
    iv: [u8; IV_SIZE],
}

impl KeyMaterial {
    /// Build key material from caller-provided random bytes.
    ///
    /// The caller MUST source both arrays from a cryptographically secure RNG
    /// in production and MUST NOT reuse them across messages.
    pub fn from_random(key: [u8; KEY_SIZE], iv: [u8; IV_SIZE]) -> Self {
        Self { key, iv }
    }

    /// Raw key bytes.
    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// Raw IV bytes.
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    /// Key encoded for the URL fragment.
    pub fn encoded_key(&self) -> String {
        encoding::encode(&self.key)
    }

    /// IV encoded for the URL fragment.
    pub fn encoded_iv(&self) -> String {
        encoding::encode(&self.iv)
    }
}

// Key material must not outlive its owner in memory.
impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.key.zeroize();
        self.iv.zeroize();
    }
}

// No Debug derive: key material must never end up in logs. Render a redacted
// placeholder instead.
impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial").finish_non_exhaustive()
    }
}
