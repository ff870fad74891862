//! Production Environment implementation using system time and RNG.
//!
//! `SystemEnv` is the production implementation of the Environment trait
//! using real system time and cryptographic RNG.
//!
//! # Security
//!
//! The RNG uses getrandom which provides OS-level cryptographic randomness
//! (e.g., /dev/urandom on Linux, `BCryptGenRandom` on Windows). It is the
//! source of every per-message key and IV, so nothing weaker is acceptable.
//!
//! # Panics
//!
//! Panics if the OS RNG fails. This is intentional - a client without
//! functioning cryptographic randomness cannot seal anything securely, and
//! continuing would silently produce weak key material.

use std::time::Duration;

use cinderlink_core::Environment;

/// Production environment using system time and cryptographic RNG.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - cannot generate key material");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_arrays_are_fresh_per_call() {
        let env = SystemEnv::new();
        let first: [u8; 32] = env.random_array();
        let second: [u8; 32] = env.random_array();

        // 2^-256 false-failure probability is acceptable.
        assert_ne!(first, second);
    }
}
