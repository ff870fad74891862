//! Simulated environment with virtual time and seeded randomness.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use cinderlink_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Virtual instant: elapsed time since the simulation started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimInstant(Duration);

impl std::ops::Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// Deterministic environment: seeded RNG, manually advanced clock.
///
/// `sleep` advances the virtual clock instead of waiting, so time-dependent
/// flows run instantly and reproducibly. Clones share the same clock and
/// RNG stream.
#[derive(Clone)]
pub struct SimEnv {
    inner: Arc<Mutex<SimEnvInner>>,
}

struct SimEnvInner {
    rng: ChaCha8Rng,
    elapsed: Duration,
}

impl SimEnv {
    /// Create an environment from an RNG seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimEnvInner {
                rng: ChaCha8Rng::seed_from_u64(seed),
                elapsed: Duration::ZERO,
            })),
        }
    }

    /// Create an environment with a fixed default seed.
    pub fn new() -> Self {
        Self::from_seed(0)
    }

    /// Advance the virtual clock.
    #[allow(clippy::expect_used)]
    pub fn advance(&self, duration: Duration) {
        let mut inner = self.inner.lock().expect("sim env mutex poisoned");
        inner.elapsed += duration;
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    #[allow(clippy::expect_used)]
    fn now(&self) -> Self::Instant {
        SimInstant(self.inner.lock().expect("sim env mutex poisoned").elapsed)
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.inner.lock().expect("sim env mutex poisoned").rng.fill_bytes(buffer);
    }
}
