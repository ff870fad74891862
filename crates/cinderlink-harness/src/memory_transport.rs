//! In-memory one-shot envelope store.
//!
//! Implements the Transport contract with the collaborator's semantics:
//! opaque tokens, atomic consume-on-read, expiry, and injectable rate
//! limiting. Internally it speaks raw status signals and classifies them
//! through [`TransportError::from_status`] at the trait boundary, exactly
//! where a real HTTP client would.
//!
//! The server clock is the shared [`Environment`] clock: expiry is measured
//! in whole minutes elapsed since the transport was constructed, so
//! advancing a [`SimEnv`](crate::sim_env::SimEnv) (or awaiting its virtual
//! `sleep`) moves envelope expiry along with everything else in the test.
//!
//! Every value crossing the boundary is recorded in an observation log so
//! tests can prove what the server did (and did not) get to see.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use cinderlink_core::{
    CreateRequest, Environment, SecretToken, Transport, TransportError, transport::STATUS_GONE,
    transport::STATUS_NOT_FOUND, transport::STATUS_RATE_LIMITED,
};

/// One recorded boundary crossing.
///
/// Fields are the exact strings the transport received; confidentiality
/// tests scan these for key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedCall {
    /// A create call.
    Create {
        /// Ciphertext as received.
        ciphertext: String,
        /// Requested time-to-live.
        expire_minutes: u32,
        /// Requested view budget.
        max_views: u32,
        /// Notification address, if any.
        sender_email: Option<String>,
    },
    /// A read call.
    Read {
        /// Token as received.
        token: String,
    },
}

struct StoredEnvelope {
    ciphertext: String,
    /// Expiry on the transport's minute clock.
    expires_at: u64,
    views_left: u32,
}

struct TransportInner {
    store: HashMap<String, StoredEnvelope>,
    observed: Vec<ObservedCall>,
    next_token: u64,
    /// Refuse reads with 429 after this many, if set.
    read_budget: Option<u32>,
}

/// In-memory one-shot transport for testing and simulation.
///
/// Clones share the same store and the same environment clock. Thread-safe
/// through a mutex; uses `lock().expect()` which panics if the mutex is
/// poisoned - acceptable for test code.
#[derive(Clone)]
pub struct MemoryTransport<E: Environment> {
    env: E,
    /// Construction instant; the server clock counts minutes from here.
    epoch: E::Instant,
    inner: Arc<Mutex<TransportInner>>,
}

#[allow(clippy::expect_used)]
impl<E: Environment> MemoryTransport<E> {
    /// Create an empty store whose clock follows `env`.
    pub fn new(env: E) -> Self {
        let epoch = env.now();
        Self {
            env,
            epoch,
            inner: Arc::new(Mutex::new(TransportInner {
                store: HashMap::new(),
                observed: Vec::new(),
                next_token: 1,
                read_budget: None,
            })),
        }
    }

    /// Allow only `budget` reads; further reads are rate-limited.
    #[must_use]
    pub fn with_read_budget(self, budget: u32) -> Self {
        self.inner.lock().expect("transport mutex poisoned").read_budget = Some(budget);
        self
    }

    /// Everything that has crossed the boundary so far.
    pub fn observed(&self) -> Vec<ObservedCall> {
        self.inner.lock().expect("transport mutex poisoned").observed.clone()
    }

    /// Number of envelopes currently stored (expired ones included until
    /// they are touched).
    pub fn stored_count(&self) -> usize {
        self.inner.lock().expect("transport mutex poisoned").store.len()
    }

    /// Server clock: whole minutes elapsed on the environment clock.
    fn now_minutes(&self) -> u64 {
        (self.env.now() - self.epoch).as_secs() / 60
    }

    /// Raw-status read, the sim equivalent of the HTTP endpoint.
    fn read_raw(&self, token: &str) -> Result<String, u16> {
        let now = self.now_minutes();
        let mut inner = self.inner.lock().expect("transport mutex poisoned");
        inner.observed.push(ObservedCall::Read { token: token.to_string() });

        if let Some(budget) = inner.read_budget {
            if budget == 0 {
                return Err(STATUS_RATE_LIMITED);
            }
            inner.read_budget = Some(budget - 1);
        }

        let Some(envelope) = inner.store.get_mut(token) else {
            return Err(STATUS_NOT_FOUND);
        };

        if envelope.expires_at <= now {
            inner.store.remove(token);
            tracing::debug!(token, "expired envelope removed on read");
            return Err(STATUS_GONE);
        }

        envelope.views_left -= 1;
        let ciphertext = envelope.ciphertext.clone();
        if envelope.views_left == 0 {
            // Atomic consume: the envelope is gone before the response
            // leaves, so a concurrent second read observes not-found.
            inner.store.remove(token);
            tracing::debug!(token, "envelope consumed by one-shot read");
        }
        Ok(ciphertext)
    }
}

impl<E: Environment> Transport for MemoryTransport<E> {
    #[allow(clippy::expect_used)]
    async fn create(&self, request: CreateRequest) -> Result<SecretToken, TransportError> {
        let expires_at = self.now_minutes() + u64::from(request.expire_minutes);
        let mut inner = self.inner.lock().expect("transport mutex poisoned");
        inner.observed.push(ObservedCall::Create {
            ciphertext: request.ciphertext.clone(),
            expire_minutes: request.expire_minutes,
            max_views: request.max_views,
            sender_email: request.sender_email.clone(),
        });

        let token = format!("tok-{:08x}", inner.next_token);
        inner.next_token += 1;
        tracing::debug!(%token, expire_minutes = request.expire_minutes, "envelope stored");
        inner.store.insert(
            token.clone(),
            StoredEnvelope {
                ciphertext: request.ciphertext,
                expires_at,
                views_left: request.max_views.max(1),
            },
        );

        Ok(SecretToken::new(token))
    }

    async fn read(&self, token: &SecretToken) -> Result<String, TransportError> {
        // Classification happens here, once, at the boundary.
        self.read_raw(token.as_str()).map_err(TransportError::from_status)
    }
}
