//! Cancellable fetch tasks.
//!
//! The one-shot read runs as a spawned task so the view stays responsive
//! and can be torn down while the fetch is in flight. Results come back
//! over a channel stamped with the session generation that started them: a
//! result whose generation no longer matches the live session is stale and
//! must be discarded without touching any state. Dropping the handle aborts
//! the task outright.

use std::sync::Arc;

use cinderlink_core::{SecretToken, Transport, TransportError};
use tokio::sync::mpsc;

use crate::reveal::RevealEvent;

/// Outcome of a spawned fetch, stamped with its session generation.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Generation of the session that started the fetch.
    pub generation: u64,
    /// The transport result.
    pub result: Result<String, TransportError>,
}

impl FetchOutcome {
    /// The "still relevant" check: true if this outcome belongs to the
    /// currently live session generation.
    pub fn is_relevant(&self, live_generation: u64) -> bool {
        self.generation == live_generation
    }

    /// Convert into the reveal-session event this outcome represents.
    pub fn into_event(self) -> RevealEvent {
        match self.result {
            Ok(ciphertext) => RevealEvent::FetchSucceeded { ciphertext },
            Err(error) => RevealEvent::FetchFailed { error },
        }
    }
}

/// Handle to an in-flight one-shot fetch.
///
/// Dropping the handle aborts the fetch; a completion racing the abort
/// lands in a channel nobody reads and is discarded with it.
pub struct FetchTask {
    generation: u64,
    results: mpsc::Receiver<FetchOutcome>,
    abort: tokio::task::AbortHandle,
}

impl FetchTask {
    /// Spawn the one-shot read for `token`.
    ///
    /// `generation` identifies the session that owns this fetch; the caller
    /// compares it against its live generation before applying the result.
    pub fn spawn<T: Transport + 'static>(
        transport: Arc<T>,
        token: SecretToken,
        generation: u64,
    ) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            let result = transport.read(&token).await;
            if let Err(error) = &result {
                tracing::debug!(%error, "fetch task completed with transport error");
            }
            // The receiver may already be gone; a torn-down view simply
            // never observes the outcome.
            let _ = tx.send(FetchOutcome { generation, result }).await;
        });

        Self { generation, results: rx, abort: handle.abort_handle() }
    }

    /// Generation stamp of this task.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the outcome. `None` if the task was aborted.
    pub async fn recv(&mut self) -> Option<FetchOutcome> {
        self.results.recv().await
    }

    /// Abort the in-flight fetch.
    pub fn abort(&self) {
        self.abort.abort();
    }
}

impl Drop for FetchTask {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cinderlink_core::CreateRequest;

    use super::*;

    /// Transport that answers reads after a fixed delay.
    #[derive(Clone)]
    struct SlowTransport {
        delay: Duration,
        response: Result<String, TransportError>,
    }

    impl Transport for SlowTransport {
        async fn create(&self, _request: CreateRequest) -> Result<SecretToken, TransportError> {
            Ok(SecretToken::new("unused"))
        }

        async fn read(&self, _token: &SecretToken) -> Result<String, TransportError> {
            tokio::time::sleep(self.delay).await;
            self.response.clone()
        }
    }

    #[tokio::test]
    async fn outcome_arrives_with_generation_stamp() {
        let transport = Arc::new(SlowTransport {
            delay: Duration::from_millis(1),
            response: Ok("ciphertext".to_string()),
        });

        let mut task = FetchTask::spawn(transport, SecretToken::new("tok"), 7);
        let outcome = task.recv().await.unwrap();

        assert_eq!(outcome.generation, 7);
        assert!(outcome.is_relevant(7));
        assert!(!outcome.is_relevant(8));
        assert!(matches!(outcome.into_event(), RevealEvent::FetchSucceeded { .. }));
    }

    #[tokio::test]
    async fn aborted_task_yields_no_outcome() {
        let transport = Arc::new(SlowTransport {
            delay: Duration::from_secs(30),
            response: Ok("never".to_string()),
        });

        let mut task = FetchTask::spawn(transport, SecretToken::new("tok"), 1);
        task.abort();

        assert!(task.recv().await.is_none());
    }

    #[tokio::test]
    async fn stale_generation_is_discarded_not_applied() {
        let transport = Arc::new(SlowTransport {
            delay: Duration::from_millis(1),
            response: Err(TransportError::NotFound),
        });

        // The view restarted: live generation moved past the task's.
        let live_generation = 2;
        let mut task = FetchTask::spawn(transport, SecretToken::new("tok"), 1);
        let outcome = task.recv().await.unwrap();

        assert!(!outcome.is_relevant(live_generation));
    }

    #[tokio::test]
    async fn transport_error_becomes_fetch_failed_event() {
        let transport = Arc::new(SlowTransport {
            delay: Duration::from_millis(1),
            response: Err(TransportError::Expired),
        });

        let mut task = FetchTask::spawn(transport, SecretToken::new("tok"), 0);
        let outcome = task.recv().await.unwrap();

        assert!(matches!(
            outcome.into_event(),
            RevealEvent::FetchFailed { error: TransportError::Expired }
        ));
    }
}
