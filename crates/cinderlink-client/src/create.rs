//! Create-flow state machine.
//!
//! The sender's session: seal the plaintext locally, hand the transport a
//! ciphertext-only request, and compose the share link when the token comes
//! back. Pure state machine - it consumes [`CreateEvent`] inputs and returns
//! [`CreateAction`] instructions for the runtime to execute.
//!
//! # State Machine
//!
//! ```text
//! ┌───────────┐  Submit   ┌────────────┐  TokenIssued  ┌───────────┐
//! │ Composing │──────────>│ Submitting │──────────────>│ LinkReady │
//! └───────────┘           └────────────┘               └───────────┘
//!                               │ SubmitFailed / seal failure
//!                               ↓
//!                          ┌────────┐
//!                          │ Failed │
//!                          └────────┘
//! ```
//!
//! Key material is generated inside `Submit` handling, held only until the
//! token arrives, and leaves the session exclusively through the composed
//! link fragment. It is never part of a [`CreateAction`] payload.

use cinderlink_core::{
    CreateRequest, Environment, KeyFragment, SecretToken, ShareableLink, TransportError,
    compose_link,
};
use cinderlink_crypto::{EnvelopeError, IV_SIZE, KEY_SIZE, KeyMaterial, seal};

use crate::config::UiContext;

/// Create-flow state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateState {
    /// Waiting for the sender to submit a message.
    Composing,
    /// Ciphertext handed to the transport, awaiting a token.
    Submitting,
    /// Token received, share link composed.
    LinkReady,
    /// Terminal failure.
    Failed(CreateFailure),
}

/// Why a create flow failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateFailure {
    /// The transport rejected the create call.
    Transport(TransportError),
    /// Sealing the message failed before anything left the client.
    Crypto(EnvelopeError),
}

/// Events fed into the create session.
#[derive(Debug, Clone)]
pub enum CreateEvent {
    /// Sender submitted a message.
    Submit {
        /// The secret to share. Not retained after sealing.
        plaintext: String,
        /// Minutes until expiry.
        expire_minutes: u32,
        /// Optional notification address.
        sender_email: Option<String>,
    },
    /// Transport issued a token for the stored envelope.
    TokenIssued {
        /// Server-assigned opaque token.
        token: SecretToken,
    },
    /// Transport rejected the create call.
    SubmitFailed {
        /// Classified failure.
        error: TransportError,
    },
}

/// Actions the create session produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateAction {
    /// Hand this request to the transport's create operation.
    ///
    /// Contains the sealed ciphertext and storage policy only; the request
    /// type has no field that could carry key material.
    SubmitCreate {
        /// Ciphertext-only create payload.
        request: CreateRequest,
    },
    /// Re-render the view.
    Render,
}

/// Sender-side view session.
///
/// One session per message. Owns the per-message key material between
/// sealing and link composition; the material is dropped (and zeroized) as
/// soon as the link exists.
pub struct CreateSession<E: Environment> {
    env: E,
    context: UiContext,
    state: CreateState,
    /// Raw key material awaiting the token; encoded into the fragment only
    /// once the token arrives. `None` outside Submitting.
    pending: Option<KeyMaterial>,
    /// Composed link, available once `LinkReady`.
    link: Option<ShareableLink>,
}

impl<E: Environment> CreateSession<E> {
    /// Create a session for one message.
    pub fn new(env: E, context: UiContext) -> Self {
        Self { env, context, state: CreateState::Composing, pending: None, link: None }
    }

    /// Current state.
    pub fn state(&self) -> &CreateState {
        &self.state
    }

    /// The composed share link. `None` until `LinkReady`.
    pub fn share_link(&self) -> Option<&ShareableLink> {
        self.link.as_ref()
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: CreateEvent) -> Vec<CreateAction> {
        match event {
            CreateEvent::Submit { plaintext, expire_minutes, sender_email } => {
                self.submit(&plaintext, expire_minutes, sender_email)
            },
            CreateEvent::TokenIssued { token } => self.token_issued(token),
            CreateEvent::SubmitFailed { error } => self.submit_failed(error),
        }
    }

    /// Seal the message and produce the transport request.
    ///
    /// Re-entrant submits while one is in flight are ignored; a session
    /// handles exactly one message.
    fn submit(
        &mut self,
        plaintext: &str,
        expire_minutes: u32,
        sender_email: Option<String>,
    ) -> Vec<CreateAction> {
        if self.state != CreateState::Composing {
            tracing::debug!(state = ?self.state, "ignoring re-entrant submit");
            return vec![];
        }

        // Fresh key material per message, never reused.
        let material =
            KeyMaterial::from_random(self.env.random_array::<KEY_SIZE>(), self.env.random_array::<IV_SIZE>());

        let sealed = match seal(plaintext, &material) {
            Ok(sealed) => sealed,
            Err(error) => {
                tracing::warn!(%error, "sealing failed before submission");
                self.state = CreateState::Failed(CreateFailure::Crypto(error));
                return vec![CreateAction::Render];
            },
        };

        let mut request = CreateRequest::new(sealed.ciphertext).expire_minutes(expire_minutes);
        if let Some(email) = sender_email {
            request = request.sender_email(email);
        }

        self.pending = Some(material);
        self.state = CreateState::Submitting;
        tracing::debug!("message sealed, submitting ciphertext");

        vec![CreateAction::SubmitCreate { request }, CreateAction::Render]
    }

    /// Compose the share link from the issued token.
    fn token_issued(&mut self, token: SecretToken) -> Vec<CreateAction> {
        if self.state != CreateState::Submitting {
            tracing::debug!(state = ?self.state, "ignoring token outside Submitting");
            return vec![];
        }
        let Some(material) = self.pending.take() else {
            tracing::debug!("ignoring token with no pending key material");
            return vec![];
        };

        let key = material.encoded_key();
        let iv = material.encoded_iv();
        let url = compose_link(&self.context.public_host, &token, &key, &iv);
        tracing::debug!(%token, "share link composed");

        self.link = Some(ShareableLink {
            host: self.context.public_host.trim_end_matches('/').to_string(),
            token,
            fragment: KeyFragment { key, iv },
        });
        debug_assert_eq!(self.link.as_ref().map(ShareableLink::to_url), Some(url));
        self.state = CreateState::LinkReady;

        vec![CreateAction::Render]
    }

    /// Terminal transport failure; pending key material is discarded.
    fn submit_failed(&mut self, error: TransportError) -> Vec<CreateAction> {
        if self.state != CreateState::Submitting {
            return vec![];
        }
        tracing::warn!(%error, "create call failed");
        self.pending = None;
        self.state = CreateState::Failed(CreateFailure::Transport(error));

        vec![CreateAction::Render]
    }
}

#[cfg(test)]
mod tests {
    use cinderlink_crypto::open;

    use super::*;
    use crate::system_env::SystemEnv;

    fn submit_event(plaintext: &str) -> CreateEvent {
        CreateEvent::Submit {
            plaintext: plaintext.to_string(),
            expire_minutes: 60,
            sender_email: None,
        }
    }

    fn session() -> CreateSession<SystemEnv> {
        CreateSession::new(SystemEnv::new(), UiContext::new("https://secrets.example"))
    }

    #[test]
    fn submit_produces_ciphertext_only_request() {
        let mut session = session();
        let actions = session.handle(submit_event("the launch code"));

        let [CreateAction::SubmitCreate { request }, CreateAction::Render] = actions.as_slice()
        else {
            unreachable!("submit must produce SubmitCreate + Render");
        };

        assert_eq!(request.expire_minutes, 60);
        assert_eq!(request.max_views, 1);
        // The sealed ciphertext must not decrypt to the plaintext trivially
        // and must not contain it.
        assert!(!request.ciphertext.contains("the launch code"));
        assert_eq!(*session.state(), CreateState::Submitting);
    }

    #[test]
    fn token_yields_link_whose_fragment_opens_the_ciphertext() {
        let mut session = session();
        let actions = session.handle(submit_event("hello"));
        let CreateAction::SubmitCreate { request } = &actions[0] else {
            unreachable!("first action is SubmitCreate");
        };
        let ciphertext = request.ciphertext.clone();

        session.handle(CreateEvent::TokenIssued { token: SecretToken::new("tok-1") });

        let link = session.share_link().unwrap();
        assert_eq!(*session.state(), CreateState::LinkReady);
        assert_eq!(link.token.as_str(), "tok-1");
        assert_eq!(
            link.to_url(),
            format!("https://secrets.example/read/tok-1#key={}&iv={}", link.fragment.key, link.fragment.iv)
        );

        let opened = open(&ciphertext, &link.fragment.key, &link.fragment.iv).unwrap();
        assert_eq!(opened, "hello");
    }

    #[test]
    fn key_material_is_fresh_per_session() {
        let mut first = session();
        let mut second = session();
        let _ = first.handle(submit_event("same message"));
        let _ = second.handle(submit_event("same message"));
        let _ = first.handle(CreateEvent::TokenIssued { token: SecretToken::new("a") });
        let _ = second.handle(CreateEvent::TokenIssued { token: SecretToken::new("b") });

        let first_link = first.share_link().unwrap();
        let second_link = second.share_link().unwrap();
        assert_ne!(first_link.fragment.key, second_link.fragment.key);
        assert_ne!(first_link.fragment.iv, second_link.fragment.iv);
    }

    #[test]
    fn reentrant_submit_is_ignored() {
        let mut session = session();
        let _ = session.handle(submit_event("one"));
        let actions = session.handle(submit_event("two"));

        assert!(actions.is_empty());
        assert_eq!(*session.state(), CreateState::Submitting);
    }

    #[test]
    fn transport_failure_is_terminal_and_drops_key_material() {
        let mut session = session();
        let _ = session.handle(submit_event("hello"));
        let actions = session.handle(CreateEvent::SubmitFailed {
            error: TransportError::RateLimited,
        });

        assert_eq!(actions, vec![CreateAction::Render]);
        assert_eq!(
            *session.state(),
            CreateState::Failed(CreateFailure::Transport(TransportError::RateLimited))
        );
        assert!(session.share_link().is_none());

        // A token arriving after failure must not resurrect the flow.
        let actions = session.handle(CreateEvent::TokenIssued { token: SecretToken::new("late") });
        assert!(actions.is_empty());
        assert!(session.share_link().is_none());
    }

    #[test]
    fn token_before_submit_is_ignored() {
        let mut session = session();
        let actions = session.handle(CreateEvent::TokenIssued { token: SecretToken::new("t") });

        assert!(actions.is_empty());
        assert_eq!(*session.state(), CreateState::Composing);
    }
}
