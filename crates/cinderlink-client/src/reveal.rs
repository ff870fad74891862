//! Reveal-flow state machine.
//!
//! The recipient's session. The read endpoint is one-shot - the server
//! consumes the envelope on first successful fetch - so this machine
//! decouples "ciphertext fetched and decrypted" from "user chose to expose
//! it on screen", and caches the decrypted plaintext so a re-render or
//! duplicate reveal request never triggers a second fetch.
//!
//! # State Machine
//!
//! ```text
//! ┌─────────┐ fetch+decrypt ok ┌───────┐ (automatic) ┌─────────┐
//! │ Loading │─────────────────>│ Ready │────────────>│ Confirm │
//! └─────────┘                  └───────┘             └─────────┘
//!      │ fetch/decrypt failure                            │ ConfirmReveal
//!      ↓                                                  ↓ (explicit user action)
//! ┌───────────┐                                     ┌──────────┐
//! │ Error(..) │                                     │ Revealed │
//! └───────────┘                                     └──────────┘
//! ```
//!
//! Transitions are monotonic; `Revealed` and `Error` are terminal and
//! absorb all further events. `Ready` is transient: it is passed through
//! within a single event handling on the way to `Confirm`.

use cinderlink_core::{KeyFragment, SecretToken, TransportError, parse_fragment};
use cinderlink_crypto::{EnvelopeError, open};

use crate::error::RevealErrorKind;

/// Reveal-flow state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealState {
    /// Fetching the ciphertext (or not started yet).
    Loading,
    /// Ciphertext fetched and decrypted. Transient; advances to `Confirm`
    /// automatically.
    Ready,
    /// Waiting for the user's explicit confirmation to display the secret.
    Confirm,
    /// Secret displayed. Terminal.
    Revealed,
    /// Attempt failed. Terminal.
    Error(RevealErrorKind),
}

impl RevealState {
    /// True for states that absorb all further events.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revealed | Self::Error(_))
    }
}

/// Events fed into the reveal session.
#[derive(Debug, Clone)]
pub enum RevealEvent {
    /// The one-shot fetch returned ciphertext. The envelope is now consumed
    /// server-side.
    FetchSucceeded {
        /// Sealed ciphertext from the transport.
        ciphertext: String,
    },
    /// The fetch failed; nothing was consumed.
    FetchFailed {
        /// Classified failure from the transport boundary.
        error: TransportError,
    },
    /// The user explicitly asked to display the secret.
    ConfirmReveal,
}

/// Actions the reveal session produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealAction {
    /// Start the one-shot read for this token.
    Fetch {
        /// Token to read. The only value from the link that may reach the
        /// server.
        token: SecretToken,
    },
    /// Re-render the view.
    Render,
}

/// Recipient-side view session.
///
/// One session per opened link. Construction takes the token from the URL
/// path and the raw fragment (if any); key material is parsed up front so a
/// mangled link fails before the one-shot envelope is consumed.
pub struct RevealSession {
    token: SecretToken,
    /// Parsed key material, or why parsing failed.
    fragment: Result<KeyFragment, EnvelopeError>,
    state: RevealState,
    /// Guard: the fetch is emitted at most once per session, ever.
    fetch_started: bool,
    /// True once the server has released (and consumed) the envelope.
    consumed: bool,
    /// Decrypted plaintext cache. Survives re-renders; the source
    /// ciphertext no longer exists server-side.
    plaintext: Option<String>,
}

impl RevealSession {
    /// Create a session for an opened link.
    ///
    /// `fragment` is the raw URL fragment, without or with its leading `#`;
    /// `None` if the URL carried no fragment at all.
    pub fn new(token: SecretToken, fragment: Option<&str>) -> Self {
        let fragment = fragment
            .ok_or(EnvelopeError::KeyMaterialMissing { reason: "link has no fragment".to_string() })
            .and_then(|raw| {
                parse_fragment(raw).map_err(|error| EnvelopeError::KeyMaterialMissing {
                    reason: error.to_string(),
                })
            });

        Self {
            token,
            fragment,
            state: RevealState::Loading,
            fetch_started: false,
            consumed: false,
            plaintext: None,
        }
    }

    /// Create a session from an already-parsed share link.
    pub fn from_link(link: &cinderlink_core::ShareableLink) -> Self {
        Self {
            token: link.token.clone(),
            fragment: Ok(link.fragment.clone()),
            state: RevealState::Loading,
            fetch_started: false,
            consumed: false,
            plaintext: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> &RevealState {
        &self.state
    }

    /// The decrypted secret, available only once the user has confirmed.
    ///
    /// Before `Revealed` this returns `None` even though the plaintext may
    /// already be cached - that is the reveal gate.
    pub fn revealed_plaintext(&self) -> Option<&str> {
        match self.state {
            RevealState::Revealed => self.plaintext.as_deref(),
            _ => None,
        }
    }

    /// Begin the fetch-and-decrypt sequence.
    ///
    /// Guarded against re-entry (re-render, re-mount, double event): the
    /// `Fetch` action is produced at most once per session. A link without
    /// usable key material fails here, before the one-shot envelope is
    /// consumed, so the sender can still re-share a corrected link.
    pub fn start(&mut self) -> Vec<RevealAction> {
        if self.fetch_started || self.state != RevealState::Loading {
            tracing::debug!(state = ?self.state, "ignoring re-entrant start");
            return vec![];
        }
        self.fetch_started = true;

        if let Err(error) = &self.fragment {
            tracing::warn!(%error, "refusing to fetch: link carries no usable key material");
            self.state = RevealState::Error(RevealErrorKind::Crypto {
                source: error.clone(),
                consumed: self.consumed,
            });
            return vec![RevealAction::Render];
        }

        tracing::debug!(token = %self.token, "starting one-shot fetch");
        vec![RevealAction::Fetch { token: self.token.clone() }, RevealAction::Render]
    }

    /// Process an event and return actions.
    ///
    /// Events arriving in a terminal state are absorbed without effect; so
    /// are events that are invalid for the current state (a `ConfirmReveal`
    /// during `Loading`, a duplicate `FetchSucceeded`).
    pub fn handle(&mut self, event: RevealEvent) -> Vec<RevealAction> {
        if self.state.is_terminal() {
            tracing::debug!(state = ?self.state, "terminal state absorbs event");
            return vec![];
        }

        match event {
            RevealEvent::FetchSucceeded { ciphertext } => self.fetch_succeeded(&ciphertext),
            RevealEvent::FetchFailed { error } => self.fetch_failed(error),
            RevealEvent::ConfirmReveal => self.confirm_reveal(),
        }
    }

    /// Decrypt the fetched ciphertext and advance to `Confirm`.
    fn fetch_succeeded(&mut self, ciphertext: &str) -> Vec<RevealAction> {
        if self.state != RevealState::Loading {
            return vec![];
        }
        // From here on the envelope no longer exists server-side; any
        // failure below is a permanent loss.
        self.consumed = true;

        let Ok(fragment) = &self.fragment else {
            // start() rejects unusable fragments before fetching, so this
            // only happens if the caller fetched on its own.
            self.state = RevealState::Error(RevealErrorKind::Crypto {
                source: EnvelopeError::KeyMaterialMissing {
                    reason: "link has no usable key material".to_string(),
                },
                consumed: self.consumed,
            });
            return vec![RevealAction::Render];
        };

        match open(ciphertext, &fragment.key, &fragment.iv) {
            Ok(plaintext) => {
                self.plaintext = Some(plaintext);
                self.state = RevealState::Ready;
                tracing::debug!("ciphertext decrypted, awaiting confirmation");
                // Ready is transient: nothing can be displayed before the
                // user confirms, so advance immediately.
                self.state = RevealState::Confirm;
                vec![RevealAction::Render]
            },
            Err(error) => {
                tracing::warn!(%error, "decryption failed after one-shot consume");
                self.state = RevealState::Error(RevealErrorKind::Crypto {
                    source: error,
                    consumed: self.consumed,
                });
                vec![RevealAction::Render]
            },
        }
    }

    /// Terminal transport failure.
    fn fetch_failed(&mut self, error: TransportError) -> Vec<RevealAction> {
        if self.state != RevealState::Loading {
            return vec![];
        }
        tracing::warn!(%error, "one-shot fetch failed");
        self.state = RevealState::Error(RevealErrorKind::Transport(error));
        vec![RevealAction::Render]
    }

    /// The reveal gate: only an explicit confirmation exposes the secret.
    fn confirm_reveal(&mut self) -> Vec<RevealAction> {
        if self.state != RevealState::Confirm {
            tracing::debug!(state = ?self.state, "ignoring confirm outside Confirm");
            return vec![];
        }
        self.state = RevealState::Revealed;
        tracing::debug!("secret revealed to user");
        vec![RevealAction::Render]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinderlink_crypto::{IV_SIZE, KEY_SIZE, KeyMaterial, seal};

    fn sealed_fragment(plaintext: &str) -> (String, String) {
        let material = KeyMaterial::from_random([3u8; KEY_SIZE], [5u8; IV_SIZE]);
        let sealed = seal(plaintext, &material).unwrap();
        (sealed.ciphertext, format!("key={}&iv={}", sealed.key, sealed.iv))
    }

    fn started_session(fragment: &str) -> RevealSession {
        let mut session = RevealSession::new(SecretToken::new("tok"), Some(fragment));
        let actions = session.start();
        assert!(matches!(actions.as_slice(), [RevealAction::Fetch { .. }, RevealAction::Render]));
        session
    }

    #[test]
    fn happy_path_requires_explicit_confirmation() {
        let (ciphertext, fragment) = sealed_fragment("hello");
        let mut session = started_session(&fragment);

        let _ = session.handle(RevealEvent::FetchSucceeded { ciphertext });
        assert_eq!(*session.state(), RevealState::Confirm);
        // Decrypted but gated: nothing is exposed yet.
        assert_eq!(session.revealed_plaintext(), None);

        let _ = session.handle(RevealEvent::ConfirmReveal);
        assert_eq!(*session.state(), RevealState::Revealed);
        assert_eq!(session.revealed_plaintext(), Some("hello"));
    }

    #[test]
    fn fetch_is_emitted_exactly_once() {
        let (_, fragment) = sealed_fragment("x");
        let mut session = started_session(&fragment);

        // Re-mounts and re-renders must not re-trigger the one-shot read.
        assert!(session.start().is_empty());
        assert!(session.start().is_empty());
    }

    #[test]
    fn no_fetch_after_terminal_states() {
        let (ciphertext, fragment) = sealed_fragment("x");
        let mut session = started_session(&fragment);
        let _ = session.handle(RevealEvent::FetchSucceeded { ciphertext });
        let _ = session.handle(RevealEvent::ConfirmReveal);

        assert!(session.start().is_empty());
        assert!(session.handle(RevealEvent::ConfirmReveal).is_empty());
        assert_eq!(*session.state(), RevealState::Revealed);
    }

    #[test]
    fn confirm_before_fetch_is_ignored() {
        let (_, fragment) = sealed_fragment("x");
        let mut session = started_session(&fragment);

        assert!(session.handle(RevealEvent::ConfirmReveal).is_empty());
        assert_eq!(*session.state(), RevealState::Loading);
    }

    #[test]
    fn missing_fragment_fails_before_consuming_the_envelope() {
        let mut session = RevealSession::new(SecretToken::new("tok"), None);
        let actions = session.start();

        // No Fetch action: the envelope survives for a corrected link.
        assert_eq!(actions, vec![RevealAction::Render]);
        let RevealState::Error(kind) = session.state() else {
            unreachable!("missing fragment must be terminal");
        };
        assert!(matches!(
            kind,
            RevealErrorKind::Crypto { source: EnvelopeError::KeyMaterialMissing { .. }, consumed: false }
        ));
        assert!(!kind.is_permanent_loss());
    }

    #[test]
    fn fragment_without_iv_fails_with_missing_key_material() {
        let mut session = RevealSession::new(SecretToken::new("tok"), Some("key=AAAA"));
        let actions = session.start();

        assert_eq!(actions, vec![RevealAction::Render]);
        assert!(matches!(
            session.state(),
            RevealState::Error(RevealErrorKind::Crypto {
                source: EnvelopeError::KeyMaterialMissing { .. },
                ..
            })
        ));
        // And it can never progress to Revealed.
        assert!(session.handle(RevealEvent::ConfirmReveal).is_empty());
        assert_ne!(*session.state(), RevealState::Revealed);
    }

    #[test]
    fn tampered_ciphertext_is_permanent_loss() {
        let (ciphertext, fragment) = sealed_fragment("secret");
        let mut session = started_session(&fragment);

        let mut tampered = ciphertext.into_bytes();
        // Flip a base64 character; the decoded bytes change, GCM rejects.
        tampered[0] = if tampered[0] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).unwrap();

        let _ = session.handle(RevealEvent::FetchSucceeded { ciphertext: tampered });

        let RevealState::Error(kind) = session.state() else {
            unreachable!("tampering must be terminal");
        };
        assert!(kind.is_permanent_loss());
        assert_eq!(kind.message_key(), "messagePermanentlyLost");
    }

    #[test]
    fn transport_not_found_is_terminal_and_not_loss() {
        let (_, fragment) = sealed_fragment("x");
        let mut session = started_session(&fragment);

        let _ = session.handle(RevealEvent::FetchFailed { error: TransportError::NotFound });

        let RevealState::Error(kind) = session.state() else {
            unreachable!("fetch failure must be terminal");
        };
        assert!(!kind.is_permanent_loss());

        // A late success (e.g. a stale duplicate) must not escape the
        // terminal state.
        let (ciphertext, _) = sealed_fragment("x");
        assert!(session.handle(RevealEvent::FetchSucceeded { ciphertext }).is_empty());
    }

    #[test]
    fn duplicate_fetch_success_is_absorbed() {
        let (ciphertext, fragment) = sealed_fragment("once");
        let mut session = started_session(&fragment);

        let _ = session.handle(RevealEvent::FetchSucceeded { ciphertext: ciphertext.clone() });
        assert_eq!(*session.state(), RevealState::Confirm);

        assert!(session.handle(RevealEvent::FetchSucceeded { ciphertext }).is_empty());
        assert_eq!(*session.state(), RevealState::Confirm);
    }

    #[test]
    fn cached_plaintext_survives_rerender() {
        let (ciphertext, fragment) = sealed_fragment("cached");
        let mut session = started_session(&fragment);
        let _ = session.handle(RevealEvent::FetchSucceeded { ciphertext });
        let _ = session.handle(RevealEvent::ConfirmReveal);

        // Simulated re-renders: repeated reads of the revealed value, no
        // actions, no state changes.
        for _ in 0..3 {
            assert_eq!(session.revealed_plaintext(), Some("cached"));
            assert!(session.start().is_empty());
        }
    }
}
