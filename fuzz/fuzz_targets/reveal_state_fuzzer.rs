//! Fuzz target for the reveal state machine
//!
//! This fuzzer drives a reveal session with arbitrary event sequences to
//! find:
//! - Panics on out-of-order or duplicated events
//! - More than one Fetch action emitted over a session lifetime
//! - A path into Revealed that bypasses the confirmation gate
//! - Plaintext observable outside the Revealed state
//!
//! The session should absorb every invalid sequence without panicking.

#![no_main]

use arbitrary::Arbitrary;
use cinderlink_client::{RevealAction, RevealEvent, RevealSession, RevealState, SecretToken, TransportError};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum FuzzStep {
    Start,
    FetchOk { ciphertext: String },
    FetchNotFound,
    FetchExpired,
    FetchRateLimited,
    FetchUnknown { status: u16 },
    Confirm,
}

#[derive(Arbitrary, Debug)]
struct Input {
    fragment: Option<String>,
    steps: Vec<FuzzStep>,
}

fuzz_target!(|input: Input| {
    let mut session = RevealSession::new(SecretToken::new("fuzz-token"), input.fragment.as_deref());

    let mut fetches = 0usize;
    let mut revealed = false;
    for step in input.steps {
        let actions = match step {
            FuzzStep::Start => session.start(),
            FuzzStep::FetchOk { ciphertext } => {
                session.handle(RevealEvent::FetchSucceeded { ciphertext })
            },
            FuzzStep::FetchNotFound => {
                session.handle(RevealEvent::FetchFailed { error: TransportError::NotFound })
            },
            FuzzStep::FetchExpired => {
                session.handle(RevealEvent::FetchFailed { error: TransportError::Expired })
            },
            FuzzStep::FetchRateLimited => {
                session.handle(RevealEvent::FetchFailed { error: TransportError::RateLimited })
            },
            FuzzStep::FetchUnknown { status } => {
                session.handle(RevealEvent::FetchFailed {
                    error: TransportError::from_status(status),
                })
            },
            FuzzStep::Confirm => session.handle(RevealEvent::ConfirmReveal),
        };

        fetches += actions
            .iter()
            .filter(|action| matches!(action, RevealAction::Fetch { .. }))
            .count();
        assert!(fetches <= 1, "more than one fetch per session");

        if revealed {
            // Terminal: the state must never move again.
            assert_eq!(*session.state(), RevealState::Revealed);
        }
        revealed = *session.state() == RevealState::Revealed;

        if !revealed {
            assert!(session.revealed_plaintext().is_none());
        }
    }
});
