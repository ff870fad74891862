//! Transport collaborator contract.
//!
//! The server side of Cinderlink is an external collaborator: it stores
//! sealed envelopes, hands out opaque tokens, and atomically invalidates an
//! envelope on the first successful read. This module defines only the
//! contract and the closed error taxonomy produced once at the boundary.
//!
//! We avoid ad hoc status-code sniffing downstream: the HTTP-ish signal is
//! classified exactly once by [`TransportError::from_status`] and everything
//! above this layer matches on the resulting enum.

use std::future::Future;

use thiserror::Error;

/// Status signal for a missing or already-consumed envelope.
pub const STATUS_NOT_FOUND: u16 = 404;

/// Status signal for an envelope past its expiry.
pub const STATUS_GONE: u16 = 410;

/// Status signal for a rate-limited caller.
pub const STATUS_RATE_LIMITED: u16 = 429;

/// Opaque server-issued identifier for a stored envelope.
///
/// The token is the only part of a share link that ever reaches the server
/// on retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretToken(String);

impl SecretToken {
    /// Wrap a server-issued token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload for the create operation.
///
/// Carries the sealed ciphertext and storage policy. By construction there
/// is no field for key material: nothing in this struct may ever contain the
/// key or IV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    /// Sealed ciphertext, base64url. The only message representation the
    /// server ever observes.
    pub ciphertext: String,
    /// Minutes until the server expires the envelope.
    pub expire_minutes: u32,
    /// Successful reads before the envelope is consumed.
    pub max_views: u32,
    /// Optional notification address, forwarded verbatim to the server.
    pub sender_email: Option<String>,
}

impl CreateRequest {
    /// Default time-to-live in minutes.
    pub const DEFAULT_EXPIRE_MINUTES: u32 = 60;

    /// Default view budget: one-shot.
    pub const DEFAULT_MAX_VIEWS: u32 = 1;

    /// Create a request with the default one-shot policy.
    pub fn new(ciphertext: impl Into<String>) -> Self {
        Self {
            ciphertext: ciphertext.into(),
            expire_minutes: Self::DEFAULT_EXPIRE_MINUTES,
            max_views: Self::DEFAULT_MAX_VIEWS,
            sender_email: None,
        }
    }

    /// Override the expiry.
    #[must_use]
    pub fn expire_minutes(mut self, minutes: u32) -> Self {
        self.expire_minutes = minutes;
        self
    }

    /// Override the view budget.
    #[must_use]
    pub fn max_views(mut self, views: u32) -> Self {
        self.max_views = views;
        self
    }

    /// Attach a sender notification address.
    #[must_use]
    pub fn sender_email(mut self, email: impl Into<String>) -> Self {
        self.sender_email = Some(email.into());
        self
    }
}

/// Classified transport failures.
///
/// None of these are retriable at this layer: retrying a one-shot read can
/// never succeed once the envelope is consumed, and create failures surface
/// to the user instead of looping.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Envelope already consumed or never existed.
    ///
    /// The two cases are deliberately indistinguishable so the error cannot
    /// reveal whether a token was ever valid.
    #[error("secret not found or already read")]
    NotFound,

    /// Envelope past its expiry.
    #[error("secret expired")]
    Expired,

    /// Caller exceeded the server's rate limit.
    #[error("rate limited by server")]
    RateLimited,

    /// Any other non-success signal.
    #[error("transport failure (status {status})")]
    Unknown {
        /// Raw status code, for diagnostics only.
        status: u16,
    },
}

impl TransportError {
    /// Classify a non-success status signal.
    ///
    /// This is the single point where raw status codes become typed errors;
    /// callers must never re-derive meaning from status codes downstream.
    pub fn from_status(status: u16) -> Self {
        match status {
            STATUS_NOT_FOUND => Self::NotFound,
            STATUS_GONE => Self::Expired,
            STATUS_RATE_LIMITED => Self::RateLimited,
            other => Self::Unknown { status: other },
        }
    }

    /// Stable localization key for the user-facing message.
    ///
    /// The string tables live with the UI; these identifiers match the keys
    /// the read view displays for each failure.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::NotFound => "messageNotFoundOrAlreadyRead",
            Self::Expired => "messageExpired",
            Self::RateLimited => "tooManyRequests",
            Self::Unknown { .. } => "failedRetrieve",
        }
    }
}

/// The external transport collaborator.
///
/// Implementations own deadlines, retries at the network layer, and actual
/// wire formats. Protocol code interacts with the contract only.
pub trait Transport: Send + Sync {
    /// Store a sealed envelope and return its token.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] classified at the boundary.
    fn create(
        &self,
        request: CreateRequest,
    ) -> impl Future<Output = Result<SecretToken, TransportError>> + Send;

    /// Retrieve an envelope's ciphertext, consuming it server-side.
    ///
    /// The first successful call atomically invalidates the envelope; every
    /// later call observes [`TransportError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] classified at the boundary.
    fn read(
        &self,
        token: &SecretToken,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}
