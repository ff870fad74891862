//! Share link composition and parsing.
//!
//! A share link carries two very different payloads: the server-issued token
//! in the path (sent back to the server on retrieval) and the key material in
//! the fragment (parsed client-side only; fragments are never included in
//! outgoing requests, which is the entire point of putting the key there).
//!
//! Encoding contract: key and IV arrive here already base64url-encoded, so
//! every character is fragment-safe and the codec is byte-for-byte
//! reversible. Tokens are opaque server identifiers and must be URL-path-safe
//! as issued.

use thiserror::Error;

use crate::transport::SecretToken;

/// Path segment that marks a read link.
const READ_SEGMENT: &str = "/read/";

/// Errors from parsing a share link or its fragment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The URL has no `#` fragment at all.
    #[error("link has no fragment; key material is absent")]
    MissingFragment,

    /// The fragment exists but lacks a required parameter.
    #[error("fragment is missing the `{name}` parameter")]
    MissingParameter {
        /// Name of the absent parameter (`key` or `iv`).
        name: &'static str,
    },

    /// The URL path does not contain a `/read/<token>` segment.
    #[error("link path is not a read link")]
    NotAReadLink,

    /// The token segment is empty.
    #[error("link token is empty")]
    EmptyToken,

    /// The token segment contains a path separator.
    #[error("link token is malformed")]
    InvalidToken,
}

/// Key material parsed from a link fragment.
///
/// Values stay in their encoded form; decoding happens at the crypto
/// boundary where length errors can be classified properly.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyFragment {
    /// Encoded 256-bit key.
    pub key: String,
    /// Encoded 96-bit IV.
    pub iv: String,
}

// Fragment contents are key material; keep them out of Debug output.
impl std::fmt::Debug for KeyFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyFragment").finish_non_exhaustive()
    }
}

/// A fully parsed share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareableLink {
    /// Base host, without trailing slash.
    pub host: String,
    /// Server-issued opaque token.
    pub token: SecretToken,
    /// Fragment-borne key material.
    pub fragment: KeyFragment,
}

impl ShareableLink {
    /// Render the link as a URL.
    pub fn to_url(&self) -> String {
        compose_link(&self.host, &self.token, &self.fragment.key, &self.fragment.iv)
    }

    /// Parse a URL into its link parts.
    ///
    /// # Errors
    ///
    /// - [`LinkError::NotAReadLink`] / [`LinkError::EmptyToken`] /
    ///   [`LinkError::InvalidToken`] for a bad path
    /// - [`LinkError::MissingFragment`] / [`LinkError::MissingParameter`]
    ///   for absent key material
    pub fn parse(url: &str) -> Result<Self, LinkError> {
        let (prefix, fragment) = match url.split_once('#') {
            Some((prefix, fragment)) => (prefix, Some(fragment)),
            None => (url, None),
        };

        let Some(read_at) = prefix.rfind(READ_SEGMENT) else {
            return Err(LinkError::NotAReadLink);
        };
        let host = prefix[..read_at].trim_end_matches('/').to_string();
        let token = &prefix[read_at + READ_SEGMENT.len()..];
        if token.is_empty() {
            return Err(LinkError::EmptyToken);
        }
        if token.contains('/') {
            return Err(LinkError::InvalidToken);
        }

        let fragment = parse_fragment(fragment.ok_or(LinkError::MissingFragment)?)?;

        Ok(Self { host, token: SecretToken::new(token), fragment })
    }
}

/// Compose a share link from its parts.
///
/// The token lands in the path; key and IV land in the fragment. A trailing
/// slash on `host` is normalized away so composed links are canonical.
pub fn compose_link(host: &str, token: &SecretToken, key: &str, iv: &str) -> String {
    let host = host.trim_end_matches('/');
    format!("{host}{READ_SEGMENT}{token}#key={key}&iv={iv}")
}

/// Parse a link fragment into key material.
///
/// Accepts the fragment with or without its leading `#`. Parameter order is
/// not significant and unknown parameters are ignored, but `key` and `iv`
/// must both be present and non-empty.
///
/// # Errors
///
/// - [`LinkError::MissingFragment`] if the fragment is empty
/// - [`LinkError::MissingParameter`] if `key=` or `iv=` is absent or empty
pub fn parse_fragment(fragment: &str) -> Result<KeyFragment, LinkError> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    if fragment.is_empty() {
        return Err(LinkError::MissingFragment);
    }

    let mut key = None;
    let mut iv = None;
    for pair in fragment.split('&') {
        match pair.split_once('=') {
            Some(("key", value)) if !value.is_empty() => key = Some(value.to_string()),
            Some(("iv", value)) if !value.is_empty() => iv = Some(value.to_string()),
            _ => {},
        }
    }

    Ok(KeyFragment {
        key: key.ok_or(LinkError::MissingParameter { name: "key" })?,
        iv: iv.ok_or(LinkError::MissingParameter { name: "iv" })?,
    })
}
