//! Access token domain type.
//!
//! Tokens are opaque to this layer: the authorization server mints and
//! validates them exclusively through the
//! [`TokenStore`](crate::storage::TokenStore) contract and never inspects
//! their contents.

use serde::{Deserialize, Serialize};

use crate::scope::ScopeSet;

/// The only token type issued by this server.
pub const BEARER: &str = "bearer";

/// An issued access token together with its grant metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// The opaque access token string.
    pub access_token: String,

    /// Token type; always [`BEARER`].
    pub token_type: String,

    /// Lifetime in seconds, when the backend bounds it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,

    /// Refresh token, when the grant allows refreshing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// The scope actually granted to this token.
    pub scope: ScopeSet,

    /// The resource owner the token was issued for, or the client id
    /// itself for client-credentials tokens.
    pub subject: String,
}

impl Token {
    /// Creates a bearer token with no expiry and no refresh token.
    #[must_use]
    pub fn bearer(
        access_token: impl Into<String>,
        subject: impl Into<String>,
        scope: ScopeSet,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: BEARER.to_string(),
            expires_in: None,
            refresh_token: None,
            scope,
            subject: subject.into(),
        }
    }

    /// Sets the token lifetime in seconds.
    #[must_use]
    pub fn with_expires_in(mut self, seconds: u64) -> Self {
        self.expires_in = Some(seconds);
        self
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_constructor() {
        let token = Token::bearer("abc", "alice", ScopeSet::parse("read"));
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.subject, "alice");
        assert!(token.expires_in.is_none());
        assert!(token.refresh_token.is_none());
    }

    #[test]
    fn builders() {
        let token = Token::bearer("abc", "alice", ScopeSet::new())
            .with_expires_in(3600)
            .with_refresh_token("r1");
        assert_eq!(token.expires_in, Some(3600));
        assert_eq!(token.refresh_token.as_deref(), Some("r1"));
    }

    #[test]
    fn optional_fields_skipped_in_json() {
        let token = Token::bearer("abc", "alice", ScopeSet::parse("read"));
        let json = serde_json::to_string(&token).unwrap();
        assert!(!json.contains("expires_in"));
        assert!(!json.contains("refresh_token"));
        assert!(json.contains(r#""scope":"read""#));
    }
}
