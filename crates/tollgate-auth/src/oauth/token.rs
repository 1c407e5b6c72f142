//! Token endpoint wire types (RFC 6749 sections 4.1.3, 4.3.2, 4.4.2, 5.1,
//! 5.2, and 6).
//!
//! The token endpoint is a direct API call, never a browser redirect, so
//! both success and failure are JSON bodies. Every reply carries
//! `Cache-Control: no-store` and `Pragma: no-cache` to keep credentials
//! out of intermediary caches.

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, ErrorResponse};
use crate::scope::ScopeSet;
use crate::types::Token;

/// Decoded token request form parameters.
///
/// One flat struct covers all four grants; the endpoint checks the
/// presence of whichever parameters its grant needs.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenRequest {
    /// Which grant is being exercised.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_type: Option<String>,

    /// Client identifier, for unauthenticated public clients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Authorization code (authorization_code grant).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Redirection URI repeated from the authorization request, required
    /// exactly when it was dynamically supplied there.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    /// Resource owner username (password grant).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Resource owner password (password grant).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Refresh token (refresh_token grant).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Requested scope, space-delimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Successful token response body (RFC 6749 section 5.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Always `bearer`.
    pub token_type: String,

    /// The opaque access token.
    pub access_token: String,

    /// Token lifetime in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,

    /// Refresh token, when the grant produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Granted scope, present only when it differs from what was
    /// requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeSet>,
}

impl TokenResponse {
    /// Builds the response body for an issued token.
    ///
    /// `requested` is the scope the caller asked for; the granted scope is
    /// echoed only when the two differ (or when nothing was requested and
    /// the backend granted a non-empty default).
    #[must_use]
    pub fn from_token(token: Token, requested: Option<&ScopeSet>) -> Self {
        let scope = match requested {
            Some(requested) if token.scope.is_identical(requested) => None,
            Some(_) => Some(token.scope.clone()),
            None => (!token.scope.is_empty()).then(|| token.scope.clone()),
        };
        Self {
            token_type: token.token_type,
            access_token: token.access_token,
            expires_in: token.expires_in,
            refresh_token: token.refresh_token,
            scope,
        }
    }
}

/// Transport-agnostic token endpoint reply.
///
/// The hosting application copies status, headers, and body onto its HTTP
/// response verbatim.
#[derive(Debug, Clone)]
pub struct TokenEndpointReply {
    /// HTTP status code: 200 on success, 400 on any protocol error.
    pub status: u16,

    /// Response headers, cache suppression included.
    pub headers: Vec<(&'static str, String)>,

    /// JSON body.
    pub body: String,
}

impl TokenEndpointReply {
    fn headers() -> Vec<(&'static str, String)> {
        vec![
            ("Content-Type", "application/json".to_string()),
            ("Cache-Control", "no-store".to_string()),
            ("Pragma", "no-cache".to_string()),
        ]
    }

    /// Builds a 200 reply carrying the token response.
    #[must_use]
    pub fn success(response: &TokenResponse) -> Self {
        match serde_json::to_string(response) {
            Ok(body) => Self {
                status: 200,
                headers: Self::headers(),
                body,
            },
            Err(err) => Self::error(&AuthError::internal(format!(
                "failed to serialize token response: {err}"
            ))),
        }
    }

    /// Builds a 400 reply carrying the RFC 6749 error body.
    ///
    /// Internal error kinds are mapped to `server_error` by the body
    /// builder; they never leave the core unmapped.
    #[must_use]
    pub fn error(err: &AuthError) -> Self {
        let body = ErrorResponse::from_error(err);
        let body = serde_json::to_string(&body)
            .unwrap_or_else(|_| r#"{"error":"server_error"}"#.to_string());
        Self {
            status: 400,
            headers: Self::headers(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Token {
        Token::bearer("tok", "alice", ScopeSet::parse("read"))
    }

    #[test]
    fn scope_omitted_when_identical_to_requested() {
        let response = TokenResponse::from_token(token(), Some(&ScopeSet::parse("read")));
        assert!(response.scope.is_none());
    }

    #[test]
    fn scope_present_when_narrower_than_requested() {
        let response = TokenResponse::from_token(token(), Some(&ScopeSet::parse("read write")));
        assert!(response.scope.unwrap().is_identical(&ScopeSet::parse("read")));
    }

    #[test]
    fn unrequested_default_scope_is_echoed() {
        let response = TokenResponse::from_token(token(), None);
        assert!(response.scope.is_some());

        let bare = Token::bearer("tok", "alice", ScopeSet::new());
        let response = TokenResponse::from_token(bare, None);
        assert!(response.scope.is_none());
    }

    #[test]
    fn success_reply_shape() {
        let token = token().with_expires_in(3600);
        let reply =
            TokenEndpointReply::success(&TokenResponse::from_token(token, Some(&ScopeSet::parse("read"))));
        assert_eq!(reply.status, 200);
        assert!(reply.body.contains(r#""token_type":"bearer""#));
        assert!(reply.body.contains(r#""access_token":"tok""#));
        assert!(reply.body.contains(r#""expires_in":3600"#));
        assert!(!reply.body.contains("scope"));
    }

    #[test]
    fn cache_suppression_on_success_and_error() {
        let success = TokenEndpointReply::success(&TokenResponse::from_token(token(), None));
        let failure = TokenEndpointReply::error(&AuthError::invalid_grant("Code expired."));

        for reply in [&success, &failure] {
            assert!(
                reply
                    .headers
                    .iter()
                    .any(|(name, value)| *name == "Cache-Control" && value == "no-store")
            );
            assert!(
                reply
                    .headers
                    .iter()
                    .any(|(name, value)| *name == "Pragma" && value == "no-cache")
            );
        }
    }

    #[test]
    fn error_reply_is_400_json() {
        let reply = TokenEndpointReply::error(&AuthError::invalid_grant("Code expired."));
        assert_eq!(reply.status, 400);
        assert!(reply.body.contains(r#""error":"invalid_grant""#));
        assert!(reply.body.contains("Code expired."));
    }

    #[test]
    fn internal_errors_surface_as_server_error() {
        let reply = TokenEndpointReply::error(&AuthError::storage("connection refused"));
        assert_eq!(reply.status, 400);
        assert!(reply.body.contains(r#""error":"server_error""#));
    }
}
