//! Bearer token verification for protected resources (RFC 6750).
//!
//! A resource server hands [`BearerVerifier`] whatever credential channels
//! its transport saw; the verifier picks the token, round-trips it through
//! the token store, and reports a [`Verification`] the caller maps onto
//! 401/403 responses. Tokens stay opaque end to end.

use std::sync::Arc;

use tracing::debug;

use crate::config::BearerExtraction;
use crate::scope::ScopeSet;
use crate::storage::TokenStore;

/// Outcome of verifying a presented access token.
#[derive(Debug, Clone)]
pub enum Verification {
    /// The token is live; the resource may authorize against its scope.
    Valid {
        /// Whom the token represents.
        subject: String,
        /// What the token is allowed to do.
        scope: ScopeSet,
    },
    /// A token was presented but is malformed, unknown, expired, or
    /// revoked.
    Invalid,
    /// No token was presented on any enabled channel.
    Missing,
    /// The `Authorization` header uses a scheme other than Bearer.
    Unsupported,
}

/// Extracts and validates bearer tokens.
pub struct BearerVerifier {
    tokens: Arc<dyn TokenStore>,
    config: BearerExtraction,
}

impl BearerVerifier {
    /// Creates a verifier over the given token store.
    #[must_use]
    pub fn new(tokens: Arc<dyn TokenStore>, config: BearerExtraction) -> Self {
        Self { tokens, config }
    }

    /// Verifies the token presented on one of the accepted channels.
    ///
    /// `authorization` is the raw `Authorization` header; `form_token` and
    /// `query_token` are `access_token` parameters from the form body and
    /// query string, each honored only when enabled in the configuration
    /// (RFC 6750 discourages both, so they default off). The header wins
    /// when several channels are populated.
    pub async fn verify(
        &self,
        authorization: Option<&str>,
        form_token: Option<&str>,
        query_token: Option<&str>,
    ) -> Verification {
        let token = match self.extract(authorization, form_token, query_token) {
            Ok(Some(token)) => token,
            Ok(None) => return Verification::Missing,
            Err(verification) => return verification,
        };

        match self.tokens.validate_token(&token).await {
            Ok(token) => Verification::Valid {
                subject: token.subject,
                scope: token.scope,
            },
            Err(err) => {
                debug!(error = %err, "bearer token rejected");
                Verification::Invalid
            }
        }
    }

    fn extract(
        &self,
        authorization: Option<&str>,
        form_token: Option<&str>,
        query_token: Option<&str>,
    ) -> Result<Option<String>, Verification> {
        if let Some(header) = authorization {
            let Some((scheme, rest)) = header.split_once(' ') else {
                return Err(Verification::Unsupported);
            };
            if !scheme.eq_ignore_ascii_case("bearer") {
                return Err(Verification::Unsupported);
            }
            let token = rest.trim();
            if token.is_empty() {
                return Err(Verification::Invalid);
            }
            return Ok(Some(token.to_string()));
        }

        if self.config.allow_form {
            if let Some(token) = form_token.filter(|t| !t.is_empty()) {
                return Ok(Some(token.to_string()));
            }
        }
        if self.config.allow_query {
            if let Some(token) = query_token.filter(|t| !t.is_empty()) {
                return Ok(Some(token.to_string()));
            }
        }
        Ok(None)
    }
}
