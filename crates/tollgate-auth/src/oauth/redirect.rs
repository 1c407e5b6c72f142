//! Redirection URI resolution (RFC 6749 section 3.1.2.3).
//!
//! The effective callback URI for an authorization request is resolved
//! against the client's registered URIs before any session is created.
//! Failures here must never be delivered via redirect: the server has no
//! verified URI yet, and redirecting to an unverified one would hand the
//! authorization response to an attacker-controlled endpoint.

use serde::{Deserialize, Serialize};

use crate::AuthResult;
use crate::error::AuthError;

/// A verified redirection URI bound to an authorization session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectionUri {
    uri: String,
    dynamic: bool,
}

impl RedirectionUri {
    /// Resolves the effective redirection URI for an authorization request.
    ///
    /// - Absent `redirect_uri` parameter: succeeds only if the client has
    ///   exactly one registered URI, which is used as statically configured.
    /// - Present: succeeds only if the value is a prefix-match extension of
    ///   a registered URI; the result is flagged dynamically configured,
    ///   which obliges the later token request to repeat the exact URI.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` if no URI can be resolved.
    pub fn resolve(requested: Option<&str>, registered: &[String]) -> AuthResult<Self> {
        match requested.filter(|uri| !uri.is_empty()) {
            None => {
                if registered.len() == 1 {
                    Ok(Self {
                        uri: registered[0].clone(),
                        dynamic: false,
                    })
                } else {
                    Err(AuthError::invalid_request(
                        "The client has multiple or no registered redirection URIs \
                         and MUST include a redirect_uri parameter.",
                    ))
                }
            }
            Some(uri) => {
                if registered.iter().any(|reg| uri.starts_with(reg.as_str())) {
                    Ok(Self {
                        uri: uri.to_string(),
                        dynamic: true,
                    })
                } else {
                    Err(AuthError::invalid_request("Callback URI does not match."))
                }
            }
        }
    }

    /// Returns the verified URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns `true` if the URI was supplied by the request rather than
    /// taken from the registration.
    ///
    /// Dynamically configured URIs must be repeated verbatim in the token
    /// request; a mismatch there is an `invalid_grant`.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }
}
