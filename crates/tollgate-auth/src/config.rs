//! Authorization server configuration.
//!
//! All tunables are gathered in one explicit struct passed to the endpoint
//! constructors at startup; nothing is looked up dynamically per request.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth]
//! session_timeout = "10m"
//!
//! [auth.bearer]
//! allow_form = false
//! allow_query = false
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the authorization server core.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthServerConfig {
    /// Inactivity timeout for in-progress authorization sessions.
    ///
    /// Every session access checks this deadline; a session past it fails
    /// hard with a session-expired error and is removed from the registry.
    #[serde(with = "humantime_serde")]
    pub session_timeout: Duration,

    /// Bearer token extraction options for the resource-server side.
    pub bearer: BearerExtraction,
}

impl Default for AuthServerConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_secs(600), // 10 minutes
            bearer: BearerExtraction::default(),
        }
    }
}

impl AuthServerConfig {
    /// Returns the session timeout as a `time::Duration` for deadline
    /// arithmetic against `OffsetDateTime`.
    #[must_use]
    pub fn session_timeout(&self) -> time::Duration {
        time::Duration::try_from(self.session_timeout)
            .unwrap_or_else(|_| time::Duration::seconds(600))
    }
}

/// Where a bearer token may be presented by a resource-server caller.
///
/// The `Authorization` header is always accepted. RFC 6750 discourages the
/// form-body and query-string channels, so both are opt-in and default off.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BearerExtraction {
    /// Accept `access_token` from a POST form body.
    pub allow_form: bool,

    /// Accept `access_token` from the request query string.
    pub allow_query: bool,
}
