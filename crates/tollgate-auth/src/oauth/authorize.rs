//! Authorization endpoint wire types and redirect formatting.
//!
//! Success and error responses of the authorization endpoint travel back to
//! the client by redirecting the user's browser to the verified redirection
//! URI with response parameters attached. The code flow places them in the
//! query component, the implicit flow in the fragment (RFC 6749 sections
//! 4.1.2 and 4.2.2); the fragment keeps tokens out of server logs and
//! Referer headers along the way.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::{AuthError, ErrorResponse};
use crate::scope::ScopeSet;

/// Decoded authorization request parameters (RFC 6749 section 4.1.1).
///
/// All fields are optional at the wire level; the endpoint decides which
/// absences are fatal and how. Unknown parameters are ignored by serde.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthorizationRequest {
    /// Requested flow, `code` or `token`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,

    /// Identifier of the requesting client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Redirection URI, required when the client has several registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    /// Requested scope, space-delimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Opaque CSRF token, echoed back verbatim on every redirect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Where redirect response parameters are placed on the redirection URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterPlacement {
    /// Query component (authorization code flow).
    Query,
    /// Fragment component (implicit flow).
    Fragment,
}

/// Result of driving the authorization endpoint one step forward.
///
/// The transport layer maps these onto HTTP however it likes: `Redirect`
/// becomes a 302, the two suspension outcomes render a login or consent
/// page carrying the session id, and `ErrorPage` renders a non-redirecting
/// error (the redirection URI could not be verified, so sending the user
/// anywhere would be unsafe).
#[derive(Debug, Clone)]
pub enum AuthorizeOutcome {
    /// Send the user agent to this fully-formed URI.
    Redirect(String),

    /// The resource owner must log in before the flow can continue.
    LoginRequired {
        /// Correlation id to carry through the login round-trip.
        session_id: Uuid,
    },

    /// The resource owner must grant or reject the requested scope.
    ConsentRequired {
        /// Correlation id to carry through the consent round-trip.
        session_id: Uuid,
        /// The client asking for authorization.
        client_id: String,
        /// Scope the client asked for.
        requested_scope: ScopeSet,
        /// Scope this owner previously granted the client, for
        /// auto-approval or a pre-checked consent form.
        pre_granted: Option<ScopeSet>,
    },

    /// Render an error page; no redirection URI was verified.
    ErrorPage(ErrorResponse),
}

/// The resource owner's consent verdict.
#[derive(Debug, Clone)]
pub enum ConsentDecision {
    /// Grant the listed scope. The decision may differ from the requested
    /// scope in either direction; the token backend applies policy.
    Accept {
        /// Scope the owner granted.
        granted_scope: ScopeSet,
    },
    /// Deny the authorization request.
    Reject,
}

/// Appends response parameters to a redirection URI.
///
/// Placement is query or fragment per the flow. A fragment placement
/// replaces any fragment already present on the URI; registered callback
/// URIs with fragments are not meaningful in OAuth.
///
/// # Errors
///
/// Fails with an internal error when the verified URI does not parse; that
/// indicates corrupted registration data, not caller input.
pub fn append_parameters(
    uri: &str,
    placement: ParameterPlacement,
    params: &[(&str, &str)],
) -> AuthResult<String> {
    let mut url = Url::parse(uri)
        .map_err(|err| AuthError::internal(format!("unparseable redirection URI: {err}")))?;

    match placement {
        ParameterPlacement::Query => {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
            drop(pairs);
        }
        ParameterPlacement::Fragment => {
            let mut encoded = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in params {
                encoded.append_pair(key, value);
            }
            url.set_fragment(Some(&encoded.finish()));
        }
    }

    Ok(url.into())
}

/// Builds the success redirect for the code flow (RFC 6749 section 4.1.2).
pub fn code_redirect(uri: &str, code: &str, state: Option<&str>) -> AuthResult<String> {
    let mut params = vec![("code", code)];
    if let Some(state) = state {
        params.push(("state", state));
    }
    append_parameters(uri, ParameterPlacement::Query, &params)
}

/// Builds the success redirect for the implicit flow (RFC 6749 section
/// 4.2.2).
///
/// `scope` is included only when the granted scope differs from the
/// requested one, per the RFC's "if different from requested" rule.
pub fn token_redirect(
    uri: &str,
    access_token: &str,
    token_type: &str,
    expires_in: Option<u64>,
    scope: Option<&ScopeSet>,
    state: Option<&str>,
) -> AuthResult<String> {
    let expires: String;
    let scope_string: String;

    let mut params = vec![("access_token", access_token), ("token_type", token_type)];
    if let Some(seconds) = expires_in {
        expires = seconds.to_string();
        params.push(("expires_in", &expires));
    }
    if let Some(scope) = scope {
        scope_string = scope.as_string();
        params.push(("scope", &scope_string));
    }
    if let Some(state) = state {
        params.push(("state", state));
    }

    append_parameters(uri, ParameterPlacement::Fragment, &params)
}

/// Builds an error redirect (RFC 6749 sections 4.1.2.1 and 4.2.2.1).
///
/// Used only after the redirection URI has been verified; earlier failures
/// must go through [`AuthorizeOutcome::ErrorPage`] instead.
pub fn error_redirect(
    uri: &str,
    placement: ParameterPlacement,
    err: &AuthError,
    state: Option<&str>,
) -> AuthResult<String> {
    let description = err.description();

    let mut params = vec![
        ("error", err.error_code().as_str()),
        ("error_description", description.as_str()),
    ];
    if let Some(state) = state {
        params.push(("state", state));
    }

    append_parameters(uri, placement, &params)
}
