//! Client authentication at the token endpoint.
//!
//! Confidential clients authenticate with HTTP Basic credentials (RFC 6749
//! section 2.3.1); public clients identify themselves with a bare
//! `client_id` form parameter. The resolution order is: try the presented
//! credential first, and only fall back to the public path when none was
//! presented at all. A client registered with a secret can never take the
//! public path, so a stolen `client_id` alone buys nothing.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::ClientRegistry;
use crate::types::{Client, ClientType};

/// Decodes an HTTP Basic `Authorization` header value into credentials.
///
/// Returns `None` for a different scheme or a malformed payload; the
/// caller decides whether that is fatal.
#[must_use]
pub fn parse_basic_auth(header: &str) -> Option<(String, String)> {
    let encoded = header
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("basic"))
        .map(|(_, rest)| rest.trim())?;
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (id, secret) = decoded.split_once(':')?;
    Some((id.to_string(), secret.to_string()))
}

/// Resolves the client behind a presented `Authorization` header.
///
/// Returns `Ok(None)` when no header was presented; the caller then falls
/// back to [`public_client`].
///
/// # Errors
///
/// `invalid_client` for an unparseable header, an unknown client, or a
/// wrong secret.
pub async fn authenticated_client(
    authorization: Option<&str>,
    registry: &dyn ClientRegistry,
) -> AuthResult<Option<Client>> {
    let Some(header) = authorization else {
        return Ok(None);
    };

    let Some((client_id, secret)) = parse_basic_auth(header) else {
        return Err(AuthError::invalid_client(
            "Unsupported or malformed Authorization header.",
        ));
    };

    if !registry.verify_secret(&client_id, &secret).await? {
        debug!(client_id, "client secret verification failed");
        return Err(AuthError::invalid_client("The client could not be verified."));
    }

    match registry.find_by_id(&client_id).await? {
        Some(client) => Ok(Some(client)),
        None => Err(AuthError::invalid_client("The client could not be verified.")),
    }
}

/// Resolves an unauthenticated client from its `client_id` form parameter.
///
/// Only truly public clients may skip authentication.
///
/// # Errors
///
/// `invalid_request` when the parameter is missing; `invalid_client` when
/// the client is unknown, confidential, or registered with a secret.
pub async fn public_client(
    client_id: Option<&str>,
    registry: &dyn ClientRegistry,
) -> AuthResult<Client> {
    let client_id = client_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| missing_parameter("client_id"))?;

    let client = registry
        .find_by_id(client_id)
        .await?
        .ok_or_else(|| AuthError::invalid_client("The client could not be verified."))?;

    if client.client_type == ClientType::Confidential {
        return Err(AuthError::invalid_client("Unauthenticated confidential client."));
    }
    if client.client_secret.is_some() {
        return Err(AuthError::invalid_client("Unauthenticated public client."));
    }

    Ok(client)
}

/// Builds the canonical missing-parameter error.
#[must_use]
pub fn missing_parameter(name: &str) -> AuthError {
    AuthError::invalid_request(format!("The following parameter is missing: {name}"))
}
