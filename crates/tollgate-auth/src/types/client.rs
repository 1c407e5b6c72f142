//! OAuth 2.0 client domain types.
//!
//! A [`Client`] describes a registered application as seen by the
//! authorization server: its identifier, optional secret, profile
//! (confidential or public), registered redirection URIs, and the grant and
//! response types it is allowed to use. The server consumes client records
//! through the [`ClientRegistry`](crate::storage::ClientRegistry) contract;
//! it never owns or mutates them.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Grant Type
// =============================================================================

/// OAuth 2.0 grant types (RFC 6749 section 1.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Authorization Code flow.
    AuthorizationCode,
    /// Resource Owner Password Credentials flow.
    /// Only for trusted first-party applications.
    Password,
    /// Client Credentials flow (confidential clients only).
    ClientCredentials,
    /// Refresh Token flow.
    RefreshToken,
}

impl GrantType {
    /// Returns the OAuth 2.0 `grant_type` parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::Password => "password",
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken => "refresh_token",
        }
    }

    /// Parses a `grant_type` parameter value.
    ///
    /// Returns `None` for unrecognized values; the token endpoint maps that
    /// to `unsupported_grant_type`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "authorization_code" => Some(Self::AuthorizationCode),
            "password" => Some(Self::Password),
            "client_credentials" => Some(Self::ClientCredentials),
            "refresh_token" => Some(Self::RefreshToken),
            _ => None,
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Response Type
// =============================================================================

/// OAuth 2.0 response types accepted by the authorization endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Authorization code flow (`response_type=code`).
    Code,
    /// Implicit flow (`response_type=token`).
    Token,
}

impl ResponseType {
    /// Returns the OAuth 2.0 `response_type` parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Token => "token",
        }
    }

    /// Parses a `response_type` parameter value.
    ///
    /// Returns `None` for unrecognized values; the authorization endpoint
    /// maps that to `unsupported_response_type`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "code" => Some(Self::Code),
            "token" => Some(Self::Token),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Client
// =============================================================================

/// Client profile (RFC 6749 section 2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    /// Able to keep its credentials confidential (server-side application).
    Confidential,
    /// Unable to keep a secret confidential (native or browser application).
    Public,
}

/// A registered OAuth 2.0 client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Unique client identifier used in OAuth flows.
    pub client_id: String,

    /// Client secret. `None` for public clients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Whether the client can keep its credentials confidential.
    pub client_type: ClientType,

    /// Registered redirection URIs for browser-based flows.
    #[serde(default)]
    pub redirect_uris: Vec<String>,

    /// Grant types this client is allowed to use at the token endpoint.
    pub allowed_grant_types: Vec<GrantType>,

    /// Response types this client is allowed to use at the authorization
    /// endpoint.
    #[serde(default)]
    pub allowed_response_types: Vec<ResponseType>,
}

impl Client {
    /// Checks if the given grant type is allowed for this client.
    #[must_use]
    pub fn is_grant_type_allowed(&self, grant_type: GrantType) -> bool {
        self.allowed_grant_types.contains(&grant_type)
    }

    /// Checks if the given response type is allowed for this client.
    #[must_use]
    pub fn is_response_type_allowed(&self, response_type: ResponseType) -> bool {
        self.allowed_response_types.contains(&response_type)
    }

    /// Validates the client registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration violates a structural
    /// invariant.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.client_id.is_empty() {
            return Err(ClientValidationError::EmptyClientId);
        }

        if self.client_type == ClientType::Confidential && self.client_secret.is_none() {
            return Err(ClientValidationError::MissingSecret);
        }

        // The client credentials grant is reserved for confidential clients.
        if self.client_type == ClientType::Public
            && self.allowed_grant_types.contains(&GrantType::ClientCredentials)
        {
            return Err(ClientValidationError::PublicClientCredentials);
        }

        let uses_redirect = !self.allowed_response_types.is_empty()
            || self.allowed_grant_types.contains(&GrantType::AuthorizationCode);
        if uses_redirect && self.redirect_uris.is_empty() {
            return Err(ClientValidationError::NoRedirectUris);
        }

        Ok(())
    }
}

/// Errors that can occur during client registration validation.
#[derive(Debug, thiserror::Error)]
pub enum ClientValidationError {
    /// Client ID cannot be empty.
    #[error("Client ID cannot be empty")]
    EmptyClientId,

    /// Confidential clients require a client secret.
    #[error("Confidential clients require a client secret")]
    MissingSecret,

    /// Public clients cannot use the client_credentials grant.
    #[error("Public clients cannot use the client_credentials grant")]
    PublicClientCredentials,

    /// Redirect-based flows require at least one registered redirect URI.
    #[error("Redirect-based flows require at least one registered redirect URI")]
    NoRedirectUris,
}
