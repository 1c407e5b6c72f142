//! Error types for the authorization server core.
//!
//! Protocol failures are represented by [`AuthError`], whose variants map
//! one-to-one onto the RFC 6749 error taxonomy plus two internal kinds
//! (`Storage` and `Internal`) that surface as `server_error` on the wire.
//! The endpoint boundary is the only place that decides how an error is
//! delivered (redirect parameters vs. a JSON/HTML body); everything below
//! it simply propagates typed failures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur while processing authorization and token requests.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request is missing a required parameter or is otherwise malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// Client authentication failed or the client is not registered.
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Description of why the client is invalid.
        message: String,
    },

    /// The authorization grant or refresh token is invalid, expired,
    /// revoked, or was issued to another client.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Description of why the grant is invalid.
        message: String,
    },

    /// The client is not authorized to use this grant or response type.
    #[error("Unauthorized client: {message}")]
    UnauthorizedClient {
        /// Description of why the client is unauthorized.
        message: String,
    },

    /// The grant type is not supported by the authorization server.
    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType {
        /// The unsupported grant type.
        grant_type: String,
    },

    /// The response type is not supported by the authorization server.
    #[error("Unsupported response type: {response_type}")]
    UnsupportedResponseType {
        /// The unsupported response type.
        response_type: String,
    },

    /// The requested scope is invalid, unknown, or malformed.
    #[error("Invalid scope: {message}")]
    InvalidScope {
        /// Description of why the scope is invalid.
        message: String,
    },

    /// The resource owner or authorization server denied the request.
    #[error("Access denied: {message}")]
    AccessDenied {
        /// Description of why access was denied.
        message: String,
    },

    /// The authorization session exceeded its inactivity deadline.
    /// Surfaces as `invalid_grant` on the wire.
    #[error("Session has timed out")]
    SessionExpired,

    /// The server is temporarily unable to handle the request.
    #[error("Temporarily unavailable: {message}")]
    TemporarilyUnavailable {
        /// Description of the temporary condition.
        message: String,
    },

    /// An error occurred while storing or retrieving protocol state.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClient` error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `UnauthorizedClient` error.
    #[must_use]
    pub fn unauthorized_client(message: impl Into<String>) -> Self {
        Self::UnauthorizedClient {
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedGrantType` error.
    #[must_use]
    pub fn unsupported_grant_type(grant_type: impl Into<String>) -> Self {
        Self::UnsupportedGrantType {
            grant_type: grant_type.into(),
        }
    }

    /// Creates a new `UnsupportedResponseType` error.
    #[must_use]
    pub fn unsupported_response_type(response_type: impl Into<String>) -> Self {
        Self::UnsupportedResponseType {
            response_type: response_type.into(),
        }
    }

    /// Creates a new `InvalidScope` error.
    #[must_use]
    pub fn invalid_scope(message: impl Into<String>) -> Self {
        Self::InvalidScope {
            message: message.into(),
        }
    }

    /// Creates a new `AccessDenied` error.
    #[must_use]
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    /// Creates a new `TemporarilyUnavailable` error.
    #[must_use]
    pub fn temporarily_unavailable(message: impl Into<String>) -> Self {
        Self::TemporarilyUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the RFC 6749 error code for this error.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            Self::InvalidClient { .. } => ErrorCode::InvalidClient,
            Self::InvalidGrant { .. } | Self::SessionExpired => ErrorCode::InvalidGrant,
            Self::UnauthorizedClient { .. } => ErrorCode::UnauthorizedClient,
            Self::UnsupportedGrantType { .. } => ErrorCode::UnsupportedGrantType,
            Self::UnsupportedResponseType { .. } => ErrorCode::UnsupportedResponseType,
            Self::InvalidScope { .. } => ErrorCode::InvalidScope,
            Self::AccessDenied { .. } => ErrorCode::AccessDenied,
            Self::TemporarilyUnavailable { .. } => ErrorCode::TemporarilyUnavailable,
            Self::Storage { .. } | Self::Internal { .. } => ErrorCode::ServerError,
        }
    }

    /// Returns the human-readable description carried by this error.
    ///
    /// Unlike [`fmt::Display`], the description does not repeat the error
    /// kind; it is suitable for the `error_description` response parameter.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::InvalidRequest { message }
            | Self::InvalidClient { message }
            | Self::InvalidGrant { message }
            | Self::UnauthorizedClient { message }
            | Self::InvalidScope { message }
            | Self::AccessDenied { message }
            | Self::TemporarilyUnavailable { message }
            | Self::Storage { message }
            | Self::Internal { message } => message.clone(),
            Self::UnsupportedGrantType { grant_type } => {
                format!("Unsupported grant type: {grant_type}")
            }
            Self::UnsupportedResponseType { response_type } => {
                format!("Unsupported response type: {response_type}")
            }
            Self::SessionExpired => "Session has timed out.".to_string(),
        }
    }

    /// Returns `true` if this is a caller input error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !self.is_server_error()
    }

    /// Returns `true` if this is a server-side error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Internal { .. })
    }
}

/// OAuth 2.0 error codes as defined in RFC 6749 sections 4.1.2.1 and 5.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Missing or malformed request parameter.
    InvalidRequest,
    /// Client authentication failed.
    InvalidClient,
    /// Invalid, expired, or revoked grant.
    InvalidGrant,
    /// Client not authorized for this grant or response type.
    UnauthorizedClient,
    /// Grant type not supported by the server.
    UnsupportedGrantType,
    /// Response type not supported by the server.
    UnsupportedResponseType,
    /// Invalid, unknown, or malformed scope.
    InvalidScope,
    /// The resource owner or server denied the request.
    AccessDenied,
    /// Unexpected condition prevented fulfilling the request.
    ServerError,
    /// Temporary overload or maintenance.
    TemporarilyUnavailable,
}

impl ErrorCode {
    /// Returns the wire representation of the error code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant => "invalid_grant",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::InvalidScope => "invalid_scope",
            Self::AccessDenied => "access_denied",
            Self::ServerError => "server_error",
            Self::TemporarilyUnavailable => "temporarily_unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured error response body.
///
/// The same fields are used for both delivery channels: appended as
/// redirect parameters once a redirection URI has been verified, or
/// serialized as a JSON body (token endpoint) or error page (authorization
/// endpoint before URI verification).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// RFC 6749 error code.
    pub error: ErrorCode,

    /// Human-readable error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,

    /// URI of a page with more information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

impl ErrorResponse {
    /// Creates an error response with the given code and no description.
    #[must_use]
    pub fn new(error: ErrorCode) -> Self {
        Self {
            error,
            error_description: None,
            error_uri: None,
        }
    }

    /// Creates an error response from an internal error.
    ///
    /// Server-side errors are wrapped as `server_error` and keep their
    /// message as the description; internal error types never cross the
    /// protocol boundary unmapped.
    #[must_use]
    pub fn from_error(err: &AuthError) -> Self {
        Self {
            error: err.error_code(),
            error_description: Some(err.description()),
            error_uri: None,
        }
    }

    /// Sets the error reference URI.
    #[must_use]
    pub fn with_error_uri(mut self, uri: impl Into<String>) -> Self {
        self.error_uri = Some(uri.into());
        self
    }
}
