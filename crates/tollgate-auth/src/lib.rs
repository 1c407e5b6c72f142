//! # tollgate-auth
//!
//! OAuth 2.0 authorization server core.
//!
//! This crate provides:
//! - Authorization endpoint state machine (code and implicit flows)
//! - Token endpoint state machine (authorization_code, password,
//!   client_credentials, refresh_token grants)
//! - Authorization session store with inactivity timeout
//! - Redirection URI validation
//! - Bearer token verification for protected resources
//! - RFC 6749 error taxonomy with redirect and direct-body delivery
//!
//! ## Overview
//!
//! The crate is transport-agnostic: it never touches HTTP directly.
//! Endpoints consume decoded request parameters and produce outcome values
//! ([`oauth::AuthorizeOutcome`], [`oauth::TokenEndpointReply`]) that the
//! hosting application maps onto its HTTP stack. Durable state lives
//! behind async traits ([`storage::TokenStore`], [`storage::ClientRegistry`],
//! [`storage::ResourceOwnerAuthenticator`]) composed as `Arc<dyn Trait>`;
//! in-memory implementations are included for tests and single-node use.
//!
//! ## Modules
//!
//! - [`config`] - Authorization server configuration
//! - [`error`] - Error taxonomy and wire error bodies
//! - [`scope`] - Scope sets and their wire representation
//! - [`types`] - Client and token domain types
//! - [`oauth`] - Endpoint state machines, sessions, redirect handling
//! - [`verify`] - Bearer token verification (RFC 6750)
//! - [`storage`] - Consumed service contracts and in-memory backends

pub mod config;
pub mod error;
pub mod oauth;
pub mod scope;
pub mod storage;
pub mod types;
pub mod verify;

pub use config::{AuthServerConfig, BearerExtraction};
pub use error::{AuthError, ErrorCode, ErrorResponse};
pub use oauth::{
    AuthorizationEndpoint, AuthorizationRequest, AuthorizationSession, AuthorizeOutcome,
    ConsentDecision, RedirectionUri, SessionRegistry, TokenEndpoint, TokenEndpointReply,
    TokenRequest, TokenResponse,
};
pub use scope::ScopeSet;
pub use storage::{
    ClientRegistry, MemoryClientRegistry, MemoryTokenStore, MemoryUserStore,
    ResourceOwnerAuthenticator, TokenStore,
};
pub use types::{Client, ClientType, ClientValidationError, GrantType, ResponseType, Token};
pub use verify::{BearerVerifier, Verification};

/// Type alias for authorization server results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tollgate_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthServerConfig, BearerExtraction};
    pub use crate::error::{AuthError, ErrorCode, ErrorResponse};
    pub use crate::oauth::{
        AuthorizationEndpoint, AuthorizationRequest, AuthorizationSession, AuthorizeOutcome,
        ConsentDecision, RedirectionUri, SessionRegistry, TokenEndpoint, TokenEndpointReply,
        TokenRequest, TokenResponse,
    };
    pub use crate::scope::ScopeSet;
    pub use crate::storage::{
        ClientRegistry, MemoryClientRegistry, MemoryTokenStore, MemoryUserStore,
        ResourceOwnerAuthenticator, TokenStore,
    };
    pub use crate::types::{Client, ClientType, GrantType, ResponseType, Token};
    pub use crate::verify::{BearerVerifier, Verification};
}
