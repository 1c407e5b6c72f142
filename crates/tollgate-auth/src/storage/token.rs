//! Token service contract.

use async_trait::async_trait;

use crate::AuthResult;
use crate::oauth::session::AuthorizationSession;
use crate::scope::ScopeSet;
use crate::types::{Client, Token};

/// Mints, exchanges, and validates opaque tokens and authorization codes.
///
/// The core never inspects token contents; everything it knows about a
/// token comes back from this contract. Implementations decide lifetime,
/// refresh policy, and persistence.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Mints an access token for `client` acting on behalf of `owner`.
    async fn generate_token(
        &self,
        client: &Client,
        owner: &str,
        scope: ScopeSet,
    ) -> AuthResult<Token>;

    /// Mints an access token for `client` acting on its own behalf
    /// (client credentials grant). No refresh token is attached.
    async fn generate_client_token(&self, client: &Client, scope: ScopeSet) -> AuthResult<Token>;

    /// Exchanges a refresh token for a fresh access token.
    ///
    /// When `scope` is given it must narrow the originally granted scope.
    ///
    /// # Errors
    ///
    /// `invalid_grant` for an unknown, revoked, or foreign refresh token;
    /// `invalid_scope` when the requested scope widens the grant.
    async fn refresh_token(
        &self,
        client: &Client,
        refresh_token: &str,
        scope: Option<ScopeSet>,
    ) -> AuthResult<Token>;

    /// Stores a completed authorization session under a fresh single-use
    /// authorization code and returns the code.
    async fn store_session(&self, session: AuthorizationSession) -> AuthResult<String>;

    /// Redeems an authorization code, consuming it.
    ///
    /// # Errors
    ///
    /// `invalid_grant` when the code is unknown or already redeemed.
    async fn restore_session(&self, code: &str) -> AuthResult<AuthorizationSession>;

    /// Validates an access token presented to a protected resource.
    ///
    /// # Errors
    ///
    /// `invalid_grant` when the token is unknown, expired, or revoked.
    async fn validate_token(&self, access_token: &str) -> AuthResult<Token>;

    /// Looks up a live token previously issued to `client` for `owner`.
    ///
    /// Drives consent auto-approval: the scope of an existing token tells
    /// the consent step what the owner already agreed to.
    async fn find_token(&self, client: &Client, owner: &str) -> AuthResult<Option<Token>>;

    /// Revokes an access token issued to `client`, along with any refresh
    /// token attached to it. Revoking an unknown token is a no-op.
    async fn revoke_token(&self, client: &Client, access_token: &str) -> AuthResult<()>;
}
