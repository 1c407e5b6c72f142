//! Client registry contract.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Client;

/// Read-only access to registered OAuth clients.
///
/// Registration management (create, rotate secrets, delete) is a concern of
/// the hosting application; the protocol core only looks clients up and
/// checks their credentials.
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Looks up a client by its identifier.
    async fn find_by_id(&self, client_id: &str) -> AuthResult<Option<Client>>;

    /// Verifies a client secret.
    ///
    /// Returns `false` for unknown clients and for clients without a
    /// configured secret; the caller maps that onto `invalid_client`.
    async fn verify_secret(&self, client_id: &str, secret: &str) -> AuthResult<bool>;
}
