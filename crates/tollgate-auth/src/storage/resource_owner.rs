//! Resource owner authentication contract.

use async_trait::async_trait;

use crate::AuthResult;

/// Verifies resource owner credentials for the password grant.
///
/// Wiring an implementation into the token endpoint enables the password
/// grant; leaving it out makes `grant_type=password` fail with
/// `unsupported_grant_type`.
#[async_trait]
pub trait ResourceOwnerAuthenticator: Send + Sync {
    /// Authenticates a resource owner, returning their canonical
    /// identifier.
    ///
    /// # Errors
    ///
    /// `invalid_grant` carrying an explanation when the credentials are
    /// rejected.
    async fn authenticate(&self, username: &str, password: &str) -> AuthResult<String>;
}
