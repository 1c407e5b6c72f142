//! In-memory backend implementations.
//!
//! Process-local stores for tests, demos, and single-node deployments.
//! Tokens and authorization codes are unguessable random strings; nothing
//! survives a restart.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dashmap::DashMap;
use rand::RngCore;
use time::OffsetDateTime;
use tracing::debug;

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::session::AuthorizationSession;
use crate::scope::ScopeSet;
use crate::storage::{ClientRegistry, ResourceOwnerAuthenticator, TokenStore};
use crate::types::{Client, Token};

/// 192 bits of randomness, base64url without padding.
fn opaque_string() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, Clone)]
struct IssuedToken {
    token: Token,
    client_id: String,
    expires_at: Option<OffsetDateTime>,
}

impl IssuedToken {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

#[derive(Debug, Clone)]
struct RefreshRecord {
    client_id: String,
    subject: String,
    scope: ScopeSet,
    access_token: String,
}

/// In-memory [`TokenStore`].
///
/// Access tokens optionally expire after a fixed lifetime; refresh tokens
/// and authorization codes never expire on their own (codes are single-use
/// and sessions already carry an inactivity deadline).
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: DashMap<String, IssuedToken>,
    refresh_tokens: DashMap<String, RefreshRecord>,
    codes: DashMap<String, AuthorizationSession>,
    token_lifetime: Option<std::time::Duration>,
}

impl MemoryTokenStore {
    /// Creates a store issuing non-expiring tokens.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose access tokens expire after `lifetime`.
    #[must_use]
    pub fn with_token_lifetime(lifetime: std::time::Duration) -> Self {
        Self {
            token_lifetime: Some(lifetime),
            ..Self::default()
        }
    }

    fn mint(&self, client: &Client, subject: &str, scope: ScopeSet, refreshable: bool) -> Token {
        let access_token = opaque_string();
        let mut token = Token::bearer(access_token.clone(), subject, scope.clone());

        let mut expires_at = None;
        if let Some(lifetime) = self.token_lifetime {
            token = token.with_expires_in(lifetime.as_secs());
            expires_at = Some(OffsetDateTime::now_utc() + lifetime);
        }

        if refreshable {
            let refresh_token = opaque_string();
            token = token.with_refresh_token(refresh_token.clone());
            self.refresh_tokens.insert(
                refresh_token,
                RefreshRecord {
                    client_id: client.client_id.clone(),
                    subject: subject.to_string(),
                    scope,
                    access_token: access_token.clone(),
                },
            );
        }

        self.tokens.insert(
            access_token,
            IssuedToken {
                token: token.clone(),
                client_id: client.client_id.clone(),
                expires_at,
            },
        );
        token
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn generate_token(
        &self,
        client: &Client,
        owner: &str,
        scope: ScopeSet,
    ) -> AuthResult<Token> {
        debug!(client_id = %client.client_id, owner, "minting owner token");
        Ok(self.mint(client, owner, scope, true))
    }

    async fn generate_client_token(&self, client: &Client, scope: ScopeSet) -> AuthResult<Token> {
        debug!(client_id = %client.client_id, "minting client token");
        Ok(self.mint(client, &client.client_id, scope, false))
    }

    async fn refresh_token(
        &self,
        client: &Client,
        refresh_token: &str,
        scope: Option<ScopeSet>,
    ) -> AuthResult<Token> {
        let record = self
            .refresh_tokens
            .remove(refresh_token)
            .map(|(_, record)| record)
            .ok_or_else(|| AuthError::invalid_grant("Unknown refresh token."))?;

        if record.client_id != client.client_id {
            return Err(AuthError::invalid_grant(
                "The refresh token was not issued to the client.",
            ));
        }

        let scope = match scope {
            Some(requested) => {
                if !requested.is_subset(&record.scope) {
                    return Err(AuthError::invalid_scope(
                        "The requested scope exceeds the originally granted scope.",
                    ));
                }
                requested
            }
            None => record.scope.clone(),
        };

        // Rotation: the spent refresh token and its access token both die.
        self.tokens.remove(&record.access_token);
        Ok(self.mint(client, &record.subject, scope, true))
    }

    async fn store_session(&self, session: AuthorizationSession) -> AuthResult<String> {
        let code = opaque_string();
        self.codes.insert(code.clone(), session);
        Ok(code)
    }

    async fn restore_session(&self, code: &str) -> AuthResult<AuthorizationSession> {
        self.codes
            .remove(code)
            .map(|(_, session)| session)
            .ok_or_else(|| AuthError::invalid_grant("Unknown or already redeemed code."))
    }

    async fn validate_token(&self, access_token: &str) -> AuthResult<Token> {
        let Some(entry) = self.tokens.get(access_token) else {
            return Err(AuthError::invalid_grant("Unknown access token."));
        };
        if entry.is_expired(OffsetDateTime::now_utc()) {
            drop(entry);
            self.tokens.remove(access_token);
            return Err(AuthError::invalid_grant("Token expired."));
        }
        Ok(entry.token.clone())
    }

    async fn find_token(&self, client: &Client, owner: &str) -> AuthResult<Option<Token>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .tokens
            .iter()
            .find(|entry| {
                entry.client_id == client.client_id
                    && entry.token.subject == owner
                    && !entry.is_expired(now)
            })
            .map(|entry| entry.token.clone()))
    }

    async fn revoke_token(&self, client: &Client, access_token: &str) -> AuthResult<()> {
        let Some(entry) = self.tokens.get(access_token) else {
            return Ok(());
        };
        if entry.client_id != client.client_id {
            return Ok(());
        }
        let refresh = entry.token.refresh_token.clone();
        drop(entry);

        self.tokens.remove(access_token);
        if let Some(refresh) = refresh {
            self.refresh_tokens.remove(&refresh);
        }
        Ok(())
    }
}

/// In-memory [`ClientRegistry`] populated at startup.
#[derive(Debug, Default)]
pub struct MemoryClientRegistry {
    clients: DashMap<String, Client>,
}

impl MemoryClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client, replacing any previous registration under the
    /// same id.
    pub fn register(&self, client: Client) {
        self.clients.insert(client.client_id.clone(), client);
    }
}

#[async_trait]
impl ClientRegistry for MemoryClientRegistry {
    async fn find_by_id(&self, client_id: &str) -> AuthResult<Option<Client>> {
        Ok(self.clients.get(client_id).map(|entry| entry.clone()))
    }

    async fn verify_secret(&self, client_id: &str, secret: &str) -> AuthResult<bool> {
        Ok(self
            .clients
            .get(client_id)
            .and_then(|entry| entry.client_secret.clone())
            .is_some_and(|registered| registered == secret))
    }
}

/// In-memory username/password table for the password grant.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<String, String>,
}

impl MemoryUserStore {
    /// Creates an empty user store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user with the given password.
    pub fn add_user(&self, username: impl Into<String>, password: impl Into<String>) {
        self.users.insert(username.into(), password.into());
    }
}

#[async_trait]
impl ResourceOwnerAuthenticator for MemoryUserStore {
    async fn authenticate(&self, username: &str, password: &str) -> AuthResult<String> {
        let matches = self
            .users
            .get(username)
            .is_some_and(|stored| stored.as_str() == password);
        if matches {
            Ok(username.to_string())
        } else {
            Err(AuthError::invalid_grant("Wrong username or password."))
        }
    }
}
