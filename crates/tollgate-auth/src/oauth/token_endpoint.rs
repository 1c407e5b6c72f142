//! Token endpoint state machine (RFC 6749 sections 4.1.3, 4.3, 4.4, and 6).
//!
//! [`TokenEndpoint::handle`] is the boundary catch: whatever goes wrong in
//! a grant flow, the caller always gets a well-formed
//! [`TokenEndpointReply`], HTTP 400 with an RFC 6749 error body, never a
//! raw internal error.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::AuthResult;
use crate::config::AuthServerConfig;
use crate::error::AuthError;
use crate::oauth::client_auth::{authenticated_client, missing_parameter, public_client};
use crate::oauth::token::{TokenEndpointReply, TokenRequest, TokenResponse};
use crate::scope::ScopeSet;
use crate::storage::{ClientRegistry, ResourceOwnerAuthenticator, TokenStore};
use crate::types::{Client, ClientType, GrantType};

/// The token endpoint service.
pub struct TokenEndpoint {
    tokens: Arc<dyn TokenStore>,
    clients: Arc<dyn ClientRegistry>,
    owners: Option<Arc<dyn ResourceOwnerAuthenticator>>,
    session_timeout: time::Duration,
}

impl TokenEndpoint {
    /// Creates the endpoint. Passing `owners` enables the password grant.
    #[must_use]
    pub fn new(
        config: &AuthServerConfig,
        tokens: Arc<dyn TokenStore>,
        clients: Arc<dyn ClientRegistry>,
        owners: Option<Arc<dyn ResourceOwnerAuthenticator>>,
    ) -> Self {
        Self {
            tokens,
            clients,
            owners,
            session_timeout: config.session_timeout(),
        }
    }

    /// Processes a token request.
    ///
    /// `authorization` is the raw `Authorization` header value, if the
    /// transport saw one.
    pub async fn handle(
        &self,
        request: &TokenRequest,
        authorization: Option<&str>,
    ) -> TokenEndpointReply {
        match self.handle_inner(request, authorization).await {
            Ok(response) => TokenEndpointReply::success(&response),
            Err(err) => {
                if err.is_server_error() {
                    warn!(error = %err, "token request failed on the server side");
                } else {
                    debug!(error = %err, "token request rejected");
                }
                TokenEndpointReply::error(&err)
            }
        }
    }

    async fn handle_inner(
        &self,
        request: &TokenRequest,
        authorization: Option<&str>,
    ) -> AuthResult<TokenResponse> {
        let grant_type = match request.grant_type.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => GrantType::parse(raw)
                .ok_or_else(|| AuthError::unsupported_grant_type(raw))?,
            None => return Err(AuthError::unsupported_grant_type("(none)")),
        };

        match grant_type {
            GrantType::AuthorizationCode => self.authorization_code(request, authorization).await,
            GrantType::Password => self.password(request, authorization).await,
            GrantType::ClientCredentials => self.client_credentials(request, authorization).await,
            GrantType::RefreshToken => self.refresh(request, authorization).await,
        }
    }

    /// Resolves the requesting client: presented credentials win, the
    /// public-client fallback applies only when none were presented.
    async fn resolve_client(
        &self,
        request: &TokenRequest,
        authorization: Option<&str>,
    ) -> AuthResult<Client> {
        match authenticated_client(authorization, self.clients.as_ref()).await? {
            Some(client) => Ok(client),
            None => public_client(request.client_id.as_deref(), self.clients.as_ref()).await,
        }
    }

    fn check_grant_allowed(client: &Client, grant_type: GrantType) -> AuthResult<()> {
        if client.is_grant_type_allowed(grant_type) {
            Ok(())
        } else {
            Err(AuthError::unauthorized_client("Unauthorized grant type."))
        }
    }

    async fn authorization_code(
        &self,
        request: &TokenRequest,
        authorization: Option<&str>,
    ) -> AuthResult<TokenResponse> {
        let client = self.resolve_client(request, authorization).await?;
        Self::check_grant_allowed(&client, GrantType::AuthorizationCode)?;

        let code = request
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| missing_parameter("code"))?;

        let mut session = self.tokens.restore_session(code).await?;

        if session.client_id != client.client_id {
            warn!(
                code_client = %session.client_id,
                requesting_client = %client.client_id,
                "authorization code presented by the wrong client"
            );
            return Err(AuthError::invalid_grant("The code was not issued to the client."));
        }

        session
            .touch(self.session_timeout)
            .map_err(|_| AuthError::invalid_grant("Code expired."))?;

        // A dynamically supplied redirect URI binds the exchange to it.
        if session.redirect_uri().is_dynamic()
            && request.redirect_uri.as_deref() != Some(session.redirect_uri().uri())
        {
            return Err(AuthError::invalid_grant(
                "The redirect_uri does not match the authorization request.",
            ));
        }

        let owner = session
            .scope_owner
            .clone()
            .ok_or_else(|| AuthError::internal("code session has no resource owner"))?;
        let granted = session
            .granted_scope
            .clone()
            .ok_or_else(|| AuthError::internal("code session has no granted scope"))?;

        let token = self.tokens.generate_token(&client, &owner, granted).await?;
        info!(client_id = %client.client_id, owner, "exchanged authorization code");
        Ok(TokenResponse::from_token(token, Some(&session.requested_scope)))
    }

    async fn password(
        &self,
        request: &TokenRequest,
        authorization: Option<&str>,
    ) -> AuthResult<TokenResponse> {
        let Some(owners) = &self.owners else {
            return Err(AuthError::unsupported_grant_type(GrantType::Password.as_str()));
        };

        let client = self.resolve_client(request, authorization).await?;
        Self::check_grant_allowed(&client, GrantType::Password)?;

        let username = request
            .username
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| missing_parameter("username"))?;
        let password = request
            .password
            .as_deref()
            .ok_or_else(|| missing_parameter("password"))?;

        let identifier = owners.authenticate(username, password).await?;
        let scope = ScopeSet::parse_opt(request.scope.as_deref());

        let token = self
            .tokens
            .generate_token(&client, &identifier, scope.clone().unwrap_or_default())
            .await?;
        info!(client_id = %client.client_id, owner = identifier, "issued password grant token");
        Ok(TokenResponse::from_token(token, scope.as_ref()))
    }

    async fn client_credentials(
        &self,
        request: &TokenRequest,
        authorization: Option<&str>,
    ) -> AuthResult<TokenResponse> {
        // Public clients are categorically barred from this grant.
        let client = authenticated_client(authorization, self.clients.as_ref())
            .await?
            .ok_or_else(|| AuthError::invalid_client("Unauthenticated confidential client."))?;
        if client.client_type != ClientType::Confidential {
            return Err(AuthError::invalid_client(
                "The client credentials grant requires a confidential client.",
            ));
        }
        Self::check_grant_allowed(&client, GrantType::ClientCredentials)?;

        let scope = ScopeSet::parse_opt(request.scope.as_deref());
        let token = self
            .tokens
            .generate_client_token(&client, scope.clone().unwrap_or_default())
            .await?;
        info!(client_id = %client.client_id, "issued client credentials token");
        Ok(TokenResponse::from_token(token, scope.as_ref()))
    }

    async fn refresh(
        &self,
        request: &TokenRequest,
        authorization: Option<&str>,
    ) -> AuthResult<TokenResponse> {
        let client = self.resolve_client(request, authorization).await?;
        Self::check_grant_allowed(&client, GrantType::RefreshToken)?;

        let refresh_token = request
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| missing_parameter("refresh_token"))?;
        let scope = ScopeSet::parse_opt(request.scope.as_deref());

        let token = self
            .tokens
            .refresh_token(&client, refresh_token, scope.clone())
            .await?;
        info!(client_id = %client.client_id, "refreshed access token");
        Ok(TokenResponse::from_token(token, scope.as_ref()))
    }
}
