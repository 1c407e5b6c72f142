//! Authorization endpoint state machine (RFC 6749 sections 4.1 and 4.2).
//!
//! [`AuthorizationEndpoint`] drives the browser-facing half of the code and
//! implicit flows as a transport-agnostic service: the hosting application
//! decodes the HTTP request, tells the endpoint who (if anyone) is logged
//! in, and renders whatever [`AuthorizeOutcome`] comes back.
//!
//! Error delivery is two-phased. Until the redirection URI has been
//! verified every failure is an [`AuthorizeOutcome::ErrorPage`]; from then
//! on failures travel back to the client as error redirects, in the query
//! or fragment component per the flow.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::AuthResult;
use crate::error::{AuthError, ErrorResponse};
use crate::oauth::authorize::{
    AuthorizationRequest, AuthorizeOutcome, ConsentDecision, ParameterPlacement, code_redirect,
    error_redirect, token_redirect,
};
use crate::oauth::client_auth::missing_parameter;
use crate::oauth::redirect::RedirectionUri;
use crate::oauth::session::{AuthorizationSession, SessionRegistry};
use crate::scope::ScopeSet;
use crate::storage::{ClientRegistry, TokenStore};
use crate::types::ResponseType;

fn placement_for(flow: Option<ResponseType>) -> ParameterPlacement {
    match flow {
        Some(ResponseType::Token) => ParameterPlacement::Fragment,
        // Query is also the fallback when the flow never got established.
        Some(ResponseType::Code) | None => ParameterPlacement::Query,
    }
}

fn error_page(err: &AuthError) -> AuthorizeOutcome {
    AuthorizeOutcome::ErrorPage(ErrorResponse::from_error(err))
}

/// The authorization endpoint service.
pub struct AuthorizationEndpoint {
    sessions: Arc<SessionRegistry>,
    tokens: Arc<dyn TokenStore>,
    clients: Arc<dyn ClientRegistry>,
}

impl AuthorizationEndpoint {
    /// Creates the endpoint on top of the given session registry and
    /// stores.
    #[must_use]
    pub fn new(
        sessions: Arc<SessionRegistry>,
        tokens: Arc<dyn TokenStore>,
        clients: Arc<dyn ClientRegistry>,
    ) -> Self {
        Self {
            sessions,
            tokens,
            clients,
        }
    }

    /// Returns the session registry, for transports that correlate the
    /// browser round-trips themselves (typically via a cookie).
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Processes an authorization request, fresh or resumed.
    ///
    /// `session_id` resumes a suspended flow (after a login round-trip);
    /// `authenticated_owner` is the resource owner the transport has
    /// already authenticated, if any.
    pub async fn authorize(
        &self,
        request: &AuthorizationRequest,
        session_id: Option<Uuid>,
        authenticated_owner: Option<&str>,
    ) -> AuthorizeOutcome {
        match self
            .authorize_inner(request, session_id, authenticated_owner)
            .await
        {
            Ok(outcome) => outcome,
            // Everything reaching here failed before (or while) verifying
            // the redirection URI, so a redirect would be unsafe.
            Err(err) => error_page(&err),
        }
    }

    async fn authorize_inner(
        &self,
        request: &AuthorizationRequest,
        session_id: Option<Uuid>,
        authenticated_owner: Option<&str>,
    ) -> AuthResult<AuthorizeOutcome> {
        let resumed = match session_id {
            Some(id) => self.sessions.access(id)?,
            None => None,
        };

        let mut session = match resumed {
            Some(session) => session,
            None => self.open_session(request).await?,
        };

        let client = self
            .clients
            .find_by_id(&session.client_id)
            .await?
            .ok_or_else(|| AuthError::internal("session refers to an unknown client"))?;

        if session.flow().is_none() {
            let raw = match request.response_type.as_deref().filter(|s| !s.is_empty()) {
                Some(raw) => raw,
                None => {
                    return Ok(self.fail_redirect(session, &missing_parameter("response_type")));
                }
            };
            let Some(flow) = ResponseType::parse(raw) else {
                debug!(response_type = raw, "unsupported response type");
                return Ok(
                    self.fail_redirect(session, &AuthError::unsupported_response_type(raw))
                );
            };
            // The flow goes onto the session before the allowed check so a
            // failure is delivered in the right component (fragment for the
            // implicit flow, RFC 6749 section 4.2.2.1).
            session.set_flow(flow)?;
            if !client.is_response_type_allowed(flow) {
                return Ok(self.fail_redirect(
                    session,
                    &AuthError::unauthorized_client(
                        "The client is not allowed to use this response type.",
                    ),
                ));
            }
        }

        let owner = match (session.scope_owner.clone(), authenticated_owner) {
            (Some(owner), _) => owner,
            (None, Some(owner)) => {
                session.scope_owner = Some(owner.to_string());
                owner.to_string()
            }
            (None, None) => {
                let id = session.id;
                self.sessions.update(session);
                debug!(session_id = %id, "suspending authorization for login");
                return Ok(AuthorizeOutcome::LoginRequired { session_id: id });
            }
        };

        let pre_granted = self
            .tokens
            .find_token(&client, &owner)
            .await?
            .map(|token| token.scope);

        let outcome = AuthorizeOutcome::ConsentRequired {
            session_id: session.id,
            client_id: session.client_id.clone(),
            requested_scope: session.requested_scope.clone(),
            pre_granted,
        };
        self.sessions.update(session);
        Ok(outcome)
    }

    /// Validates the identity half of a fresh request and opens a session.
    async fn open_session(
        &self,
        request: &AuthorizationRequest,
    ) -> AuthResult<AuthorizationSession> {
        let client_id = request
            .client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| missing_parameter("client_id"))?;

        let client = self
            .clients
            .find_by_id(client_id)
            .await?
            .ok_or_else(|| AuthError::invalid_client("The client could not be verified."))?;

        let redirect_uri =
            RedirectionUri::resolve(request.redirect_uri.as_deref(), &client.redirect_uris)?;

        let mut session = self.sessions.create(client_id, redirect_uri);
        if let Some(scope) = ScopeSet::parse_opt(request.scope.as_deref()) {
            session.requested_scope = scope;
        }
        if let Some(state) = &request.state {
            session.set_state(state);
        }
        debug!(session_id = %session.id, client_id, "opened authorization session");
        Ok(session)
    }

    /// Terminal failure after URI verification: destroy the session and
    /// deliver the error by redirect, echoing the client's state.
    fn fail_redirect(&self, mut session: AuthorizationSession, err: &AuthError) -> AuthorizeOutcome {
        self.sessions.remove(session.id);
        let placement = placement_for(session.flow());
        let state = session.take_state();
        match error_redirect(session.redirect_uri().uri(), placement, err, state.as_deref()) {
            Ok(uri) => AuthorizeOutcome::Redirect(uri),
            Err(err) => error_page(&err),
        }
    }

    /// Applies the resource owner's consent decision and finishes the flow.
    ///
    /// The session is consumed atomically up front, so a double-submit of
    /// the consent form finalizes the flow at most once.
    pub async fn decide(&self, session_id: Uuid, decision: ConsentDecision) -> AuthorizeOutcome {
        let Some(mut session) = self.sessions.consume(session_id) else {
            return error_page(&AuthError::invalid_request(
                "Unknown or already finalized authorization session.",
            ));
        };

        let uri = session.redirect_uri().uri().to_string();
        let state = session.take_state();
        let placement = placement_for(session.flow());

        if let Err(err) = session.touch(self.sessions.timeout()) {
            info!(session_id = %session.id, "authorization session timed out at consent");
            return self.redirect_or_page(&uri, placement, &err, state.as_deref());
        }

        let Some(flow) = session.flow() else {
            return error_page(&AuthError::internal(
                "consent decided before a flow was established",
            ));
        };

        match decision {
            ConsentDecision::Reject => {
                info!(session_id = %session.id, client_id = %session.client_id, "authorization rejected");
                self.redirect_or_page(
                    &uri,
                    placement,
                    &AuthError::access_denied("The user rejected the authorization request."),
                    state.as_deref(),
                )
            }
            ConsentDecision::Accept { granted_scope } => {
                match self.issue(session, flow, granted_scope, state.as_deref()).await {
                    Ok(uri) => AuthorizeOutcome::Redirect(uri),
                    Err(err) => self.redirect_or_page(&uri, placement, &err, state.as_deref()),
                }
            }
        }
    }

    async fn issue(
        &self,
        mut session: AuthorizationSession,
        flow: ResponseType,
        granted: ScopeSet,
        state: Option<&str>,
    ) -> AuthResult<String> {
        let owner = session
            .scope_owner
            .clone()
            .ok_or_else(|| AuthError::internal("consent decided before the owner logged in"))?;
        let requested = session.requested_scope.clone();
        let uri = session.redirect_uri().uri().to_string();
        session.granted_scope = Some(granted.clone());

        match flow {
            ResponseType::Code => {
                let client_id = session.client_id.clone();
                let code = self.tokens.store_session(session).await?;
                info!(client_id, owner, "issued authorization code");
                code_redirect(&uri, &code, state)
            }
            ResponseType::Token => {
                let client = self
                    .clients
                    .find_by_id(&session.client_id)
                    .await?
                    .ok_or_else(|| AuthError::internal("session refers to an unknown client"))?;
                let token = self.tokens.generate_token(&client, &owner, granted).await?;
                info!(client_id = %client.client_id, owner, "issued implicit access token");

                // scope is echoed only when it differs from the request.
                let scope = (!token.scope.is_identical(&requested)).then_some(&token.scope);
                token_redirect(
                    &uri,
                    &token.access_token,
                    &token.token_type,
                    token.expires_in,
                    scope,
                    state,
                )
            }
        }
    }

    fn redirect_or_page(
        &self,
        uri: &str,
        placement: ParameterPlacement,
        err: &AuthError,
        state: Option<&str>,
    ) -> AuthorizeOutcome {
        match error_redirect(uri, placement, err, state) {
            Ok(uri) => AuthorizeOutcome::Redirect(uri),
            Err(err) => error_page(&err),
        }
    }
}
