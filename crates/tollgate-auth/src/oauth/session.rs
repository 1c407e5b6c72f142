//! Authorization flow sessions.
//!
//! An [`AuthorizationSession`] tracks one in-progress three-legged
//! authorization negotiation between the first authorization request and
//! the final code or token issuance. The flow suspends whenever control
//! returns to the user's browser (login, consent); the externalized state
//! lives in the process-wide [`SessionRegistry`], keyed by an unguessable
//! id that the transport layer correlates however it prefers (typically a
//! cookie).
//!
//! # Lifecycle
//!
//! 1. Created when an authorization request arrives without a usable
//!    session.
//! 2. Looked up by id on every subsequent request in the flow; each access
//!    refreshes the inactivity deadline or fails with a timeout.
//! 3. Consumed (removed) exactly once on completion, rejection, or timeout.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::redirect::RedirectionUri;
use crate::scope::ScopeSet;
use crate::types::ResponseType;

/// State of one pending authorization negotiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationSession {
    /// Unguessable session identifier, used as the correlation key.
    pub id: Uuid,

    /// The client that initiated the flow.
    pub client_id: String,

    /// The flow being executed; set exactly once, before any scope decision.
    flow: Option<ResponseType>,

    /// Scope requested by the client.
    pub requested_scope: ScopeSet,

    /// Scope granted by the resource owner; set once the user decides.
    /// The server MAY grant a narrower set than requested; this layer does
    /// not constrain the relationship.
    pub granted_scope: Option<ScopeSet>,

    /// The verified redirection URI; immutable after creation.
    redirect_uri: RedirectionUri,

    /// One-time CSRF token echoed back to the client, cleared after use.
    state: Option<String>,

    /// The authenticated resource owner; `None` until login completes.
    pub scope_owner: Option<String>,

    /// Timestamp of the most recent access, for the inactivity deadline.
    #[serde(with = "time::serde::rfc3339")]
    last_activity: OffsetDateTime,
}

impl AuthorizationSession {
    /// Creates a new session bound to a verified redirection URI.
    #[must_use]
    pub fn new(client_id: impl Into<String>, redirect_uri: RedirectionUri) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id: client_id.into(),
            flow: None,
            requested_scope: ScopeSet::new(),
            granted_scope: None,
            redirect_uri,
            state: None,
            scope_owner: None,
            last_activity: OffsetDateTime::now_utc(),
        }
    }

    /// Returns the flow established for this session, if any.
    #[must_use]
    pub fn flow(&self) -> Option<ResponseType> {
        self.flow
    }

    /// Establishes the flow for this session.
    ///
    /// # Errors
    ///
    /// The flow is set exactly once; changing it afterwards is an internal
    /// error.
    pub fn set_flow(&mut self, flow: ResponseType) -> AuthResult<()> {
        match self.flow {
            None => {
                self.flow = Some(flow);
                Ok(())
            }
            Some(existing) if existing == flow => Ok(()),
            Some(_) => Err(AuthError::internal(
                "the authorization flow of a session cannot be changed",
            )),
        }
    }

    /// Returns the verified redirection URI.
    #[must_use]
    pub fn redirect_uri(&self) -> &RedirectionUri {
        &self.redirect_uri
    }

    /// Stores the client's CSRF state for later echo.
    pub fn set_state(&mut self, state: impl Into<String>) {
        self.state = Some(state.into());
    }

    /// Takes the CSRF state, clearing it on the session (one-time use).
    pub fn take_state(&mut self) -> Option<String> {
        self.state.take()
    }

    /// Returns the CSRF state without consuming it.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Refreshes the inactivity deadline.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::SessionExpired`] if the session has been
    /// inactive longer than `timeout`; the caller must then treat the
    /// session as terminal.
    pub fn touch(&mut self, timeout: time::Duration) -> AuthResult<()> {
        let now = OffsetDateTime::now_utc();
        if now - self.last_activity > timeout {
            return Err(AuthError::SessionExpired);
        }
        self.last_activity = now;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn backdate(&mut self, by: time::Duration) {
        self.last_activity -= by;
    }
}

/// Process-wide store of in-progress authorization sessions.
///
/// The map supports concurrent insert, lookup, and removal from independent
/// request-handling tasks. Per-session mutation is last-writer-wins (a
/// browser-driven flow is effectively sequential), but the terminal
/// transition goes through [`SessionRegistry::consume`], an atomic remove,
/// so a session can be finalized at most once even under a double-submit.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, AuthorizationSession>,
    timeout: time::Duration,
}

impl SessionRegistry {
    /// Creates a registry with the given inactivity timeout.
    #[must_use]
    pub fn new(timeout: time::Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            timeout,
        }
    }

    /// Returns the configured inactivity timeout.
    #[must_use]
    pub fn timeout(&self) -> time::Duration {
        self.timeout
    }

    /// Creates and stores a new session, returning a working copy.
    ///
    /// Abandoned sessions (suspended at login or consent and never
    /// resumed) are swept out here, so the registry stays bounded by the
    /// number of flows started within one timeout window.
    #[must_use]
    pub fn create(
        &self,
        client_id: &str,
        redirect_uri: RedirectionUri,
    ) -> AuthorizationSession {
        self.purge_expired();
        let session = AuthorizationSession::new(client_id, redirect_uri);
        self.sessions.insert(session.id, session.clone());
        session
    }

    /// Drops every session past its inactivity deadline.
    pub fn purge_expired(&self) {
        let now = OffsetDateTime::now_utc();
        self.sessions
            .retain(|_, session| now - session.last_activity <= self.timeout);
    }

    /// Looks up a session and refreshes its inactivity deadline.
    ///
    /// Returns `Ok(None)` for an unknown id (stale correlation cookie).
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::SessionExpired`] if the session exists but
    /// has timed out; the session is removed as a side effect.
    pub fn access(&self, id: Uuid) -> AuthResult<Option<AuthorizationSession>> {
        let Some(mut entry) = self.sessions.get_mut(&id) else {
            return Ok(None);
        };
        match entry.touch(self.timeout) {
            Ok(()) => Ok(Some(entry.clone())),
            Err(err) => {
                drop(entry);
                self.sessions.remove(&id);
                Err(err)
            }
        }
    }

    /// Writes back a mutated working copy (last writer wins).
    pub fn update(&self, session: AuthorizationSession) {
        self.sessions.insert(session.id, session);
    }

    /// Atomically removes a session for final issuance.
    ///
    /// Exactly one caller observes the session; a concurrent double-submit
    /// gets `None` and must fail the duplicate request.
    #[must_use]
    pub fn consume(&self, id: Uuid) -> Option<AuthorizationSession> {
        self.sessions.remove(&id).map(|(_, session)| session)
    }

    /// Removes a session without consuming it for issuance.
    pub fn remove(&self, id: Uuid) {
        self.sessions.remove(&id);
    }

    /// Number of sessions currently in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no session is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_uri() -> RedirectionUri {
        RedirectionUri::resolve(None, &["https://app.example/cb".to_string()]).unwrap()
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::new(time::Duration::seconds(600))
    }

    #[test]
    fn flow_set_exactly_once() {
        let mut session = AuthorizationSession::new("abc", static_uri());
        assert!(session.flow().is_none());
        session.set_flow(ResponseType::Code).unwrap();
        assert_eq!(session.flow(), Some(ResponseType::Code));

        // Re-setting the same flow is a no-op; changing it is an error.
        session.set_flow(ResponseType::Code).unwrap();
        assert!(session.set_flow(ResponseType::Token).is_err());
    }

    #[test]
    fn state_is_one_time() {
        let mut session = AuthorizationSession::new("abc", static_uri());
        session.set_state("xyz");
        assert_eq!(session.state(), Some("xyz"));
        assert_eq!(session.take_state().as_deref(), Some("xyz"));
        assert!(session.take_state().is_none());
    }

    #[test]
    fn touch_within_deadline_succeeds() {
        let mut session = AuthorizationSession::new("abc", static_uri());
        assert!(session.touch(time::Duration::seconds(600)).is_ok());
    }

    #[test]
    fn touch_past_deadline_fails() {
        let mut session = AuthorizationSession::new("abc", static_uri());
        session.backdate(time::Duration::seconds(700));
        let err = session.touch(time::Duration::seconds(600)).unwrap_err();
        assert!(matches!(err, AuthError::SessionExpired));
    }

    #[test]
    fn registry_create_and_access() {
        let registry = registry();
        let session = registry.create("abc", static_uri());
        let found = registry.access(session.id).unwrap().unwrap();
        assert_eq!(found.client_id, "abc");
    }

    #[test]
    fn registry_access_unknown_id() {
        let registry = registry();
        assert!(registry.access(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn registry_access_expired_removes_session() {
        let registry = SessionRegistry::new(time::Duration::seconds(1));
        let mut session = registry.create("abc", static_uri());
        session.backdate(time::Duration::seconds(5));
        registry.update(session.clone());

        let err = registry.access(session.id).unwrap_err();
        assert!(matches!(err, AuthError::SessionExpired));
        assert!(registry.access(session.id).unwrap().is_none());
    }

    #[test]
    fn abandoned_sessions_are_purged_on_create() {
        let registry = SessionRegistry::new(time::Duration::seconds(1));
        let mut stale = registry.create("abc", static_uri());
        stale.backdate(time::Duration::seconds(5));
        registry.update(stale.clone());

        // The next flow's create sweeps the abandoned entry out.
        let live = registry.create("abc", static_uri());
        assert_eq!(registry.len(), 1);
        assert!(registry.access(stale.id).unwrap().is_none());
        assert!(registry.access(live.id).unwrap().is_some());
    }

    #[test]
    fn purge_keeps_live_sessions() {
        let registry = SessionRegistry::new(time::Duration::seconds(600));
        let session = registry.create("abc", static_uri());
        registry.purge_expired();
        assert!(registry.access(session.id).unwrap().is_some());
    }

    #[test]
    fn registry_consume_is_single_shot() {
        let registry = registry();
        let session = registry.create("abc", static_uri());
        assert!(registry.consume(session.id).is_some());
        assert!(registry.consume(session.id).is_none());
    }

    #[test]
    fn registry_update_overwrites() {
        let registry = registry();
        let mut session = registry.create("abc", static_uri());
        session.scope_owner = Some("alice".to_string());
        registry.update(session.clone());

        let found = registry.access(session.id).unwrap().unwrap();
        assert_eq!(found.scope_owner.as_deref(), Some("alice"));
    }

    #[test]
    fn session_serde_round_trip() {
        let mut session = AuthorizationSession::new("abc", static_uri());
        session.set_flow(ResponseType::Code).unwrap();
        session.requested_scope = ScopeSet::parse("read write");
        session.set_state("s1");

        let json = serde_json::to_string(&session).unwrap();
        let parsed: AuthorizationSession = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, session.id);
        assert_eq!(parsed.flow(), Some(ResponseType::Code));
        assert_eq!(parsed.state(), Some("s1"));
        assert!(parsed.requested_scope.is_identical(&session.requested_scope));
    }
}
