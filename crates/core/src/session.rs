//! Authenticated-session context shared by every flow that needs a user.
//!
//! The session is an explicit value handed to each flow at startup. The
//! identity provider pushes changes through `apply_auth_event`; interested
//! parties hold a `watch::Receiver` from `subscribe`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("you must be logged in")]
    NotAuthenticated,
    #[error("identity provider: {0}")]
    Identity(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionContext {
    pub fn new(initial: Option<Session>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    pub fn replace(&self, session: Option<Session>) {
        self.tx.send_replace(session);
    }

    pub fn apply_auth_event(&self, event: AuthEvent) {
        debug!(?event, "auth event");
        match event {
            AuthEvent::SignedIn(s) | AuthEvent::TokenRefreshed(s) => self.replace(Some(s)),
            AuthEvent::SignedOut => self.replace(None),
        }
    }

    pub fn require_user(&self) -> Result<String, SessionError> {
        self.tx
            .borrow()
            .as_ref()
            .map(|s| s.user_id.clone())
            .ok_or(SessionError::NotAuthenticated)
    }
}

/// The hosted identity service as seen by the client.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Session restored from the provider's own persistence, if any.
    async fn current_session(&self) -> Result<Option<Session>, SessionError>;
    async fn profile_exists(&self, user_id: &str) -> Result<bool, SessionError>;
    async fn sign_out(&self) -> Result<(), SessionError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Authenticated(Session),
    Unauthenticated,
}

pub struct AuthGate;

impl AuthGate {
    /// Startup check. A session whose user has no profile is signed out.
    pub async fn check(
        identity: &dyn IdentityProvider,
        context: &SessionContext,
    ) -> Result<GateDecision, SessionError> {
        let decision = match identity.current_session().await? {
            Some(session) => {
                if identity.profile_exists(&session.user_id).await? {
                    GateDecision::Authenticated(session)
                } else {
                    info!(user = %session.user_id, "session has no profile, signing out");
                    identity.sign_out().await?;
                    GateDecision::Unauthenticated
                }
            }
            None => GateDecision::Unauthenticated,
        };
        match &decision {
            GateDecision::Authenticated(s) => context.replace(Some(s.clone())),
            GateDecision::Unauthenticated => context.replace(None),
        }
        Ok(decision)
    }
}
