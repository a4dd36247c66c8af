//! Session state: loading → authenticated | anonymous

use super::TokenProvider;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// The provider has not answered yet
    Loading,
    Authenticated {
        user: Option<String>,
        access_token: String,
    },
    Anonymous,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Session check still pending")]
    Pending,
    /// Not recoverable here; the caller sends the user to the sign-in entry point
    #[error("Not authenticated")]
    NotAuthenticated,
}

/// Observable authentication state shared by everything that needs a token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    state: watch::Sender<AuthState>,
}

impl AuthSession {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self { state }
    }

    /// Ask the provider for the current session and settle the state.
    ///
    /// Any provider failure shows up as an absent token and ends in
    /// `Anonymous`.
    pub async fn load(&self, provider: &dyn TokenProvider) -> AuthState {
        let next = match provider.access_token().await {
            Some(access_token) => AuthState::Authenticated {
                user: provider.current_user().await,
                access_token,
            },
            None => AuthState::Anonymous,
        };
        match &next {
            AuthState::Authenticated { user, .. } => {
                info!(user = user.as_deref().unwrap_or("-"), "Session loaded")
            }
            _ => debug!("No active session"),
        }
        self.state.send_replace(next.clone());
        next
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.state.borrow(), AuthState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state.borrow(), AuthState::Authenticated { .. })
    }

    /// Gate for anything that requires a signed-in user
    pub fn require(&self) -> Result<String, AuthError> {
        match &*self.state.borrow() {
            AuthState::Authenticated { access_token, .. } => Ok(access_token.clone()),
            AuthState::Loading => Err(AuthError::Pending),
            AuthState::Anonymous => Err(AuthError::NotAuthenticated),
        }
    }

    pub fn sign_out(&self) {
        self.state.send_replace(AuthState::Anonymous);
        info!("Signed out");
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}
