//! Identity provider boundary
//!
//! Token issuance and refresh belong to the hosted identity provider. The
//! client only needs to know whether a session exists and which bearer token
//! to attach to backend calls.

pub mod hosted_ui;
pub mod session;

pub use hosted_ui::HostedUi;
pub use session::{AuthError, AuthSession, AuthState};

use async_trait::async_trait;

/// Source of the bearer token attached to every backend request.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token, or `None` when signed out
    async fn access_token(&self) -> Option<String>;

    /// Authenticated means a non-empty token is available
    async fn is_authenticated(&self) -> bool {
        self.access_token().await.is_some()
    }

    /// Display name of the signed-in user, when the provider knows it
    async fn current_user(&self) -> Option<String> {
        None
    }
}

/// Token handed in from configuration or the environment.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
    user: Option<String>,
}

impl StaticTokenProvider {
    /// Blank tokens count as absent
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
            user: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Option<String> {
        self.token.clone()
    }

    async fn current_user(&self) -> Option<String> {
        self.user.clone()
    }
}
