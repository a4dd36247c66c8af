//! Hosted sign-in / sign-out URLs of the identity provider

use serde::Deserialize;

/// Authorization-code flow endpoints of the hosted identity UI.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct HostedUi {
    /// Provider domain, e.g. "https://tenant.auth.example.com"
    pub domain: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub logout_uri: String,
}

impl HostedUi {
    /// Everything needed to build a login URL is present
    pub fn is_configured(&self) -> bool {
        !self.domain.is_empty() && !self.client_id.is_empty() && !self.redirect_uri.is_empty()
    }

    pub fn login_url(&self) -> String {
        format!(
            "{}/login?client_id={}&response_type=code&scope=email+openid+profile&redirect_uri={}",
            self.domain.trim_end_matches('/'),
            self.client_id,
            urlencoding::encode(&self.redirect_uri)
        )
    }

    pub fn logout_url(&self) -> String {
        format!(
            "{}/logout?client_id={}&logout_uri={}",
            self.domain.trim_end_matches('/'),
            self.client_id,
            urlencoding::encode(&self.logout_uri)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui() -> HostedUi {
        HostedUi {
            domain: "https://auth.example.com/".into(),
            client_id: "client-123".into(),
            redirect_uri: "http://localhost:5173/callback".into(),
            logout_uri: "http://localhost:5173".into(),
        }
    }

    #[test]
    fn test_login_url() {
        assert_eq!(
            ui().login_url(),
            "https://auth.example.com/login?client_id=client-123&response_type=code\
             &scope=email+openid+profile&redirect_uri=http%3A%2F%2Flocalhost%3A5173%2Fcallback"
        );
    }

    #[test]
    fn test_logout_url() {
        assert_eq!(
            ui().logout_url(),
            "https://auth.example.com/logout?client_id=client-123\
             &logout_uri=http%3A%2F%2Flocalhost%3A5173"
        );
    }

    #[test]
    fn test_is_configured() {
        assert!(ui().is_configured());
        assert!(!HostedUi::default().is_configured());
    }
}
