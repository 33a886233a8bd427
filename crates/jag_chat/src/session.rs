//! Session provider seam.
//!
//! The identity provider owns login and token refresh. The chat client only
//! reads the current session and asks the provider to sign in or out.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ChatError, ChatResult};

/// Authentication status of a session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Loading,
    Unauthenticated,
    Authenticated,
}

/// Display-only profile of the signed-in user
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

impl UserProfile {
    /// Best available label for the user.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .or(self.sub.as_deref())
            .unwrap_or("user")
    }
}

/// Snapshot of the session as seen by the chat client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub status: SessionStatus,
    #[serde(rename = "idToken", skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default)]
    pub profile: UserProfile,
}

impl Session {
    pub fn authenticated(id_token: impl Into<String>, profile: UserProfile) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            id_token: Some(id_token.into()),
            profile,
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            status: SessionStatus::Unauthenticated,
            id_token: None,
            profile: UserProfile::default(),
        }
    }

    pub fn loading() -> Self {
        Self {
            status: SessionStatus::Loading,
            id_token: None,
            profile: UserProfile::default(),
        }
    }

    /// Bearer credential, present only for an authenticated session.
    pub fn bearer(&self) -> Option<&str> {
        match self.status {
            SessionStatus::Authenticated => self.id_token.as_deref().filter(|t| !t.is_empty()),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer().is_some()
    }
}

/// Source of authentication state for the chat client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Current session snapshot.
    fn session(&self) -> Session;

    /// Start sign-in with the named identity provider.
    async fn sign_in(&self, provider: &str) -> ChatResult<()>;

    /// End the current session.
    async fn sign_out(&self) -> ChatResult<()>;
}

/// In-process session seeded with a pre-issued ID token.
///
/// Used by the CLI, where login happens out of band and the token is passed
/// in through a flag or the environment.
pub struct StaticSession {
    id_token: Option<String>,
    profile: UserProfile,
    current: RwLock<Session>,
}

impl StaticSession {
    /// Create a session; authenticated right away when a token is given.
    pub fn new(id_token: Option<String>, profile: UserProfile) -> Self {
        let id_token = id_token.filter(|t| !t.trim().is_empty());
        let current = match &id_token {
            Some(token) => Session::authenticated(token.clone(), profile.clone()),
            None => Session::unauthenticated(),
        };

        Self {
            id_token,
            profile,
            current: RwLock::new(current),
        }
    }

    /// Create a session with no credential.
    pub fn signed_out() -> Self {
        Self::new(None, UserProfile::default())
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    fn session(&self) -> Session {
        self.current.read().clone()
    }

    async fn sign_in(&self, provider: &str) -> ChatResult<()> {
        let token = self
            .id_token
            .clone()
            .ok_or_else(|| ChatError::SignInUnavailable {
                provider: provider.to_string(),
                reason: "no ID token configured (set JAG_ID_TOKEN)".to_string(),
            })?;

        *self.current.write() = Session::authenticated(token, self.profile.clone());
        info!("Signed in via {} as {}", provider, self.profile.display_name());
        Ok(())
    }

    async fn sign_out(&self) -> ChatResult<()> {
        *self.current.write() = Session::unauthenticated();
        info!("Signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sarah() -> UserProfile {
        UserProfile {
            email: Some("sarah@progear.example".to_string()),
            name: Some("Sarah".to_string()),
            sub: Some("00u1sarah".to_string()),
        }
    }

    #[test]
    fn test_bearer_only_when_authenticated() {
        assert_eq!(Session::authenticated("tok", sarah()).bearer(), Some("tok"));
        assert_eq!(Session::unauthenticated().bearer(), None);
        assert_eq!(Session::loading().bearer(), None);

        let mut empty = Session::authenticated("", sarah());
        assert!(!empty.is_authenticated());
        empty.id_token = None;
        assert!(!empty.is_authenticated());
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(sarah().display_name(), "Sarah");
        let email_only = UserProfile {
            email: Some("sam@progear.example".to_string()),
            ..UserProfile::default()
        };
        assert_eq!(email_only.display_name(), "sam@progear.example");
        assert_eq!(UserProfile::default().display_name(), "user");
    }

    #[tokio::test]
    async fn test_static_session_sign_out_and_in() {
        let provider = StaticSession::new(Some("id-token".to_string()), sarah());
        assert!(provider.session().is_authenticated());

        provider.sign_out().await.unwrap();
        assert_eq!(provider.session().status, SessionStatus::Unauthenticated);

        provider.sign_in("okta").await.unwrap();
        assert_eq!(provider.session().bearer(), Some("id-token"));
        assert_eq!(provider.session().profile.name.as_deref(), Some("Sarah"));
    }

    #[tokio::test]
    async fn test_sign_in_without_token_fails() {
        let provider = StaticSession::new(Some("   ".to_string()), sarah());
        assert!(!provider.session().is_authenticated());

        let err = provider.sign_in("okta").await.unwrap_err();
        assert!(matches!(err, ChatError::SignInUnavailable { .. }));
        assert!(!provider.session().is_authenticated());
    }
}
