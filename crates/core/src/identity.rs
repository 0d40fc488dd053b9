//! # Local Identity
//!
//! Current-user identity with sign-in/out and change notifications. The
//! hosted identity provider is out of scope; the shipped implementation
//! simulates a signed-in development user, matching the original setup.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// The signed-in user, or what we know about them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: String,
}

impl UserProfile {
    /// Fixed development profile used by the mock provider.
    pub fn dev_user() -> Self {
        Self {
            uid: "mock-user-id".to_string(),
            email: "dev@asynaptix.com".to_string(),
            display_name: "Dev User".to_string(),
            photo_url: "https://picsum.photos/100/100".to_string(),
        }
    }
}

/// Supplies the current user and login/logout operations.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<UserProfile>;
    fn sign_in(&self) -> Result<UserProfile>;
    fn sign_out(&self);
    /// Change feed; receivers observe every sign-in/out.
    fn watch(&self) -> watch::Receiver<Option<UserProfile>>;
}

/// Simulated identity provider with a fixed profile.
pub struct MockIdentity {
    tx: watch::Sender<Option<UserProfile>>,
}

impl MockIdentity {
    /// Starts signed in, matching the original development setup.
    pub fn signed_in() -> Self {
        let (tx, _rx) = watch::channel(Some(UserProfile::dev_user()));
        Self { tx }
    }

    pub fn signed_out() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }
}

impl IdentityProvider for MockIdentity {
    fn current_user(&self) -> Option<UserProfile> {
        self.tx.borrow().clone()
    }

    fn sign_in(&self) -> Result<UserProfile> {
        let user = UserProfile::dev_user();
        self.tx.send_replace(Some(user.clone()));
        tracing::info!("simulated sign-in for {}", user.email);
        Ok(user)
    }

    fn sign_out(&self) {
        tracing::info!("simulated sign-out");
        self.tx.send_replace(None);
    }

    fn watch(&self) -> watch::Receiver<Option<UserProfile>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_out_clears_current_user() {
        let identity = MockIdentity::signed_in();
        assert!(identity.current_user().is_some());

        identity.sign_out();
        assert!(identity.current_user().is_none());

        identity.sign_in().unwrap();
        assert_eq!(identity.current_user().unwrap().uid, "mock-user-id");
    }

    #[tokio::test]
    async fn test_watchers_observe_changes() {
        let identity = MockIdentity::signed_out();
        let mut rx = identity.watch();
        assert!(rx.borrow().is_none());

        identity.sign_in().unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_some());
    }
}
