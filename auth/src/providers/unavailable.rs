//! Degraded-mode providers.
//!
//! Selected when service configuration is missing (see
//! [`crate::config::ServiceConfig::from_env`]). The client still starts
//! and renders; every identity and profile operation fails immediately
//! with [`AuthError::ServiceUnavailable`], which the bootstrap reducer
//! surfaces as an unauthenticated, non-erroring state.

use crate::actions::{AuthChange, ProfileUpdate};
use crate::error::{AuthError, Result};
use crate::providers::{IdentityProvider, ProfileStore};
use crate::state::{Profile, Session, User, UserId};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Identity provider for the unconfigured client.
#[derive(Clone)]
pub struct UnavailableIdentityProvider {
    // Held so subscribers see a silent channel instead of an immediate
    // close.
    changes: Arc<broadcast::Sender<AuthChange>>,
}

impl UnavailableIdentityProvider {
    /// Create the provider.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(1);
        Self {
            changes: Arc::new(changes),
        }
    }
}

impl Default for UnavailableIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for UnavailableIdentityProvider {
    async fn probe(&self) -> Result<()> {
        Err(AuthError::ServiceUnavailable)
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<User> {
        Err(AuthError::ServiceUnavailable)
    }

    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> Result<Session> {
        Err(AuthError::ServiceUnavailable)
    }

    async fn sign_out(&self) -> Result<()> {
        // Nothing to revoke; signing out of nothing succeeds.
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(None)
    }

    async fn refresh_session(&self) -> Result<Option<Session>> {
        Ok(None)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }
}

/// Profile store for the unconfigured client.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableProfileStore;

impl ProfileStore for UnavailableProfileStore {
    async fn fetch(&self, _id: UserId) -> Result<Profile> {
        Err(AuthError::ServiceUnavailable)
    }

    async fn insert(&self, _profile: Profile) -> Result<Profile> {
        Err(AuthError::ServiceUnavailable)
    }

    async fn update(
        &self,
        _id: UserId,
        _patch: ProfileUpdate,
        _updated_at: DateTime<Utc>,
    ) -> Result<Profile> {
        Err(AuthError::ServiceUnavailable)
    }
}
