//! Provider traits and implementations.
//!
//! All external dependencies of the session layer are abstracted behind
//! traits and injected via [`crate::environment::AuthEnvironment`]:
//!
//! - [`IdentityProvider`] — hosted identity service (sessions, credentials)
//! - [`ProfileStore`] — profile rows in the hosted data service
//! - [`RateProvider`] — exchange-rate API
//!
//! Production implementations live in [`rest`] and [`openrates`]; the
//! [`unavailable`] implementations back the degraded mode selected when
//! service configuration is missing.

mod identity;
mod profile;
mod rates;

pub mod openrates;
pub mod rest;
pub mod unavailable;

pub use identity::IdentityProvider;
pub use profile::ProfileStore;
pub use rates::RateProvider;

use crate::actions::{AuthChange, ProfileUpdate};
use crate::error::Result;
use crate::state::{Profile, Session, User, UserId};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

/// Identity provider selected at startup from the service configuration.
#[derive(Clone)]
pub enum ClientIdentity {
    /// Configured: the hosted identity service.
    Rest(rest::RestIdentityProvider),

    /// Unconfigured: every call fails with `ServiceUnavailable`.
    Unavailable(unavailable::UnavailableIdentityProvider),
}

impl IdentityProvider for ClientIdentity {
    async fn probe(&self) -> Result<()> {
        match self {
            Self::Rest(p) => p.probe().await,
            Self::Unavailable(p) => p.probe().await,
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User> {
        match self {
            Self::Rest(p) => p.sign_up(email, password).await,
            Self::Unavailable(p) => p.sign_up(email, password).await,
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        match self {
            Self::Rest(p) => p.sign_in_with_password(email, password).await,
            Self::Unavailable(p) => p.sign_in_with_password(email, password).await,
        }
    }

    async fn sign_out(&self) -> Result<()> {
        match self {
            Self::Rest(p) => p.sign_out().await,
            Self::Unavailable(p) => p.sign_out().await,
        }
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        match self {
            Self::Rest(p) => p.get_session().await,
            Self::Unavailable(p) => p.get_session().await,
        }
    }

    async fn refresh_session(&self) -> Result<Option<Session>> {
        match self {
            Self::Rest(p) => p.refresh_session().await,
            Self::Unavailable(p) => p.refresh_session().await,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        match self {
            Self::Rest(p) => p.subscribe(),
            Self::Unavailable(p) => p.subscribe(),
        }
    }
}

/// Profile store selected at startup from the service configuration.
#[derive(Clone)]
pub enum ClientProfiles {
    /// Configured: the hosted data service.
    Rest(rest::RestProfileStore),

    /// Unconfigured: every call fails with `ServiceUnavailable`.
    Unavailable(unavailable::UnavailableProfileStore),
}

impl ProfileStore for ClientProfiles {
    async fn fetch(&self, id: UserId) -> Result<Profile> {
        match self {
            Self::Rest(p) => p.fetch(id).await,
            Self::Unavailable(p) => p.fetch(id).await,
        }
    }

    async fn insert(&self, profile: Profile) -> Result<Profile> {
        match self {
            Self::Rest(p) => p.insert(profile).await,
            Self::Unavailable(p) => p.insert(profile).await,
        }
    }

    async fn update(
        &self,
        id: UserId,
        patch: ProfileUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Profile> {
        match self {
            Self::Rest(p) => p.update(id, patch, updated_at).await,
            Self::Unavailable(p) => p.update(id, patch, updated_at).await,
        }
    }
}
