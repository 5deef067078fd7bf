//! Profile store trait.

use crate::actions::ProfileUpdate;
use crate::error::Result;
use crate::state::{Profile, UserId};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Profile row operations against the hosted data service.
///
/// At most one row exists per user id.
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile row for a user.
    ///
    /// Fails with [`crate::error::AuthError::ProfileNotFound`] when no
    /// row exists.
    fn fetch(&self, id: UserId) -> impl Future<Output = Result<Profile>> + Send;

    /// Insert a new profile row.
    ///
    /// Timestamps are synthesized by the caller; the service stores them
    /// as given.
    fn insert(&self, profile: Profile) -> impl Future<Output = Result<Profile>> + Send;

    /// Patch an existing profile row.
    fn update(
        &self,
        id: UserId,
        patch: ProfileUpdate,
        updated_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Profile>> + Send;
}
