//! Mock profile store.

use crate::actions::ProfileUpdate;
use crate::error::{AuthError, Result};
use crate::providers::ProfileStore;
use crate::state::{Profile, UserId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Default)]
struct Inner {
    profiles: HashMap<UserId, Profile>,
    fetch_error: Option<AuthError>,
    insert_error: Option<AuthError>,
    update_error: Option<AuthError>,
    fetch_count: usize,
}

/// In-memory profile store.
#[derive(Clone, Default)]
pub struct MockProfileStore {
    inner: Arc<Mutex<Inner>>,
}

impl MockProfileStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed an existing profile row.
    pub fn insert_existing(&self, profile: Profile) {
        self.lock().profiles.insert(profile.id, profile);
    }

    /// Make fetches fail with the given error.
    pub fn fail_fetch(&self, error: AuthError) {
        self.lock().fetch_error = Some(error);
    }

    /// Make inserts fail with the given error.
    pub fn fail_insert(&self, error: AuthError) {
        self.lock().insert_error = Some(error);
    }

    /// Make updates fail with the given error.
    pub fn fail_update(&self, error: AuthError) {
        self.lock().update_error = Some(error);
    }

    /// How many fetches have been issued.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.lock().fetch_count
    }
}

impl ProfileStore for MockProfileStore {
    async fn fetch(&self, id: UserId) -> Result<Profile> {
        let mut inner = self.lock();
        inner.fetch_count += 1;
        if let Some(error) = inner.fetch_error.clone() {
            return Err(error);
        }
        inner
            .profiles
            .get(&id)
            .cloned()
            .ok_or(AuthError::ProfileNotFound)
    }

    async fn insert(&self, profile: Profile) -> Result<Profile> {
        let mut inner = self.lock();
        if let Some(error) = inner.insert_error.clone() {
            return Err(error);
        }
        if inner.profiles.contains_key(&profile.id) {
            return Err(AuthError::ProfileQuery(
                "duplicate key value violates unique constraint".to_string(),
            ));
        }
        inner.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn update(
        &self,
        id: UserId,
        patch: ProfileUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Profile> {
        let mut inner = self.lock();
        if let Some(error) = inner.update_error.clone() {
            return Err(error);
        }
        let profile = inner
            .profiles
            .get_mut(&id)
            .ok_or(AuthError::ProfileNotFound)?;
        if let Some(username) = patch.username {
            profile.username = username;
        }
        if let Some(alias) = patch.alias {
            profile.alias = alias;
        }
        if let Some(age) = patch.age {
            profile.age = age;
        }
        profile.updated_at = updated_at;
        Ok(profile.clone())
    }
}
