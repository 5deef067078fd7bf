//! Mock identity provider.

use crate::actions::AuthChange;
use crate::error::{AuthError, Result};
use crate::providers::IdentityProvider;
use crate::state::{Session, User, UserId};
use chrono::{Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

#[derive(Default)]
struct Inner {
    /// email → (password, user)
    users: HashMap<String, (String, User)>,
    session: Option<Session>,
    /// Scripted probe results; once drained the probe succeeds.
    probe_results: VecDeque<Result<()>>,
    probe_hangs: bool,
    refresh_error: Option<AuthError>,
}

/// In-memory identity provider.
///
/// Pushes [`AuthChange`] events on sign-in, sign-out, and refresh, the
/// way the hosted service does.
#[derive(Clone)]
pub struct MockIdentityProvider {
    inner: Arc<Mutex<Inner>>,
    changes: broadcast::Sender<AuthChange>,
}

impl MockIdentityProvider {
    /// A healthy provider with no users and no session.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            changes,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pre-register an account.
    pub fn register_user(&self, email: &str, password: &str) -> User {
        let user = User {
            id: UserId::new(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        self.lock()
            .users
            .insert(email.to_string(), (password.to_string(), user.clone()));
        user
    }

    /// Seed a stored session, as if the user signed in previously.
    pub fn set_session(&self, session: Session) {
        self.lock().session = Some(session);
    }

    /// Script the next probe results, in order.
    pub fn queue_probe_result(&self, result: Result<()>) {
        self.lock().probe_results.push_back(result);
    }

    /// Make every probe hang forever. Used for timeout scenarios.
    pub fn hang_probe(&self) {
        self.lock().probe_hangs = true;
    }

    /// Make session refresh fail with the given error.
    pub fn fail_refresh(&self, error: AuthError) {
        self.lock().refresh_error = Some(error);
    }

    /// The currently stored session.
    #[must_use]
    pub fn current_session(&self) -> Option<Session> {
        self.lock().session.clone()
    }

    fn make_session(user: User) -> Session {
        Session {
            user,
            access_token: format!("mock-access-{}", uuid::Uuid::new_v4()),
            refresh_token: format!("mock-refresh-{}", uuid::Uuid::new_v4()),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for MockIdentityProvider {
    async fn probe(&self) -> Result<()> {
        let scripted = {
            let mut inner = self.lock();
            if inner.probe_hangs {
                None
            } else {
                Some(inner.probe_results.pop_front().unwrap_or(Ok(())))
            }
        };
        match scripted {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User> {
        let mut inner = self.lock();
        if inner.users.contains_key(email) {
            return Err(AuthError::AlreadyRegistered);
        }
        let user = User {
            id: UserId::new(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        inner
            .users
            .insert(email.to_string(), (password.to_string(), user.clone()));
        Ok(user)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let session = {
            let mut inner = self.lock();
            let user = match inner.users.get(email) {
                Some((stored, user)) if stored == password => user.clone(),
                _ => return Err(AuthError::InvalidCredentials),
            };
            let session = Self::make_session(user);
            inner.session = Some(session.clone());
            session
        };
        let _ = self.changes.send(AuthChange::SignedIn {
            session: session.clone(),
        });
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        let had_session = self.lock().session.take().is_some();
        if had_session {
            let _ = self.changes.send(AuthChange::SignedOut);
        }
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.lock().session.clone())
    }

    async fn refresh_session(&self) -> Result<Option<Session>> {
        let refreshed = {
            let mut inner = self.lock();
            if let Some(error) = inner.refresh_error.clone() {
                return Err(error);
            }
            let Some(current) = inner.session.clone() else {
                return Ok(None);
            };
            let session = Self::make_session(current.user);
            inner.session = Some(session.clone());
            session
        };
        let _ = self.changes.send(AuthChange::TokenRefreshed {
            session: refreshed.clone(),
        });
        Ok(Some(refreshed))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }
}
