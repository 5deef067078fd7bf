//! Identity provider trait.

use crate::actions::AuthChange;
use crate::error::Result;
use crate::state::{Session, User};
use std::future::Future;
use tokio::sync::broadcast;

/// Hosted identity service operations.
///
/// Implementations must classify failures into the closed
/// [`crate::error::AuthError`] set at this boundary; callers never
/// inspect transport errors.
pub trait IdentityProvider: Send + Sync {
    /// Cheap connectivity probe against the service.
    ///
    /// Used by the bootstrap controller before any session work.
    fn probe(&self) -> impl Future<Output = Result<()>> + Send;

    /// Register a new account.
    ///
    /// Fails with [`crate::error::AuthError::AlreadyRegistered`] when the
    /// email already has an account.
    fn sign_up(&self, email: &str, password: &str) -> impl Future<Output = Result<User>> + Send;

    /// Sign in with email and password.
    ///
    /// On success the provider also pushes [`AuthChange::SignedIn`] to
    /// subscribers.
    fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session>> + Send;

    /// Sign out the current session. Idempotent.
    fn sign_out(&self) -> impl Future<Output = Result<()>> + Send;

    /// Fetch the currently stored session, if any.
    fn get_session(&self) -> impl Future<Output = Result<Option<Session>>> + Send;

    /// Exchange the refresh token for a fresh session.
    ///
    /// Returns `Ok(None)` when there is no session to refresh.
    fn refresh_session(&self) -> impl Future<Output = Result<Option<Session>>> + Send;

    /// Subscribe to auth state changes pushed by the service.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}
