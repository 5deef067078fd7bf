//! Error types for the session bootstrap and account actions.
//!
//! Error classification happens once, at the service-adapter boundary
//! (see `providers::rest`): raw HTTP failures and service error bodies
//! are mapped onto this closed set. Nothing downstream inspects message
//! strings again.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for session and account operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Closed error taxonomy for the client session layer.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthError {
    /// Required service configuration is absent; the client runs in a
    /// degraded mode where every identity/profile call fails immediately.
    #[error("service unavailable")]
    ServiceUnavailable,

    /// The identity service could not be reached. Recoverable via retry
    /// or a connectivity event.
    #[error("cannot reach identity service: {0}")]
    Connectivity(String),

    /// The current-session request failed. Fatal to the bootstrap attempt
    /// in progress; surfaced as a connection error.
    #[error("session fetch failed: {0}")]
    SessionFetch(String),

    /// Profile row lookup found no rows. Distinguished from other query
    /// errors: it means the user needs profile setup.
    #[error("profile not found")]
    ProfileNotFound,

    /// A profile query failed for a reason other than "no rows".
    #[error("profile query failed: {0}")]
    ProfileQuery(String),

    /// The email address is already registered with the identity service.
    #[error("user already registered")]
    AlreadyRegistered,

    /// Wrong email/password combination.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User input failed validation before any service call was made.
    #[error("{0}")]
    Validation(String),

    /// Any other HTTP-level failure from a service.
    #[error("request failed: {0}")]
    Http(String),

    /// Internal error (poisoned lock, malformed response body).
    #[error("internal error")]
    Internal,
}

impl AuthError {
    /// Returns `true` if the failure is connectivity-class and a retry
    /// may succeed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use finanza_auth::error::AuthError;
    /// assert!(AuthError::Connectivity("timed out".into()).is_recoverable());
    /// assert!(!AuthError::AlreadyRegistered.is_recoverable());
    /// ```
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Connectivity(_) | Self::SessionFetch(_))
    }

    /// Returns `true` if this error is due to invalid user input.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidCredentials | Self::AlreadyRegistered
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_errors_are_recoverable() {
        assert!(AuthError::Connectivity("refused".into()).is_recoverable());
        assert!(AuthError::SessionFetch("reset".into()).is_recoverable());
        assert!(!AuthError::ProfileNotFound.is_recoverable());
        assert!(!AuthError::ServiceUnavailable.is_recoverable());
    }

    #[test]
    fn user_errors_are_classified() {
        assert!(AuthError::Validation("password too short".into()).is_user_error());
        assert!(AuthError::AlreadyRegistered.is_user_error());
        assert!(!AuthError::Internal.is_user_error());
    }
}
