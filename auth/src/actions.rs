//! Session and account actions.
//!
//! This module defines all possible inputs to the session reducers.
//! Actions split into **commands** (user or lifecycle intent) and
//! **events** (completions of async work, fed back by the effect
//! executor).
//!
//! # Staleness
//!
//! Every bootstrap-related event carries the attempt id it belongs to.
//! The reducer drops events whose id is not the most recent issued, so
//! a completion from an abandoned attempt can never clobber newer state.

use crate::error::{AuthError, Result};
use crate::state::{Profile, RateBoard, Session};
use serde::{Deserialize, Serialize};

/// Auth state change pushed by the identity service.
///
/// The listener task (see [`crate::listener`]) forwards these into the
/// store as [`AuthAction::AuthChanged`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuthChange {
    /// A session was established (sign-in from this or another tab).
    SignedIn {
        /// The new session.
        session: Session,
    },

    /// The session was refreshed; tokens rotated.
    TokenRefreshed {
        /// The refreshed session.
        session: Session,
    },

    /// The user signed out.
    SignedOut,
}

/// Machine-readable code attached to an account action outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionCode {
    /// Sign-up hit an email that already has an account; the caller
    /// should steer the user towards sign-in instead.
    AlreadyRegistered,
}

/// Result of a user-triggered account action.
///
/// Broadcast to store observers as part of the `*Completed` events; the
/// presentation layer surfaces `message` directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Whether the action succeeded.
    pub success: bool,

    /// Human-readable summary for display.
    pub message: String,

    /// Machine-readable code for outcomes the caller branches on.
    pub code: Option<ActionCode>,
}

impl ActionOutcome {
    /// A successful outcome with the given message.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            code: None,
        }
    }

    /// A failed outcome derived from an error.
    #[must_use]
    pub fn failure(error: &AuthError) -> Self {
        let (message, code) = match error {
            AuthError::AlreadyRegistered => (
                "This email is already registered. Please sign in instead.".to_string(),
                Some(ActionCode::AlreadyRegistered),
            ),
            AuthError::InvalidCredentials => {
                ("Invalid email or password.".to_string(), None)
            }
            AuthError::ServiceUnavailable => (
                "The service is not configured. Please try again later.".to_string(),
                None,
            ),
            AuthError::Validation(message) => (message.clone(), None),
            other => (other.to_string(), None),
        };
        Self {
            success: false,
            message,
            code,
        }
    }
}

/// Partial profile update.
///
/// Fields left `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New username, if changing.
    pub username: Option<String>,

    /// New alias, if changing.
    pub alias: Option<String>,

    /// New age, if changing.
    pub age: Option<u8>,
}

impl ProfileUpdate {
    /// Returns `true` when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.username.is_none() && self.alias.is_none() && self.age.is_none()
    }
}

/// Session and account action.
///
/// The reducers are pure functions: `(State, Action, Env) → (State, Effects)`.
/// Actions are the only way to communicate with the session layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuthAction {
    // ═══════════════════════════════════════════════════════════════════════
    // Bootstrap
    // ═══════════════════════════════════════════════════════════════════════
    /// Start a new bootstrap attempt.
    ///
    /// # Flow
    ///
    /// 1. Reducer bumps the attempt id and sets loading
    /// 2. Connectivity probe runs, with the safety timeout armed in parallel
    /// 3. On success the current session is fetched, then the profile
    Bootstrap,

    /// The connectivity probe settled.
    ConnectivityChecked {
        /// Attempt this probe belongs to.
        attempt: u64,

        /// Probe result.
        result: Result<()>,
    },

    /// The retry delay after a failed probe elapsed.
    ConnectivityRetry {
        /// Attempt the failed probe belonged to.
        attempt: u64,
    },

    /// The shell reports connectivity may be back (window focus, OS
    /// online event). Re-runs the bootstrap only from the error state.
    ConnectivityRegained,

    /// The current-session fetch settled.
    SessionFetched {
        /// Attempt this fetch belongs to.
        attempt: u64,

        /// `Ok(None)` means no stored session exists.
        result: Result<Option<Session>>,
    },

    /// The profile fetch settled.
    ProfileFetched {
        /// Attempt this fetch belongs to.
        attempt: u64,

        /// `Err(ProfileNotFound)` means the user needs profile setup.
        result: Result<Profile>,
    },

    /// The safety timeout for an attempt fired.
    ///
    /// Clears loading only; fetches still in flight are not cancelled
    /// and their completions still apply.
    BootstrapTimedOut {
        /// Attempt the timeout was armed for.
        attempt: u64,
    },

    /// The identity service pushed a state change.
    AuthChanged {
        /// What changed.
        change: AuthChange,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Account Actions
    // ═══════════════════════════════════════════════════════════════════════
    /// Register a new account and create its profile row.
    ///
    /// Two writes: the account, then the profile. A failed profile
    /// insert fails the action with no compensation; the dangling
    /// account self-heals through the needs-setup path on next sign-in.
    SignUp {
        /// Correlation ID for matching the completion event.
        correlation_id: uuid::Uuid,

        /// Email address.
        email: String,

        /// Password (validated for minimum length before any call).
        password: String,

        /// Login-style short name for the profile row.
        username: String,

        /// Display name for the profile row.
        alias: String,

        /// Age in years.
        age: u8,
    },

    /// Sign-up settled.
    SignUpCompleted {
        /// Correlation ID of the command.
        correlation_id: uuid::Uuid,

        /// Outcome for the caller.
        outcome: ActionOutcome,
    },

    /// Sign in with email and password.
    ///
    /// State transitions are driven by the pushed [`AuthChange`], not by
    /// this command's completion event.
    SignIn {
        /// Correlation ID for matching the completion event.
        correlation_id: uuid::Uuid,

        /// Email address.
        email: String,

        /// Password.
        password: String,
    },

    /// Sign-in settled.
    SignInCompleted {
        /// Correlation ID of the command.
        correlation_id: uuid::Uuid,

        /// Outcome for the caller.
        outcome: ActionOutcome,
    },

    /// Sign out the current user.
    SignOut {
        /// Correlation ID for matching the completion event.
        correlation_id: uuid::Uuid,
    },

    /// Sign-out settled. Idempotent: succeeds with no session.
    SignOutCompleted {
        /// Correlation ID of the command.
        correlation_id: uuid::Uuid,

        /// Outcome for the caller.
        outcome: ActionOutcome,
    },

    /// Create the profile row for the signed-in user.
    SetupProfile {
        /// Correlation ID for matching the completion event.
        correlation_id: uuid::Uuid,

        /// Login-style short name.
        username: String,

        /// Display name.
        alias: String,

        /// Age in years.
        age: u8,
    },

    /// Profile setup settled.
    ProfileSetupCompleted {
        /// Correlation ID of the command.
        correlation_id: uuid::Uuid,

        /// Outcome for the caller.
        outcome: ActionOutcome,

        /// The created row, on success.
        profile: Option<Profile>,
    },

    /// Patch the signed-in user's profile.
    ///
    /// On success the patch is merged locally without a re-fetch.
    UpdateProfile {
        /// Correlation ID for matching the completion event.
        correlation_id: uuid::Uuid,

        /// Fields to change.
        patch: ProfileUpdate,
    },

    /// Profile update settled.
    ProfileUpdateCompleted {
        /// Correlation ID of the command.
        correlation_id: uuid::Uuid,

        /// Outcome for the caller.
        outcome: ActionOutcome,

        /// The patch to merge locally, on success.
        patch: Option<ProfileUpdate>,
    },

    /// Retry connecting after a connection error, refreshing the session.
    ManualReconnect {
        /// Correlation ID for matching the completion event.
        correlation_id: uuid::Uuid,
    },

    /// Manual reconnect settled. On success a fresh bootstrap attempt
    /// starts.
    ReconnectCompleted {
        /// Correlation ID of the command.
        correlation_id: uuid::Uuid,

        /// Outcome for the caller.
        outcome: ActionOutcome,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Exchange Rates
    // ═══════════════════════════════════════════════════════════════════════
    /// Fetch exchange rates quoted against a base currency.
    FetchRates {
        /// Correlation ID for matching the completion event.
        correlation_id: uuid::Uuid,

        /// ISO code of the base currency.
        base: String,
    },

    /// Rate fetch settled.
    RatesFetched {
        /// Correlation ID of the command.
        correlation_id: uuid::Uuid,

        /// The new board, or the classified failure.
        result: Result<RateBoard>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_registered_maps_to_code() {
        let outcome = ActionOutcome::failure(&AuthError::AlreadyRegistered);
        assert!(!outcome.success);
        assert_eq!(outcome.code, Some(ActionCode::AlreadyRegistered));
        assert!(outcome.message.contains("already registered"));
    }

    #[test]
    fn validation_failure_carries_its_message() {
        let outcome =
            ActionOutcome::failure(&AuthError::Validation("alias cannot be empty".into()));
        assert_eq!(outcome.message, "alias cannot be empty");
        assert_eq!(outcome.code, None);
    }

    #[test]
    fn empty_patch_detection() {
        assert!(ProfileUpdate::default().is_empty());
        let patch = ProfileUpdate {
            alias: Some("New Alias".into()),
            ..ProfileUpdate::default()
        };
        assert!(!patch.is_empty());
    }
}
