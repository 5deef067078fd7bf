//! Session bootstrap state types.
//!
//! This module defines the core state types for the client session layer.
//! All types are `Clone` to support the functional architecture pattern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for a user, issued by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    /// Generate a new random `UserId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Core State Types
// ═══════════════════════════════════════════════════════════════════════

/// Identity record issued by the identity service.
///
/// Immutable from this system's perspective; referenced by id as the
/// foreign key into [`Profile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: UserId,

    /// Email address.
    pub email: String,

    /// Account created timestamp.
    pub created_at: DateTime<Utc>,
}

/// Opaque token/identity bundle issued by the identity service.
///
/// Held transiently by the bootstrap controller; becomes invalid on
/// sign-out, expiry, or explicit refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The user this session belongs to.
    pub user: User,

    /// Bearer token for authenticated service calls.
    pub access_token: String,

    /// Token used to obtain a fresh access token.
    pub refresh_token: String,

    /// Session expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

/// Application-level user record, distinct from the identity record.
///
/// At most one profile exists per user id. Profile existence is the sole
/// signal distinguishing "needs setup" from "ready".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile ID (equals the owning user's id).
    pub id: UserId,

    /// Login-style short name.
    pub username: String,

    /// Display name.
    pub alias: String,

    /// Age in years.
    pub age: u8,

    /// Row created timestamp.
    pub created_at: DateTime<Utc>,

    /// Row last-updated timestamp.
    pub updated_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════════════════
// Exchange Rates
// ═══════════════════════════════════════════════════════════════════════

/// A single exchange rate against the selected base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// ISO currency code (e.g. "EUR").
    pub currency: String,

    /// Human-readable currency name.
    pub name: String,

    /// Flag emoji for display.
    pub flag: String,

    /// Units of this currency per one unit of the base currency.
    pub rate: f64,

    /// Absolute change since the previous fetch (0.0 on first fetch).
    pub change: f64,

    /// Relative change since the previous fetch, in percent.
    pub change_percent: f64,
}

/// The last successful exchange-rate fetch for a base currency.
///
/// Not persisted; replaced wholesale whenever a fetch for the currently
/// selected base currency succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateBoard {
    /// Base currency the rates are quoted against.
    pub base: String,

    /// Rates for all known currencies other than the base.
    pub rates: Vec<ExchangeRate>,

    /// When the fetch completed.
    pub fetched_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════════════════
// Bootstrap State
// ═══════════════════════════════════════════════════════════════════════

/// Discrete UI phase derived from [`AuthState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// A bootstrap attempt or account action is in flight.
    Loading,

    /// The identity service is unreachable; a retry affordance is shown.
    ConnectionError,

    /// No usable session exists.
    Unauthenticated,

    /// A user exists but has no profile row yet.
    NeedsProfileSetup,

    /// User and profile both present.
    Ready,
}

/// Root session bootstrap state.
///
/// This is the single source of truth for what the presentation layer
/// renders. It is written only by the reducers; completions carrying a
/// stale [`AuthState::attempt`] id are never applied.
///
/// # Invariants
///
/// - `needs_profile_setup == true` only when `user` is `Some` and
///   `profile` is `None`.
/// - `loading` is true only while a bootstrap attempt is in flight.
///
/// # Examples
///
/// ```
/// # use finanza_auth::state::{AuthState, Phase};
/// let state = AuthState::default();
/// assert_eq!(state.phase(), Phase::Loading);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
    /// Identity record for the signed-in user, if any.
    pub user: Option<User>,

    /// Application profile for the signed-in user, if any.
    pub profile: Option<Profile>,

    /// Current session, if any.
    pub session: Option<Session>,

    /// True while a bootstrap attempt is in flight.
    pub loading: bool,

    /// True when a user exists but their profile row does not.
    pub needs_profile_setup: bool,

    /// True when the identity service could not be reached.
    pub connection_error: bool,

    /// True while a user-triggered account action is in flight.
    ///
    /// Shared by all account actions; combined with `loading` for the
    /// presentation layer's single loading signal.
    pub action_loading: bool,

    /// Monotonically increasing bootstrap attempt id.
    ///
    /// Every asynchronous completion carries the attempt id it belongs
    /// to; the reducers apply a completion only if its id is the most
    /// recent issued. This replaces a liveness/"mounted" flag.
    pub attempt: u64,

    /// Last successful exchange-rate fetch, if any.
    pub rates: Option<RateBoard>,
}

impl Default for AuthState {
    fn default() -> Self {
        // The process starts in a loading phase until the first bootstrap
        // attempt settles.
        Self {
            user: None,
            profile: None,
            session: None,
            loading: true,
            needs_profile_setup: false,
            connection_error: false,
            action_loading: false,
            attempt: 0,
            rates: None,
        }
    }
}

impl AuthState {
    /// The single loading signal exposed to the presentation layer.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading || self.action_loading
    }

    /// Returns `true` when the main application can be shown.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.profile.is_some() && !self.needs_profile_setup
    }

    /// Derive the discrete UI phase from the current state.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        if self.is_loading() {
            Phase::Loading
        } else if self.connection_error {
            Phase::ConnectionError
        } else if self.user.is_none() {
            Phase::Unauthenticated
        } else if self.needs_profile_setup {
            Phase::NeedsProfileSetup
        } else {
            Phase::Ready
        }
    }

    /// Clear every identity-related field.
    ///
    /// Used when the session is absent, the user signed out, or a session
    /// fetch failed.
    pub fn clear_identity(&mut self) {
        self.user = None;
        self.profile = None;
        self.session = None;
        self.needs_profile_setup = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: UserId::new(),
            email: "user@example.com".to_string(),
            created_at: Utc::now(),
        }
    }

    fn test_profile(id: UserId) -> Profile {
        Profile {
            id,
            username: "user123".to_string(),
            alias: "User".to_string(),
            age: 30,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn initial_state_is_loading() {
        let state = AuthState::default();
        assert!(state.loading);
        assert_eq!(state.phase(), Phase::Loading);
    }

    #[test]
    fn no_user_no_profile_is_unauthenticated() {
        let state = AuthState {
            loading: false,
            ..AuthState::default()
        };
        assert_eq!(state.phase(), Phase::Unauthenticated);
    }

    #[test]
    fn user_without_profile_needs_setup() {
        let state = AuthState {
            user: Some(test_user()),
            needs_profile_setup: true,
            loading: false,
            ..AuthState::default()
        };
        assert_eq!(state.phase(), Phase::NeedsProfileSetup);
        assert!(!state.is_authenticated());
    }

    #[test]
    fn user_with_profile_is_ready() {
        let user = test_user();
        let profile = test_profile(user.id);
        let state = AuthState {
            user: Some(user),
            profile: Some(profile),
            loading: false,
            ..AuthState::default()
        };
        assert_eq!(state.phase(), Phase::Ready);
        assert!(state.is_authenticated());
    }

    #[test]
    fn connection_error_takes_priority_over_auth() {
        let state = AuthState {
            connection_error: true,
            loading: false,
            ..AuthState::default()
        };
        assert_eq!(state.phase(), Phase::ConnectionError);
    }

    #[test]
    fn action_loading_contributes_to_loading_signal() {
        let state = AuthState {
            loading: false,
            action_loading: true,
            ..AuthState::default()
        };
        assert!(state.is_loading());
        assert_eq!(state.phase(), Phase::Loading);
    }

    #[test]
    fn clear_identity_resets_all_identity_fields() {
        let user = test_user();
        let mut state = AuthState {
            profile: Some(test_profile(user.id)),
            user: Some(user),
            needs_profile_setup: true,
            loading: false,
            ..AuthState::default()
        };
        state.clear_identity();
        assert!(state.user.is_none());
        assert!(state.profile.is_none());
        assert!(state.session.is_none());
        assert!(!state.needs_profile_setup);
    }
}
