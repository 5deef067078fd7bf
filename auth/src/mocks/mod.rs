//! Mock providers for testing.
//!
//! All mocks are in-memory, cheaply cloneable (clones share state), and
//! configurable per scenario. Gated behind the `test-utils` feature so
//! downstream test suites can use them too.

mod identity;
mod profile;
mod rates;

pub use identity::MockIdentityProvider;
pub use profile::MockProfileStore;
pub use rates::MockRateProvider;

use crate::config::BootstrapConfig;
use crate::environment::AuthEnvironment;
use crate::state::{ExchangeRate, Profile, RateBoard, Session, User, UserId};
use chrono::{DateTime, Duration, Utc};
use finanza_core::environment::Clock;
use std::sync::Arc;

/// Clock pinned to a fixed instant for deterministic timestamps.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(DateTime::UNIX_EPOCH + Duration::days(20_000))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A full mock environment with default timing.
#[must_use]
pub fn test_env() -> AuthEnvironment<MockIdentityProvider, MockProfileStore, MockRateProvider> {
    AuthEnvironment::new(
        MockIdentityProvider::new(),
        MockProfileStore::new(),
        MockRateProvider::new(),
        Arc::new(FixedClock::default()),
        BootstrapConfig::default(),
    )
}

/// A session and the matching profile row for an already signed-in user.
#[must_use]
pub fn signed_in_fixture() -> (Session, Profile) {
    let now = FixedClock::default().now();
    let user = User {
        id: UserId::new(),
        email: "fixture@example.com".to_string(),
        created_at: now,
    };
    let profile = Profile {
        id: user.id,
        username: "fixture".to_string(),
        alias: "Fixture User".to_string(),
        age: 30,
        created_at: now,
        updated_at: now,
    };
    let session = Session {
        user,
        access_token: "fixture-access".to_string(),
        refresh_token: "fixture-refresh".to_string(),
        expires_at: now + Duration::hours(1),
    };
    (session, profile)
}

/// A small rate board quoted against the given base.
#[must_use]
pub fn rate_board_fixture(base: &str) -> RateBoard {
    RateBoard {
        base: base.to_string(),
        rates: vec![
            ExchangeRate {
                currency: "EUR".to_string(),
                name: "Euro".to_string(),
                flag: "🇪🇺".to_string(),
                rate: 0.9,
                change: 0.0,
                change_percent: 0.0,
            },
            ExchangeRate {
                currency: "GBP".to_string(),
                name: "British Pound".to_string(),
                flag: "🇬🇧".to_string(),
                rate: 0.78,
                change: 0.0,
                change_percent: 0.0,
            },
        ],
        fetched_at: FixedClock::default().now(),
    }
}
