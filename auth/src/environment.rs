//! Session environment.
//!
//! This module defines the environment type for dependency injection
//! in the session reducers. The environment is built once at startup
//! and handed to the store; reducers never reach for globals.

use crate::config::{BootstrapConfig, ServiceConfig};
use crate::providers::openrates::OpenRatesProvider;
use crate::providers::unavailable::{UnavailableIdentityProvider, UnavailableProfileStore};
use crate::providers::{ClientIdentity, ClientProfiles, IdentityProvider, ProfileStore, RateProvider, rest};
use finanza_core::environment::{Clock, SystemClock};
use std::sync::Arc;
use tracing::warn;

/// Session environment.
///
/// Contains all external dependencies needed by the session reducers.
///
/// # Type Parameters
///
/// - `I`: Identity provider
/// - `P`: Profile store
/// - `R`: Rate provider
#[derive(Clone)]
pub struct AuthEnvironment<I, P, R>
where
    I: IdentityProvider + Clone,
    P: ProfileStore + Clone,
    R: RateProvider + Clone,
{
    /// Identity provider (hosted auth service).
    pub identity: I,

    /// Profile store (hosted data service).
    pub profiles: P,

    /// Exchange-rate provider.
    pub rates: R,

    /// Clock for timestamp synthesis.
    pub clock: Arc<dyn Clock>,

    /// Bootstrap timing configuration.
    pub bootstrap: BootstrapConfig,
}

impl<I, P, R> AuthEnvironment<I, P, R>
where
    I: IdentityProvider + Clone,
    P: ProfileStore + Clone,
    R: RateProvider + Clone,
{
    /// Create a new session environment.
    #[must_use]
    pub fn new(
        identity: I,
        profiles: P,
        rates: R,
        clock: Arc<dyn Clock>,
        bootstrap: BootstrapConfig,
    ) -> Self {
        Self {
            identity,
            profiles,
            rates,
            clock,
            bootstrap,
        }
    }
}

/// The environment the client runs with in production.
pub type ClientEnvironment = AuthEnvironment<ClientIdentity, ClientProfiles, OpenRatesProvider>;

/// Build the production environment from the process environment.
///
/// Missing service configuration selects the degraded providers instead
/// of failing startup; the client renders unauthenticated and account
/// actions report the service as unavailable.
#[must_use]
pub fn environment_from_env(bootstrap: BootstrapConfig) -> ClientEnvironment {
    let (identity, profiles) = match ServiceConfig::from_env() {
        Some(config) => {
            let (identity, profiles) = rest::providers(&config);
            (
                ClientIdentity::Rest(identity),
                ClientProfiles::Rest(profiles),
            )
        }
        None => {
            warn!(
                url_var = ServiceConfig::URL_VAR,
                key_var = ServiceConfig::KEY_VAR,
                "service configuration missing; running without identity service"
            );
            (
                ClientIdentity::Unavailable(UnavailableIdentityProvider::new()),
                ClientProfiles::Unavailable(UnavailableProfileStore),
            )
        }
    };
    AuthEnvironment::new(
        identity,
        profiles,
        OpenRatesProvider::new(),
        Arc::new(SystemClock),
        bootstrap,
    )
}
