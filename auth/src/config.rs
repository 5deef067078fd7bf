//! Session bootstrap configuration.
//!
//! This module provides configuration structures for the bootstrap
//! controller. Configuration values should be provided by the
//! application, not hardcoded.

use std::time::Duration;

/// Bootstrap timing configuration.
///
/// Controls the connectivity retry cadence and the safety timeout that
/// bounds the initial loading phase.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Delay before re-running a failed connectivity check.
    ///
    /// Default: 3 seconds
    pub connect_retry_delay: Duration,

    /// Upper bound on the initial loading phase.
    ///
    /// When the timeout fires the loading flag is cleared, but fetches
    /// already in flight are not cancelled; their completions still
    /// apply if the attempt id is current.
    ///
    /// Default: 8 seconds
    pub bootstrap_timeout: Duration,
}

impl BootstrapConfig {
    /// Set the connectivity retry delay.
    #[must_use]
    pub const fn with_connect_retry_delay(mut self, delay: Duration) -> Self {
        self.connect_retry_delay = delay;
        self
    }

    /// Set the bootstrap safety timeout.
    #[must_use]
    pub const fn with_bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.bootstrap_timeout = timeout;
        self
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            connect_retry_delay: Duration::from_secs(3),
            bootstrap_timeout: Duration::from_secs(8),
        }
    }
}

/// Hosted service configuration.
///
/// Read from the environment at startup. When either variable is absent
/// the client runs with the unavailable providers instead of failing to
/// start.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the hosted identity/profile service.
    pub service_url: String,

    /// Publishable API key sent with every request.
    pub service_key: String,
}

impl ServiceConfig {
    /// Environment variable holding the service base URL.
    pub const URL_VAR: &'static str = "FINANZA_SERVICE_URL";

    /// Environment variable holding the publishable API key.
    pub const KEY_VAR: &'static str = "FINANZA_SERVICE_KEY";

    /// Create a configuration from explicit values.
    #[must_use]
    pub const fn new(service_url: String, service_key: String) -> Self {
        Self {
            service_url,
            service_key,
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// Returns `None` when either variable is missing or empty, which
    /// selects the degraded unavailable providers.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let service_url = std::env::var(Self::URL_VAR).ok()?;
        let service_key = std::env::var(Self::KEY_VAR).ok()?;
        if service_url.is_empty() || service_key.is_empty() {
            return None;
        }
        Some(Self {
            service_url,
            service_key,
        })
    }
}
