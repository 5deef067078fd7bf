//! Exchange-rate provider trait.

use crate::error::Result;
use crate::state::RateBoard;
use std::future::Future;

/// Exchange-rate API operations.
pub trait RateProvider: Send + Sync {
    /// Fetch current rates quoted against a base currency.
    ///
    /// The returned board covers every supported currency other than the
    /// base (see [`crate::utils::CURRENCIES`]).
    fn fetch_rates(&self, base: &str) -> impl Future<Output = Result<RateBoard>> + Send;
}
