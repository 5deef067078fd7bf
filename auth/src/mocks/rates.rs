//! Mock exchange-rate provider.

use crate::error::{AuthError, Result};
use crate::providers::RateProvider;
use crate::state::RateBoard;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Default)]
struct Inner {
    boards: HashMap<String, RateBoard>,
    error: Option<AuthError>,
}

/// In-memory rate provider serving seeded boards.
#[derive(Clone, Default)]
pub struct MockRateProvider {
    inner: Arc<Mutex<Inner>>,
}

impl MockRateProvider {
    /// A provider with no boards; fetches fail until seeded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed the board returned for its base currency.
    pub fn set_board(&self, board: RateBoard) {
        self.lock().boards.insert(board.base.clone(), board);
    }

    /// Make every fetch fail with the given error.
    pub fn fail(&self, error: AuthError) {
        self.lock().error = Some(error);
    }
}

impl RateProvider for MockRateProvider {
    async fn fetch_rates(&self, base: &str) -> Result<RateBoard> {
        let inner = self.lock();
        if let Some(error) = inner.error.clone() {
            return Err(error);
        }
        inner
            .boards
            .get(base)
            .cloned()
            .ok_or_else(|| AuthError::Http(format!("no rates seeded for {base}")))
    }
}
