//! Exchange-rate provider backed by the open.er-api.com API.

use crate::error::{AuthError, Result};
use crate::providers::RateProvider;
use crate::state::{ExchangeRate, RateBoard};
use crate::utils::{CURRENCIES, currency_by_code};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

const DEFAULT_BASE_URL: &str = "https://open.er-api.com/v6";

#[derive(Debug, Deserialize)]
struct RatesResponse {
    result: String,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// Rate provider speaking the open exchange-rate API.
///
/// Keeps the previous board per base currency so each fetch can report
/// the change since the last one.
#[derive(Clone)]
pub struct OpenRatesProvider {
    client: reqwest::Client,
    base_url: String,
    previous: Arc<RwLock<HashMap<String, RateBoard>>>,
}

impl OpenRatesProvider {
    /// Create a provider against the public API endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    /// Create a provider against a custom endpoint (tests, proxies).
    #[must_use]
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            previous: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn build_board(&self, base: &str, quoted: &HashMap<String, f64>) -> Result<RateBoard> {
        let previous = self
            .previous
            .read()
            .map_err(|_| AuthError::Internal)?
            .get(base)
            .cloned();
        let rates = CURRENCIES
            .iter()
            .filter(|currency| currency.code != base)
            .filter_map(|currency| {
                let rate = *quoted.get(currency.code)?;
                let old = previous.as_ref().and_then(|board| {
                    board
                        .rates
                        .iter()
                        .find(|r| r.currency == currency.code)
                        .map(|r| r.rate)
                });
                let change = old.map_or(0.0, |old| rate - old);
                let change_percent = old
                    .filter(|old| *old != 0.0)
                    .map_or(0.0, |old| (rate - old) / old * 100.0);
                Some(ExchangeRate {
                    currency: currency.code.to_string(),
                    name: currency.name.to_string(),
                    flag: currency.flag.to_string(),
                    rate,
                    change,
                    change_percent,
                })
            })
            .collect();
        let board = RateBoard {
            base: base.to_string(),
            rates,
            fetched_at: chrono::Utc::now(),
        };
        self.previous
            .write()
            .map_err(|_| AuthError::Internal)?
            .insert(base.to_string(), board.clone());
        Ok(board)
    }
}

impl Default for OpenRatesProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RateProvider for OpenRatesProvider {
    async fn fetch_rates(&self, base: &str) -> Result<RateBoard> {
        if currency_by_code(base).is_none() {
            return Err(AuthError::Validation(format!(
                "unsupported base currency: {base}"
            )));
        }
        let response = self
            .client
            .get(format!("{}/latest/{base}", self.base_url))
            .send()
            .await
            .map_err(|err| {
                if err.is_connect() || err.is_timeout() {
                    AuthError::Connectivity(err.to_string())
                } else {
                    AuthError::Http(err.to_string())
                }
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Http(format!("rate API returned {status}")));
        }
        let parsed: RatesResponse = response.json().await.map_err(|_| AuthError::Internal)?;
        if parsed.result != "success" {
            return Err(AuthError::Http(format!(
                "rate API result: {}",
                parsed.result
            )));
        }
        self.build_board(base, &parsed.rates)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn quotes(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs
            .iter()
            .map(|(code, rate)| ((*code).to_string(), *rate))
            .collect()
    }

    #[test]
    fn board_excludes_base_and_unknown_codes() {
        let provider = OpenRatesProvider::new();
        let board = provider
            .build_board("USD", &quotes(&[("USD", 1.0), ("EUR", 0.9), ("ZZZ", 5.0)]))
            .unwrap();
        assert_eq!(board.base, "USD");
        assert_eq!(board.rates.len(), 1);
        assert_eq!(board.rates[0].currency, "EUR");
        assert!(board.rates[0].change.abs() < 1e-12);
    }

    #[test]
    fn second_fetch_reports_change_against_first() {
        let provider = OpenRatesProvider::new();
        provider
            .build_board("USD", &quotes(&[("EUR", 0.8)]))
            .unwrap();
        let board = provider
            .build_board("USD", &quotes(&[("EUR", 0.9)]))
            .unwrap();
        let eur = &board.rates[0];
        assert!((eur.change - 0.1).abs() < 1e-9);
        assert!((eur.change_percent - 12.5).abs() < 1e-9);
    }

    #[test]
    fn boards_are_tracked_per_base() {
        let provider = OpenRatesProvider::new();
        provider
            .build_board("USD", &quotes(&[("EUR", 0.8)]))
            .unwrap();
        let eur_board = provider
            .build_board("EUR", &quotes(&[("USD", 1.25)]))
            .unwrap();
        assert!(eur_board.rates[0].change.abs() < 1e-12);
    }
}
