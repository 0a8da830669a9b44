//! Currency rate abstractions

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

/// Exchange rates for every quoted currency, relative to one base currency.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateTable {
    pub rates: HashMap<String, f64>,
}

impl RateTable {
    /// Returns a usable rate for `to`. Zero or non-finite entries count as missing.
    pub fn rate_for(&self, to: &str) -> Option<f64> {
        self.rates
            .get(to)
            .copied()
            .filter(|rate| rate.is_finite() && *rate != 0.0)
    }
}

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    /// Fetches the full rate table quoted against `base`.
    async fn fetch_rates(&self, base: &str) -> Result<RateTable>;

    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        let table = self.fetch_rates(from).await?;
        match table.rate_for(to) {
            Some(rate) => Ok(rate),
            None => {
                warn!(from = %from, to = %to, "Exchange rate not present in rate table");
                Err(anyhow!("Exchange rate for {} to {} not found", from, to))
            }
        }
    }
}
