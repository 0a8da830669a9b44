use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::core::config::ExchangeRateApiConfig;
use crate::core::currency::{CurrencyRateProvider, RateTable};

/// Rate tables from exchangerate-api.com, `GET {base_url}/v4/latest/{base}`.
pub struct ExchangeRateApiProvider {
    base_url: String,
    client: reqwest::Client,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("xrate/1.0")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &ExchangeRateApiConfig) -> Result<Self> {
        Self::new(&config.base_url, config.timeout())
    }
}

#[async_trait]
impl CurrencyRateProvider for ExchangeRateApiProvider {
    #[instrument(name = "ExchangeRateFetch", skip(self), fields(base = %base))]
    async fn fetch_rates(&self, base: &str) -> Result<RateTable> {
        let url = format!("{}/v4/latest/{}", self.base_url, base);
        debug!("Requesting rate table from {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, base = %base, "Failed to fetch exchange rate");
                return Err(anyhow!("Request error: {} for base currency: {}", e, base));
            }
        };

        if !response.status().is_success() {
            error!(status = %response.status(), base = %base, "Exchange rate API returned an error");
            return Err(anyhow!(
                "HTTP error: {} for base currency: {}",
                response.status(),
                base
            ));
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, base = %base, "Failed to read exchange rate response");
                return Err(anyhow!("Failed to read response for {}: {}", base, e));
            }
        };

        match serde_json::from_str::<RateTable>(&text) {
            Ok(table) => {
                debug!(currencies = table.rates.len(), "Received rate table");
                Ok(table)
            }
            Err(e) => {
                error!(
                    error = ?e,
                    response = %text,
                    base = %base,
                    "Failed to decode exchange rate response"
                );
                Err(anyhow!("Failed to parse JSON response for {}: {}", base, e))
            }
        }
    }
}
