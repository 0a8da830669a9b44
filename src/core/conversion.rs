//! Conversion request parsing, validation and the conversion itself

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;
use tracing::{debug, warn};

use super::currency::CurrencyRateProvider;

/// The two failures a caller can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("Invalid input")]
    InvalidInput,
    #[error("Exchange rate not found")]
    RateNotFound,
}

/// Raw parameters as they arrive, before any parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: Option<String>,
}

impl ConvertParams {
    /// Collects parameters from decoded `key=value` pairs. A repeated key keeps
    /// its first value, unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "from" => &mut params.from,
                "to" => &mut params.to,
                "amount" => &mut params.amount,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    /// Fills every parameter missing here from `other`.
    pub fn or(self, other: ConvertParams) -> Self {
        Self {
            from: self.from.or(other.from),
            to: self.to.or(other.to),
            amount: self.amount.or(other.amount),
        }
    }
}

/// Outcome of the lenient amount parse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    Value(f64),
    Unparseable,
}

impl Amount {
    /// Parses like scanf `%f`: skips leading whitespace, reads the longest decimal
    /// float prefix and ignores whatever follows it.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim_start();
        let token = float_prefix(trimmed);
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Amount::Value(value),
            _ => Amount::Unparseable,
        }
    }

    /// The numeric value, with unparseable input read as zero.
    pub fn value(&self) -> f64 {
        match self {
            Amount::Value(value) => *value,
            Amount::Unparseable => 0.0,
        }
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Amount::Value(value) => write!(f, "{value}"),
            Amount::Unparseable => write!(f, "<unparseable>"),
        }
    }
}

fn float_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;
    let digits = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    end = digits(end);
    if end < bytes.len() && bytes[end] == b'.' {
        end = digits(end + 1);
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        end += 1;
        if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
            end += 1;
        }
        end = digits(end);
    }
    &s[..end]
}

/// A validated conversion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

impl TryFrom<ConvertParams> for ConversionRequest {
    type Error = ConvertError;

    fn try_from(params: ConvertParams) -> Result<Self, Self::Error> {
        let from = params.from.unwrap_or_default();
        let to = params.to.unwrap_or_default();
        let amount = params
            .amount
            .as_deref()
            .map_or(Amount::Unparseable, Amount::parse);

        if from.is_empty() || to.is_empty() || amount.value() == 0.0 {
            debug!(
                from = %from,
                to = %to,
                amount = %amount,
                "Rejecting conversion request"
            );
            return Err(ConvertError::InvalidInput);
        }

        Ok(Self {
            from,
            to,
            amount: amount.value(),
        })
    }
}

impl ConversionRequest {
    pub fn apply(&self, rate: f64) -> ConversionResult {
        ConversionResult {
            amount: self.amount * rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub amount: f64,
}

/// Validates `params`, looks up the rate and converts. Every lookup failure,
/// whatever its cause, surfaces as [`ConvertError::RateNotFound`], and so does
/// a product that overflows to infinity.
pub async fn convert(
    provider: &dyn CurrencyRateProvider,
    params: ConvertParams,
) -> Result<ConversionResult, ConvertError> {
    let request = ConversionRequest::try_from(params)?;

    let rate = provider
        .get_rate(&request.from, &request.to)
        .await
        .map_err(|e| {
            warn!(
                error = %e,
                from = %request.from,
                to = %request.to,
                "Exchange rate lookup failed"
            );
            ConvertError::RateNotFound
        })?;

    let result = request.apply(rate);
    if !result.amount.is_finite() {
        warn!(
            from = %request.from,
            to = %request.to,
            rate,
            amount = request.amount,
            "Converted amount is not a finite number"
        );
        return Err(ConvertError::RateNotFound);
    }

    debug!(
        from = %request.from,
        to = %request.to,
        rate,
        amount = result.amount,
        "Converted amount"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::RateTable;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        rates: Option<RateTable>,
        call_count: AtomicUsize,
    }

    impl MockProvider {
        fn with_rates(entries: &[(&str, f64)]) -> Self {
            Self {
                rates: Some(RateTable {
                    rates: entries
                        .iter()
                        .map(|(code, rate)| (code.to_string(), *rate))
                        .collect(),
                }),
                call_count: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                rates: None,
                call_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CurrencyRateProvider for MockProvider {
        async fn fetch_rates(&self, base: &str) -> anyhow::Result<RateTable> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.rates.clone().ok_or_else(|| {
                anyhow::anyhow!("Request error: unreachable for base currency: {base}")
            })
        }
    }

    fn params(from: Option<&str>, to: Option<&str>, amount: Option<&str>) -> ConvertParams {
        ConvertParams {
            from: from.map(String::from),
            to: to.map(String::from),
            amount: amount.map(String::from),
        }
    }

    #[test]
    fn test_amount_parse() {
        assert_eq!(Amount::parse("100"), Amount::Value(100.0));
        assert_eq!(Amount::parse("  12.5"), Amount::Value(12.5));
        assert_eq!(Amount::parse("-50"), Amount::Value(-50.0));
        assert_eq!(Amount::parse("+3"), Amount::Value(3.0));
        assert_eq!(Amount::parse("1e3"), Amount::Value(1000.0));
        assert_eq!(Amount::parse(".5"), Amount::Value(0.5));
        assert_eq!(Amount::parse("100abc"), Amount::Value(100.0));
        assert_eq!(Amount::parse("0"), Amount::Value(0.0));
    }

    #[test]
    fn test_amount_parse_reads_decimal_forms_only() {
        // Hex and digit separators stop the scan like any other trailing text
        assert_eq!(Amount::parse("0x10"), Amount::Value(0.0));
        assert_eq!(Amount::parse("1_000"), Amount::Value(1.0));
    }

    #[test]
    fn test_amount_parse_unparseable() {
        for input in ["", "abc", "-", ".", "1e", "inf", "NaN", "1e999"] {
            assert_eq!(Amount::parse(input), Amount::Unparseable, "input: {input:?}");
            assert_eq!(Amount::parse(input).value(), 0.0);
        }
    }

    #[test]
    fn test_valid_request() {
        let request = ConversionRequest::try_from(params(Some("USD"), Some("EUR"), Some("100")))
            .expect("request should be valid");

        assert_eq!(request.from, "USD");
        assert_eq!(request.to, "EUR");
        assert_eq!(request.amount, 100.0);
    }

    #[test]
    fn test_invalid_requests() {
        let cases = [
            params(None, Some("EUR"), Some("100")),
            params(Some(""), Some("EUR"), Some("100")),
            params(Some("USD"), None, Some("100")),
            params(Some("USD"), Some(""), Some("100")),
            params(Some("USD"), Some("EUR"), None),
            params(Some("USD"), Some("EUR"), Some("0")),
            params(Some("USD"), Some("EUR"), Some("0.0")),
            params(Some("USD"), Some("EUR"), Some("garbage")),
        ];

        for case in cases {
            assert_eq!(
                ConversionRequest::try_from(case.clone()),
                Err(ConvertError::InvalidInput),
                "params: {case:?}"
            );
        }
    }

    #[test]
    fn test_negative_amount_is_accepted() {
        let request =
            ConversionRequest::try_from(params(Some("USD"), Some("EUR"), Some("-50"))).unwrap();

        let result = request.apply(0.9);
        assert!(result.amount < 0.0);
        assert!((result.amount + 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_params_or_prefers_self() {
        let form = params(Some("GBP"), None, Some("5"));
        let query = params(Some("USD"), Some("EUR"), Some("100"));

        let merged = form.or(query);
        assert_eq!(merged.from.as_deref(), Some("GBP"));
        assert_eq!(merged.to.as_deref(), Some("EUR"));
        assert_eq!(merged.amount.as_deref(), Some("5"));
    }

    #[test]
    fn test_params_from_pairs_keeps_first_value() {
        let pairs = [
            ("from", "USD"),
            ("from", "GBP"),
            ("to", "EUR"),
            ("extra", "ignored"),
            ("amount", "1"),
            ("to", "JPY"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string()));

        assert_eq!(
            ConvertParams::from_pairs(pairs),
            params(Some("USD"), Some("EUR"), Some("1"))
        );
    }

    #[test]
    fn test_params_from_pairs_keeps_empty_first_value() {
        let pairs = [("from", ""), ("from", "USD")].map(|(k, v)| (k.to_string(), v.to_string()));

        let parsed = ConvertParams::from_pairs(pairs);
        assert_eq!(parsed.from.as_deref(), Some(""));
        assert!(parsed.to.is_none());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ConvertError::InvalidInput.to_string(), "Invalid input");
        assert_eq!(
            ConvertError::RateNotFound.to_string(),
            "Exchange rate not found"
        );
    }

    #[tokio::test]
    async fn test_convert() {
        let provider = MockProvider::with_rates(&[("EUR", 0.9)]);

        let result = convert(&provider, params(Some("USD"), Some("EUR"), Some("100")))
            .await
            .unwrap();
        assert!((result.amount - 90.0).abs() < 1e-9);
        assert_eq!(provider.call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_convert_is_idempotent() {
        let provider = MockProvider::with_rates(&[("EUR", 0.9)]);
        let request = params(Some("USD"), Some("EUR"), Some("42.5"));

        let first = convert(&provider, request.clone()).await.unwrap();
        let second = convert(&provider, request).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(provider.call_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_convert_invalid_input_skips_lookup() {
        let provider = MockProvider::with_rates(&[("EUR", 0.9)]);

        let result = convert(&provider, params(Some("USD"), Some("EUR"), Some("0"))).await;
        assert_eq!(result, Err(ConvertError::InvalidInput));
        assert_eq!(provider.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_convert_lookup_failures_are_not_found() {
        let missing = MockProvider::with_rates(&[("GBP", 0.8)]);
        let result = convert(&missing, params(Some("USD"), Some("EUR"), Some("1"))).await;
        assert_eq!(result, Err(ConvertError::RateNotFound));

        let zero_rate = MockProvider::with_rates(&[("EUR", 0.0)]);
        let result = convert(&zero_rate, params(Some("USD"), Some("EUR"), Some("1"))).await;
        assert_eq!(result, Err(ConvertError::RateNotFound));

        let unreachable = MockProvider::failing();
        let result = convert(&unreachable, params(Some("USD"), Some("EUR"), Some("1"))).await;
        assert_eq!(result, Err(ConvertError::RateNotFound));
    }

    #[tokio::test]
    async fn test_convert_overflowing_amount() {
        let provider = MockProvider::with_rates(&[("INR", 85.0)]);

        let result = convert(&provider, params(Some("USD"), Some("INR"), Some("1e308"))).await;
        assert_eq!(result, Err(ConvertError::RateNotFound));

        let result = convert(&provider, params(Some("USD"), Some("INR"), Some("-1e308"))).await;
        assert_eq!(result, Err(ConvertError::RateNotFound));
    }
}
