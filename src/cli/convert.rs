use crate::core::conversion::{self, ConversionResult, ConvertParams};
use crate::core::currency::CurrencyRateProvider;
use anyhow::Result;

/// Runs one conversion through the same validation and lookup as the HTTP handler.
pub async fn convert_once(
    provider: &dyn CurrencyRateProvider,
    from: &str,
    to: &str,
    amount: &str,
) -> Result<ConversionResult> {
    let params = ConvertParams {
        from: Some(from.to_string()),
        to: Some(to.to_string()),
        amount: Some(amount.to_string()),
    };

    let result = conversion::convert(provider, params).await?;
    println!("{amount} {from} = {} {to}", result.amount);
    Ok(result)
}
