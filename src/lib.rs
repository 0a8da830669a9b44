pub mod cli;
pub mod core;
pub mod providers;
pub mod server;

use crate::core::config::AppConfig;
use crate::core::currency::CurrencyRateProvider;
use crate::providers::exchangerate_api::ExchangeRateApiProvider;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Serve,
    Convert {
        from: String,
        to: String,
        amount: String,
    },
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;

    let provider: Arc<dyn CurrencyRateProvider> = Arc::new(
        ExchangeRateApiProvider::from_config(&config.providers.exchangerate_api)?,
    );

    match command {
        AppCommand::Serve => {
            info!("xrate starting...");
            server::serve(&config.server, provider).await
        }
        AppCommand::Convert { from, to, amount } => {
            cli::convert::convert_once(provider.as_ref(), &from, &to, &amount)
                .await
                .map(|_| ())
        }
    }
}
