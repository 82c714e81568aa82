pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod log;
pub mod market;
pub mod market_provider;
pub mod portfolio;
pub mod providers;
pub mod session;

use crate::filter::FilterSpec;
use crate::market::Currency;
use anyhow::Result;
use tracing::{debug, info};

/// Market filter options as they arrive from the command line, before the
/// config-default currency is resolved in.
#[derive(Debug, Default)]
pub struct MarketFilterArgs {
    pub keyword: String,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub currency: Option<Currency>,
    pub positive_change_only: bool,
}

#[derive(Debug)]
pub enum AppCommand {
    Markets(MarketFilterArgs),
    Coin {
        id: String,
        currency: Option<Currency>,
    },
    Portfolio {
        holds: Vec<(String, String)>,
        currency: Option<Currency>,
    },
    Dashboard(MarketFilterArgs),
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Coindeck starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let default_currency = match &config.currency {
        Some(code) => code.parse::<Currency>()?,
        None => Currency::default(),
    };

    let provider =
        providers::CoinGeckoProvider::new(&config.api.base_url, config.api.key.clone())?;

    match command {
        AppCommand::Markets(args) => {
            let spec = resolve_spec(args, default_currency)?;
            cli::markets::run(&provider, spec).await
        }
        AppCommand::Coin { id, currency } => {
            let currency = currency.unwrap_or(default_currency);
            cli::detail::run(&provider, &id, currency).await
        }
        AppCommand::Portfolio { holds, currency } => {
            let currency = currency.unwrap_or(default_currency);
            cli::portfolio::run(&provider, &holds, currency).await
        }
        AppCommand::Dashboard(args) => {
            let spec = resolve_spec(args, default_currency)?;
            cli::dashboard::run(&provider, spec).await
        }
    }
}

fn resolve_spec(args: MarketFilterArgs, default_currency: Currency) -> Result<FilterSpec> {
    let spec = FilterSpec::new(
        args.keyword,
        args.min_price,
        args.max_price,
        args.currency.unwrap_or(default_currency),
        args.positive_change_only,
    )?;
    Ok(spec)
}
