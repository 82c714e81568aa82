use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use coindeck::log::init_logging;
use coindeck::market::Currency;
use coindeck::{AppCommand, MarketFilterArgs};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List coins by market cap with optional filters
    Markets {
        /// Match against coin name or symbol
        #[arg(short, long, default_value = "")]
        keyword: String,
        /// Minimum price in the quote currency
        #[arg(long)]
        min_price: Option<f64>,
        /// Maximum price in the quote currency
        #[arg(long)]
        max_price: Option<f64>,
        /// Quote currency (usd, eur, idr, sol)
        #[arg(short = 'u', long)]
        currency: Option<String>,
        /// Show only coins with a positive 24h change
        #[arg(short, long)]
        gainers_only: bool,
    },
    /// Show detail and a 7-day chart for one coin
    Coin {
        /// CoinGecko coin id, e.g. "bitcoin"
        id: String,
        /// Quote currency (usd, eur, idr, sol)
        #[arg(short = 'u', long)]
        currency: Option<String>,
    },
    /// Value a set of holdings at live prices
    Portfolio {
        /// Holding as COIN=QUANTITY, repeatable
        #[arg(long = "hold", value_name = "COIN=QUANTITY")]
        holds: Vec<String>,
        /// Quote currency (usd, eur, idr, sol)
        #[arg(short = 'u', long)]
        currency: Option<String>,
    },
    /// Interactive dashboard: markets, detail pane and portfolio
    Dashboard {
        /// Quote currency (usd, eur, idr, sol)
        #[arg(short = 'u', long)]
        currency: Option<String>,
    },
}

fn parse_currency(arg: Option<String>) -> Result<Option<Currency>> {
    Ok(arg.as_deref().map(str::parse).transpose()?)
}

fn parse_hold(raw: &str) -> Result<(String, String)> {
    raw.split_once('=')
        .map(|(coin, qty)| (coin.to_string(), qty.to_string()))
        .with_context(|| format!("invalid holding '{raw}', expected COIN=QUANTITY"))
}

fn to_app_command(cmd: Commands) -> Result<AppCommand> {
    Ok(match cmd {
        Commands::Setup => unreachable!("Setup command should be handled separately"),
        Commands::Markets {
            keyword,
            min_price,
            max_price,
            currency,
            gainers_only,
        } => AppCommand::Markets(MarketFilterArgs {
            keyword,
            min_price,
            max_price,
            currency: parse_currency(currency)?,
            positive_change_only: gainers_only,
        }),
        Commands::Coin { id, currency } => AppCommand::Coin {
            id,
            currency: parse_currency(currency)?,
        },
        Commands::Portfolio { holds, currency } => AppCommand::Portfolio {
            holds: holds
                .iter()
                .map(|h| parse_hold(h))
                .collect::<Result<Vec<_>>>()?,
            currency: parse_currency(currency)?,
        },
        Commands::Dashboard { currency } => AppCommand::Dashboard(MarketFilterArgs {
            currency: parse_currency(currency)?,
            ..MarketFilterArgs::default()
        }),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => match to_app_command(cmd) {
            Ok(command) => coindeck::run_command(command, cli.config_path.as_deref()).await,
            Err(e) => Err(e),
        },
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> Result<()> {
    let path = coindeck::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
api:
  base_url: "https://api.coingecko.com/api/v3"
  # Demo or Pro API key. Pro keys require a pro-api.coingecko.com base URL.
  # key: "CG-..."

currency: "usd"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
