use crate::cancel::CancelSource;
use crate::cli::ui::{self, StyleType};
use crate::error::FetchError;
use crate::format;
use crate::market::Currency;
use crate::market_provider::MarketDataProvider;
use crate::portfolio::{self, HoldingValuation, Portfolio};
use anyhow::Result;
use comfy_table::Cell;

/// Values the given holdings against live market prices and prints the
/// valuation table. Invalid holdings are reported and skipped, not fatal.
pub async fn run(
    provider: &dyn MarketDataProvider,
    holds: &[(String, String)],
    currency: Currency,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching prices...");
    let source = CancelSource::new();
    let result = provider.fetch_markets(currency, &source.token()).await;
    pb.finish_and_clear();

    let coins = match result {
        Ok(coins) => coins,
        Err(FetchError::Cancelled) => return Ok(()),
        Err(err) => anyhow::bail!(err),
    };

    let mut portfolio = Portfolio::new();
    for (coin_id, quantity) in holds {
        if let Err(err) = portfolio.add_parsed(coin_id, quantity) {
            let line = format!("Skipping '{coin_id}': {err}");
            println!("{}", ui::style_text(&line, StyleType::Error));
        }
    }

    if portfolio.is_empty() {
        println!("No valid holdings to value. Pass --hold COIN=QUANTITY.");
        return Ok(());
    }

    let valuations = portfolio.valuate(&coins);
    println!("{}", render_valuations(&valuations, currency));
    Ok(())
}

pub fn render_valuations(valuations: &[HoldingValuation], currency: Currency) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Coin"),
        ui::header_cell("Symbol"),
        ui::header_cell("Quantity"),
        ui::header_cell("Price"),
        ui::header_cell("Value"),
    ]);

    for valuation in valuations {
        table.add_row(vec![
            Cell::new(&valuation.name),
            Cell::new(&valuation.symbol),
            ui::value_cell(&format!("{}", valuation.quantity)),
            ui::value_cell(&format::currency(Some(valuation.current_price), currency)),
            ui::value_cell(&format::currency(Some(valuation.current_value), currency)),
        ]);
    }

    let total_line = format!(
        "{} {}",
        ui::style_text("Total:", StyleType::TotalLabel),
        ui::style_text(
            &format::currency(Some(portfolio::total(valuations)), currency),
            StyleType::TotalValue,
        ),
    );
    format!("{table}\n{total_line}")
}
