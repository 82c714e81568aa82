use crate::cancel::CancelSource;
use crate::cli::ui::{self, StyleType};
use crate::error::FetchError;
use crate::filter::{self, FilterSpec};
use crate::format;
use crate::market::CoinSnapshot;
use crate::market_provider::MarketDataProvider;
use anyhow::Result;
use comfy_table::Cell;

/// Fetches the market list, applies the active filters and prints
/// the ranked table.
pub async fn run(provider: &dyn MarketDataProvider, spec: FilterSpec) -> Result<()> {
    let pb = ui::new_spinner("Fetching markets...");
    let source = CancelSource::new();
    let result = provider.fetch_markets(spec.currency, &source.token()).await;
    pb.finish_and_clear();

    let coins = match result {
        Ok(coins) => coins,
        Err(FetchError::Cancelled) => return Ok(()),
        Err(err) => anyhow::bail!(err),
    };

    let filtered = filter::apply(&coins, &spec);
    if filtered.is_empty() {
        println!("No coins match the current filters.");
        return Ok(());
    }

    println!("{}", render_table(&filtered, &spec));
    if let Some(updated) = coins.iter().find_map(|c| c.last_updated) {
        let line = format!("Last updated: {}", updated.format("%Y-%m-%d %H:%M UTC"));
        println!("{}", ui::style_text(&line, StyleType::Subtle));
    }
    Ok(())
}

pub fn render_table(coins: &[CoinSnapshot], spec: &FilterSpec) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Name"),
        ui::header_cell("Symbol"),
        ui::header_cell(&format!("Price ({})", spec.currency.code().to_uppercase())),
        ui::header_cell("24h"),
        ui::header_cell("Market Cap"),
    ]);

    for coin in coins {
        let change = coin.change_24h();
        table.add_row(vec![
            Cell::new(
                coin.market_cap_rank
                    .map_or_else(|| "—".to_string(), |r| r.to_string()),
            ),
            Cell::new(&coin.name),
            Cell::new(coin.symbol.to_uppercase()),
            ui::value_cell(&format::currency(Some(coin.current_price), spec.currency)),
            ui::change_cell(&format::percentage(Some(change)), is_gain(change)),
            ui::value_cell(&format::currency(Some(coin.market_cap), spec.currency)),
        ]);
    }
    table.to_string()
}

/// Same strict-positive rule the gainers filter uses, so a 0.00% change
/// never colors green.
fn is_gain(change: f64) -> bool {
    change > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Currency;

    fn coin(id: &str, name: &str, price: f64, rank: Option<u32>) -> CoinSnapshot {
        CoinSnapshot {
            id: id.to_string(),
            symbol: id[..3.min(id.len())].to_string(),
            name: name.to_string(),
            image_url: None,
            current_price: price,
            market_cap: price * 1_000_000.0,
            market_cap_rank: rank,
            price_change_percentage_24h: Some(1.5),
            price_change_percentage_24h_in_currency: None,
            last_updated: None,
        }
    }

    #[test]
    fn table_lists_coins_with_rank_and_price() {
        let coins = vec![coin("bitcoin", "Bitcoin", 50_000.0, Some(1))];
        let spec = FilterSpec::new(String::new(), None, None, Currency::Usd, false).unwrap();
        let rendered = render_table(&coins, &spec);
        assert!(rendered.contains("Bitcoin"));
        assert!(rendered.contains("BIT"));
        assert!(rendered.contains("$50,000"));
        assert!(rendered.contains("+1.50%"));
    }

    #[test]
    fn zero_change_is_not_a_gain() {
        assert!(!is_gain(0.0));
        assert!(!is_gain(-0.5));
        assert!(is_gain(0.01));
    }

    #[test]
    fn table_shows_dash_for_missing_rank() {
        let coins = vec![coin("newcoin", "Newcoin", 2.0, None)];
        let spec = FilterSpec::new(String::new(), None, None, Currency::Usd, false).unwrap();
        assert!(render_table(&coins, &spec).contains('—'));
    }
}
