use crate::cancel::CancelSource;
use crate::cli::ui::{self, StyleType};
use crate::error::FetchError;
use crate::format;
use crate::market::{CoinDetail, Currency, PricePoint};
use crate::market_provider::MarketDataProvider;
use crate::session::{self, DetailRequest};
use anyhow::Result;
use comfy_table::Cell;

const SUMMARY_LIMIT: usize = 240;

/// Fetches detail and 7-day chart for one coin and prints the card.
pub async fn run(provider: &dyn MarketDataProvider, coin_id: &str, currency: Currency) -> Result<()> {
    let pb = ui::new_spinner("Fetching coin detail...");
    let source = CancelSource::new();
    let request = DetailRequest::new(coin_id, currency, source.token());
    let result = session::load_detail(provider, &request).await;
    pb.finish_and_clear();

    let (detail, chart) = match result {
        Ok(pair) => pair,
        Err(FetchError::Cancelled) => return Ok(()),
        Err(err) => anyhow::bail!(err),
    };

    println!("{}", render(&detail, &chart, currency));
    Ok(())
}

pub fn render(detail: &CoinDetail, chart: &[PricePoint], currency: Currency) -> String {
    let mut out = String::new();

    let title = format!("{} ({})", detail.name, detail.symbol.to_uppercase());
    out.push_str(&ui::style_text(&title, StyleType::Title));
    if let Some(rank) = detail.market_cap_rank {
        out.push_str(&ui::style_text(&format!("  rank #{rank}"), StyleType::Subtle));
    }
    out.push('\n');

    if let Some(summary) = summarize(&detail.description.en) {
        out.push_str(&summary);
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&metrics_table(detail, currency));
    out.push('\n');

    if let Some(chart_block) = render_chart(chart, currency) {
        out.push('\n');
        out.push_str(&chart_block);
        out.push('\n');
    }
    out
}

fn metrics_table(detail: &CoinDetail, currency: Currency) -> String {
    let data = detail.market_data.clone().unwrap_or_default();
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(&format!("Price ({})", currency.code().to_uppercase())),
        ui::header_cell("High 24h"),
        ui::header_cell("Low 24h"),
        ui::header_cell("Volume 24h"),
        ui::header_cell("Circulating Supply"),
    ]);
    table.add_row(vec![
        ui::value_cell(&format::currency(data.price_in(currency), currency)),
        ui::value_cell(&format::currency(data.high_24h_in(currency), currency)),
        ui::value_cell(&format::currency(data.low_24h_in(currency), currency)),
        ui::value_cell(&format::currency(data.volume_in(currency), currency)),
        Cell::new(
            data.circulating_supply
                .map_or_else(|| "—".to_string(), |s| format!("{s:.0}")),
        ),
    ]);
    table.to_string()
}

fn render_chart(chart: &[PricePoint], currency: Currency) -> Option<String> {
    let first = chart.first()?;
    let last = chart.last()?;
    let values: Vec<f64> = chart.iter().map(|p| p.value).collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(format!(
        "7d  {}  ({} → {})\n{}",
        ui::sparkline(&values),
        first.label,
        last.label,
        ui::style_text(
            &format!(
                "low {}  high {}",
                format::currency(Some(min), currency),
                format::currency(Some(max), currency)
            ),
            StyleType::Subtle,
        ),
    ))
}

/// First line of the English description, tags stripped, truncated with
/// an ellipsis. CoinGecko descriptions embed raw anchor tags.
fn summarize(description: &str) -> Option<String> {
    let line = description.lines().find(|l| !l.trim().is_empty())?;
    let plain = strip_tags(line.trim());
    if plain.is_empty() {
        return None;
    }
    if plain.chars().count() <= SUMMARY_LIMIT {
        return Some(plain);
    }
    let truncated: String = plain.chars().take(SUMMARY_LIMIT).collect();
    Some(format!("{}…", truncated.trim_end()))
}

fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
