//! Market data model: everything the CoinGecko endpoints hand back, plus
//! the quote currencies the dashboard supports.

use crate::error::ValidationError;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Quote currencies offered by the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Idr,
    Sol,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Usd, Currency::Eur, Currency::Idr, Currency::Sol];

    /// Lowercase code as CoinGecko expects it in `vs_currency`.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "usd",
            Currency::Eur => "eur",
            Currency::Idr => "idr",
            Currency::Sol => "sol",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "usd" => Ok(Currency::Usd),
            "eur" => Ok(Currency::Eur),
            "idr" => Ok(Currency::Idr),
            "sol" => Ok(Currency::Sol),
            other => Err(ValidationError(format!(
                "unsupported currency '{other}' (expected usd, eur, idr or sol)"
            ))),
        }
    }
}

/// One row of the `/coins/markets` response. Immutable per fetch; the whole
/// list is replaced on every refresh, never mutated in place.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinSnapshot {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(rename = "image", default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub current_price: f64,
    #[serde(default)]
    pub market_cap: f64,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub price_change_percentage_24h_in_currency: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl CoinSnapshot {
    /// 24h change with an explicit fallback chain: the currency-specific
    /// field wins, then the generic one, then 0.
    pub fn change_24h(&self) -> f64 {
        self.price_change_percentage_24h_in_currency
            .or(self.price_change_percentage_24h)
            .unwrap_or(0.0)
    }
}

/// Richer per-coin record from `/coins/{id}`, fetched lazily for the
/// selected coin only.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub description: Description,
    #[serde(default)]
    pub market_data: Option<MarketData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub en: String,
}

/// Per-currency market metrics, keyed by lowercase currency code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketData {
    #[serde(default)]
    pub current_price: HashMap<String, f64>,
    #[serde(default)]
    pub high_24h: HashMap<String, f64>,
    #[serde(default)]
    pub low_24h: HashMap<String, f64>,
    #[serde(default)]
    pub total_volume: HashMap<String, f64>,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
}

impl MarketData {
    pub fn price_in(&self, currency: Currency) -> Option<f64> {
        self.current_price.get(currency.code()).copied()
    }

    pub fn high_24h_in(&self, currency: Currency) -> Option<f64> {
        self.high_24h.get(currency.code()).copied()
    }

    pub fn low_24h_in(&self, currency: Currency) -> Option<f64> {
        self.low_24h.get(currency.code()).copied()
    }

    pub fn volume_in(&self, currency: Currency) -> Option<f64> {
        self.total_volume.get(currency.code()).copied()
    }
}

/// Raw `/coins/{id}/market_chart` payload. Samples arrive oldest first as
/// `[timestamp-ms, price]` pairs.
#[derive(Debug, Deserialize)]
pub struct MarketChart {
    #[serde(default)]
    pub prices: Vec<(f64, f64)>,
}

/// One labelled sample of the historical series, ready for a chart sink.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub label: String,
    pub value: f64,
}

impl MarketChart {
    /// Maps raw samples into labelled points, preserving order.
    pub fn into_points(self) -> Vec<PricePoint> {
        self.prices
            .into_iter()
            .filter_map(|(ts_ms, value)| {
                let dt = Utc.timestamp_millis_opt(ts_ms as i64).single()?;
                Some(PricePoint {
                    label: dt.format("%b %-d").to_string(),
                    value,
                })
            })
            .collect()
    }
}
