//! CoinGecko REST client. Thin by design: URL building, the tier-dependent
//! API-key header, and normalization of failures into `FetchError`.

use crate::cancel::CancelToken;
use crate::error::FetchError;
use crate::market::{CoinDetail, CoinSnapshot, Currency, MarketChart, PricePoint};
use crate::market_provider::MarketDataProvider;
use crate::providers::util::with_retry;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

const PRO_HOST: &str = "pro-api.coingecko.com";
const DEMO_KEY_HEADER: &str = "x-cg-demo-api-key";
const PRO_KEY_HEADER: &str = "x-cg-pro-api-key";

pub struct CoinGeckoProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, api_key: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("coindeck/0.1")
            .build()?;
        Ok(CoinGeckoProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client,
        })
    }

    /// Header name depends on the endpoint tier.
    fn key_header(&self) -> &'static str {
        if self.base_url.contains(PRO_HOST) {
            PRO_KEY_HEADER
        } else {
            DEMO_KEY_HEADER
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        token: &CancelToken,
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%url, "requesting CoinGecko data");

        let mut request = self.client.get(&url).query(params);
        if let Some(key) = &self.api_key {
            request = request.header(self.key_header(), key);
        }

        let response = tokio::select! {
            _ = token.cancelled() => return Err(FetchError::Cancelled),
            result = request.send() => {
                result.map_err(|e| FetchError::Network(e.to_string()))?
            }
        };

        let status = response.status();
        let body = tokio::select! {
            _ = token.cancelled() => return Err(FetchError::Cancelled),
            result = response.text() => {
                result.map_err(|e| FetchError::Network(e.to_string()))?
            }
        };

        if !status.is_success() {
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: normalize_error_message(&body, status.as_u16()),
            });
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Message preference order: the API's structured `error` field, then
/// `message`, then the raw body, then a generic fallback.
fn normalize_error_message(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = value.get("error").and_then(|v| v.as_str()) {
            return msg.to_string();
        }
        if let Some(msg) = value.get("message").and_then(|v| v.as_str()) {
            return msg.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("failed to fetch CoinGecko data ({status})")
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    #[instrument(name = "MarketsFetch", skip(self, token), fields(currency = %currency))]
    async fn fetch_markets(
        &self,
        currency: Currency,
        token: &CancelToken,
    ) -> Result<Vec<CoinSnapshot>, FetchError> {
        let params = [
            ("vs_currency", currency.code()),
            ("order", "market_cap_desc"),
            ("per_page", "100"),
            ("page", "1"),
            ("sparkline", "false"),
            ("price_change_percentage", "24h"),
        ];
        // Transient transport errors are retried; API errors are not.
        with_retry(|| self.get_json("coins/markets", &params, token), 2, 500).await
    }

    #[instrument(name = "DetailFetch", skip(self, token), fields(coin = %coin_id))]
    async fn fetch_detail(
        &self,
        coin_id: &str,
        token: &CancelToken,
    ) -> Result<CoinDetail, FetchError> {
        let path = format!("coins/{coin_id}");
        let params = [
            ("localization", "false"),
            ("tickers", "false"),
            ("market_data", "true"),
            ("community_data", "false"),
            ("developer_data", "false"),
            ("sparkline", "false"),
        ];
        self.get_json(&path, &params, token).await
    }

    #[instrument(name = "ChartFetch", skip(self, token), fields(coin = %coin_id, currency = %currency))]
    async fn fetch_chart(
        &self,
        coin_id: &str,
        currency: Currency,
        days: u32,
        token: &CancelToken,
    ) -> Result<Vec<PricePoint>, FetchError> {
        let path = format!("coins/{coin_id}/market_chart");
        let days = days.to_string();
        let params = [("vs_currency", currency.code()), ("days", days.as_str())];
        let chart: MarketChart = self.get_json(&path, &params, token).await?;
        Ok(chart.into_points())
    }
}
