//! The market-data collaborator behind a trait, so engines and the session
//! can be exercised against mocks.

use crate::cancel::CancelToken;
use crate::error::FetchError;
use crate::market::{CoinDetail, CoinSnapshot, Currency, PricePoint};
use async_trait::async_trait;

/// Every call carries a cancel token; a superseded call resolves to
/// `FetchError::Cancelled`, which callers must treat as a no-op.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Top coins ordered by market cap, quoted in `currency`.
    async fn fetch_markets(
        &self,
        currency: Currency,
        token: &CancelToken,
    ) -> Result<Vec<CoinSnapshot>, FetchError>;

    /// Rich record for one coin.
    async fn fetch_detail(
        &self,
        coin_id: &str,
        token: &CancelToken,
    ) -> Result<CoinDetail, FetchError>;

    /// Historical price series for one coin, oldest first.
    async fn fetch_chart(
        &self,
        coin_id: &str,
        currency: Currency,
        days: u32,
        token: &CancelToken,
    ) -> Result<Vec<PricePoint>, FetchError>;
}
