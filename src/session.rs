//! Session state container and the detail/chart loader state machine.
//!
//! All mutable dashboard state lives here and is owned by one logical
//! thread: engines stay pure, and every transition happens between
//! suspension points. The loader enforces last-request-wins through the
//! generation carried in each request's cancel token, never through
//! timestamp comparison.

use crate::cancel::{CancelSource, CancelToken};
use crate::error::{FetchError, ValidationError};
use crate::filter::{self, FilterSpec};
use crate::market::{CoinDetail, CoinSnapshot, Currency, PricePoint};
use crate::market_provider::MarketDataProvider;
use crate::portfolio::{HoldingValuation, Portfolio};
use chrono::{DateTime, Utc};
use futures::future::try_join;
use tracing::debug;

/// History window of the chart pane, in days.
pub const CHART_DAYS: u32 = 7;

/// Lifecycle of the detail pane for the selected coin.
#[derive(Debug, Default)]
pub enum DetailState {
    #[default]
    Idle,
    Loading,
    Ready {
        detail: CoinDetail,
        chart: Vec<PricePoint>,
    },
    Errored(String),
}

/// A detail+chart load in flight for one selection. Carries the token it
/// was issued under so a stale outcome can be recognized and dropped.
pub struct DetailRequest {
    pub coin_id: String,
    pub currency: Currency,
    token: CancelToken,
}

impl DetailRequest {
    pub fn new(coin_id: &str, currency: Currency, token: CancelToken) -> Self {
        DetailRequest {
            coin_id: coin_id.to_string(),
            currency,
            token,
        }
    }
}

/// Issues the paired detail+chart requests concurrently and joins them.
/// Either failure discards the other half's result.
pub async fn load_detail(
    provider: &dyn MarketDataProvider,
    request: &DetailRequest,
) -> Result<(CoinDetail, Vec<PricePoint>), FetchError> {
    try_join(
        provider.fetch_detail(&request.coin_id, &request.token),
        provider.fetch_chart(&request.coin_id, request.currency, CHART_DAYS, &request.token),
    )
    .await
}

/// Explicit container for per-session state: the snapshot list, filters,
/// selection, detail pane and holdings.
pub struct Session {
    coins: Vec<CoinSnapshot>,
    filters: FilterSpec,
    selected_coin: Option<String>,
    detail: DetailState,
    portfolio: Portfolio,
    last_updated: Option<DateTime<Utc>>,
    last_error: Option<String>,
    cancel: CancelSource,
}

impl Session {
    pub fn new(filters: FilterSpec) -> Self {
        Session {
            coins: Vec::new(),
            filters,
            selected_coin: None,
            detail: DetailState::Idle,
            portfolio: Portfolio::new(),
            last_updated: None,
            last_error: None,
            cancel: CancelSource::new(),
        }
    }

    pub fn coins(&self) -> &[CoinSnapshot] {
        &self.coins
    }

    /// Derived view of the snapshot list under the current filters.
    pub fn filtered_coins(&self) -> Vec<CoinSnapshot> {
        filter::apply(&self.coins, &self.filters)
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn currency(&self) -> Currency {
        self.filters.currency
    }

    pub fn selected_coin(&self) -> Option<&str> {
        self.selected_coin.as_deref()
    }

    pub fn detail(&self) -> &DetailState {
        &self.detail
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Most recent user-visible fetch failure, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Adding holdings needs live prices to value against.
    pub fn can_add_holding(&self) -> bool {
        !self.coins.is_empty()
    }

    /// Validates and records a user-submitted holding.
    pub fn add_holding(&mut self, coin_id: &str, quantity: &str) -> Result<(), ValidationError> {
        if !self.can_add_holding() {
            return Err(ValidationError(
                "no market data yet; refresh before adding holdings".to_string(),
            ));
        }
        self.portfolio.add_parsed(coin_id, quantity)
    }

    pub fn reset_portfolio(&mut self) {
        self.portfolio.reset();
    }

    /// Current valuation of the holdings, price 0 for coins that dropped
    /// out of the snapshot list.
    pub fn valuations(&self) -> Vec<HoldingValuation> {
        self.portfolio.valuate(&self.coins)
    }

    /// Replaces the snapshot list wholesale. On failure the last-known-good
    /// list stays displayed and the error is surfaced as a message.
    pub async fn refresh_markets(&mut self, provider: &dyn MarketDataProvider) {
        let token = self.cancel.token();
        match provider.fetch_markets(self.filters.currency, &token).await {
            Ok(coins) => {
                self.last_error = None;
                self.last_updated = coins
                    .iter()
                    .find_map(|c| c.last_updated)
                    .or_else(|| Some(Utc::now()));
                self.coins = coins;
                self.sync_selection();
            }
            Err(FetchError::Cancelled) => debug!("market refresh superseded"),
            Err(err) => self.last_error = Some(err.to_string()),
        }
    }

    /// Default-selection policy: keep a selection that survived the
    /// refresh, else fall back to the first coin, else clear.
    fn sync_selection(&mut self) {
        let survives = self
            .selected_coin
            .as_ref()
            .is_some_and(|id| self.coins.iter().any(|c| &c.id == id));
        if !survives {
            self.selected_coin = self.coins.first().map(|c| c.id.clone());
            if self.selected_coin.is_none() {
                self.detail = DetailState::Idle;
            }
        }
    }

    /// Starts a detail+chart load for `coin_id`, superseding any load still
    /// in flight and clearing the displayed detail immediately.
    pub fn begin_detail_load(&mut self, coin_id: &str) -> DetailRequest {
        self.selected_coin = Some(coin_id.to_string());
        self.detail = DetailState::Loading;
        let token = self.cancel.supersede();
        DetailRequest::new(coin_id, self.filters.currency, token)
    }

    /// Applies a load outcome unless the request has been superseded in the
    /// meantime: only the newest request may mutate state.
    pub fn apply_detail_outcome(
        &mut self,
        request: &DetailRequest,
        outcome: Result<(CoinDetail, Vec<PricePoint>), FetchError>,
    ) {
        if request.token.is_cancelled() {
            debug!(coin = %request.coin_id, "dropping superseded detail outcome");
            return;
        }
        match outcome {
            Ok((detail, chart)) => self.detail = DetailState::Ready { detail, chart },
            Err(FetchError::Cancelled) => {}
            Err(err) => self.detail = DetailState::Errored(err.to_string()),
        }
    }

    /// Sequential convenience path: begin, fetch, apply.
    pub async fn select_coin(&mut self, provider: &dyn MarketDataProvider, coin_id: &str) {
        let request = self.begin_detail_load(coin_id);
        let outcome = load_detail(provider, &request).await;
        self.apply_detail_outcome(&request, outcome);
    }

    /// Applies a validated filter spec. A currency change invalidates every
    /// displayed figure, so it supersedes in-flight work and reloads.
    pub async fn apply_filters(&mut self, provider: &dyn MarketDataProvider, spec: FilterSpec) {
        let currency_changed = spec.currency != self.filters.currency;
        self.filters = spec;
        if currency_changed {
            self.cancel.supersede();
            self.refresh(provider).await;
        }
    }

    pub async fn set_currency(&mut self, provider: &dyn MarketDataProvider, currency: Currency) {
        if currency == self.filters.currency {
            return;
        }
        let mut spec = self.filters.clone();
        spec.currency = currency;
        self.apply_filters(provider, spec).await;
    }

    /// Manual refresh: the market list first, then the detail pair for the
    /// current selection, sequentially.
    pub async fn refresh(&mut self, provider: &dyn MarketDataProvider) {
        self.refresh_markets(provider).await;
        match self.selected_coin.clone() {
            Some(id) => self.select_coin(provider, &id).await,
            None => self.detail = DetailState::Idle,
        }
    }
}
