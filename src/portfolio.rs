//! Portfolio valuation engine. Holdings live for the session only and are
//! independent of live prices; their valuation is derived on demand from
//! the current snapshot list and never stored.

use crate::error::ValidationError;
use crate::market::CoinSnapshot;

/// A user-declared quantity of one coin.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub coin_id: String,
    pub quantity: f64,
}

/// Derived value of one holding at current prices.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingValuation {
    pub coin_id: String,
    pub name: String,
    pub symbol: String,
    pub quantity: f64,
    pub current_price: f64,
    pub current_value: f64,
}

/// The holdings set. Survives snapshot refreshes and currency changes;
/// cleared only by an explicit reset.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    holdings: Vec<Holding>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Accumulates quantity onto an existing holding or appends a new one.
    /// The coin id stays unique within the set.
    pub fn add(&mut self, coin_id: &str, quantity: f64) -> Result<(), ValidationError> {
        let coin_id = coin_id.trim();
        if coin_id.is_empty() {
            return Err(ValidationError("coin id must not be empty".to_string()));
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(ValidationError(
                "quantity must be a positive number".to_string(),
            ));
        }

        match self.holdings.iter_mut().find(|h| h.coin_id == coin_id) {
            Some(holding) => holding.quantity += quantity,
            None => self.holdings.push(Holding {
                coin_id: coin_id.to_string(),
                quantity,
            }),
        }
        Ok(())
    }

    /// Parses a user-entered quantity before adding.
    pub fn add_parsed(&mut self, coin_id: &str, quantity: &str) -> Result<(), ValidationError> {
        let parsed: f64 = quantity
            .trim()
            .parse()
            .map_err(|_| ValidationError(format!("'{quantity}' is not a number")))?;
        self.add(coin_id, parsed)
    }

    /// Clears all holdings unconditionally.
    pub fn reset(&mut self) {
        self.holdings.clear();
    }

    /// Values every holding against the current snapshot list. A coin
    /// missing from the list prices at 0; that is not an error.
    pub fn valuate(&self, coins: &[CoinSnapshot]) -> Vec<HoldingValuation> {
        self.holdings
            .iter()
            .map(|holding| {
                let coin = coins.iter().find(|c| c.id == holding.coin_id);
                let current_price = coin.map_or(0.0, |c| c.current_price);
                HoldingValuation {
                    coin_id: holding.coin_id.clone(),
                    name: coin.map_or_else(|| holding.coin_id.clone(), |c| c.name.clone()),
                    symbol: coin.map_or_else(String::new, |c| c.symbol.to_uppercase()),
                    quantity: holding.quantity,
                    current_price,
                    current_value: holding.quantity * current_price,
                }
            })
            .collect()
    }
}

/// Total portfolio value at current prices.
pub fn total(valuations: &[HoldingValuation]) -> f64 {
    valuations.iter().map(|v| v.current_value).sum()
}
