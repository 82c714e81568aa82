//! Filter/sort engine over the coin snapshot list. Pure and synchronous:
//! recomputed from scratch whenever the list or the filter spec changes.

use crate::error::ValidationError;
use crate::market::{CoinSnapshot, Currency};

/// User-submitted filter criteria, validated before acceptance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub keyword: String,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub currency: Currency,
    pub positive_change_only: bool,
}

impl FilterSpec {
    /// Rejects a spec whose bounds are out of order. Violating input is
    /// never silently corrected.
    pub fn new(
        keyword: impl Into<String>,
        min_price: Option<f64>,
        max_price: Option<f64>,
        currency: Currency,
        positive_change_only: bool,
    ) -> Result<Self, ValidationError> {
        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                return Err(ValidationError(
                    "minimum price cannot be greater than maximum price".to_string(),
                ));
            }
        }
        Ok(FilterSpec {
            keyword: keyword.into(),
            min_price,
            max_price,
            currency,
            positive_change_only,
        })
    }
}

/// Applies every predicate (ANDed) and orders the matches ascending by
/// market-cap rank. The sort is stable and a missing rank sorts last, so
/// unranked coins keep their input order at the tail.
pub fn apply(coins: &[CoinSnapshot], spec: &FilterSpec) -> Vec<CoinSnapshot> {
    let keyword = spec.keyword.trim().to_lowercase();

    let mut matches: Vec<CoinSnapshot> = coins
        .iter()
        .filter(|coin| {
            let matches_keyword = keyword.is_empty()
                || coin.name.to_lowercase().contains(&keyword)
                || coin.symbol.to_lowercase().contains(&keyword);
            let matches_min = spec.min_price.is_none_or(|min| coin.current_price >= min);
            let matches_max = spec.max_price.is_none_or(|max| coin.current_price <= max);
            let matches_change = !spec.positive_change_only || coin.change_24h() > 0.0;

            matches_keyword && matches_min && matches_max && matches_change
        })
        .cloned()
        .collect();

    matches.sort_by_key(|coin| coin.market_cap_rank.map_or(u32::MAX, |rank| rank));
    matches
}
