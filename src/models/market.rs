//! # models::market
//!
//! Defines [`MarketSnapshot`] — one point-in-time price tile for a symbol.
//!
//! Field names serialise in camelCase and the timestamp as epoch milliseconds
//! so the dashboard reads exactly the shape it renders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Symbol;

/// A single 24h market summary for one trading pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub symbol: Symbol,

    /// Last traded price (quote currency).
    pub price: f64,

    /// Absolute price change over the last 24 hours.
    pub change_24h: f64,

    /// `change_24h / price * 100`, rounded to two decimals.
    pub change_24h_percent: f64,

    /// Traded volume over the last 24 hours.
    pub volume_24h: f64,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl MarketSnapshot {
    /// The change percentage implied by `change_24h` and `price`.
    #[inline]
    pub fn implied_change_percent(&self) -> f64 {
        self.change_24h / self.price * 100.0
    }
}
