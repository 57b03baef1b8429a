//! # models::position
//!
//! Defines [`Position`] — a row of the simulated holdings table.
//!
//! P&L is always derived from the prices and quantity, never set
//! independently, so [`Position::new`] is the only constructor the
//! generator uses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Symbol;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: Symbol,
    pub quantity: f64,
    /// Average entry price.
    pub cost_price: f64,
    /// Mark price at `timestamp`.
    pub current_price: f64,
    /// `(current_price - cost_price) * quantity`
    pub pnl_amount: f64,
    /// `(current_price - cost_price) / cost_price * 100`
    pub pnl_percent: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub entry_time: DateTime<Utc>,
    /// When the position was marked.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Position {
    /// Build a position marked at `current_price`, deriving both P&L fields
    /// (rounded to cents / basis points of a percent).
    pub fn new(
        symbol: Symbol,
        quantity: f64,
        cost_price: f64,
        current_price: f64,
        entry_time: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let pnl_amount = round2(expected_pnl_amount(quantity, cost_price, current_price));
        let pnl_percent = round2(expected_pnl_percent(cost_price, current_price));

        Self {
            symbol,
            quantity,
            cost_price,
            current_price,
            pnl_amount,
            pnl_percent,
            entry_time,
            timestamp,
        }
    }

    /// Position notional at the mark price.
    #[inline]
    pub fn market_value(&self) -> f64 {
        self.current_price * self.quantity
    }

    #[inline]
    pub fn is_profitable(&self) -> bool {
        self.pnl_amount >= 0.0
    }
}

pub fn expected_pnl_amount(quantity: f64, cost_price: f64, current_price: f64) -> f64 {
    (current_price - cost_price) * quantity
}

pub fn expected_pnl_percent(cost_price: f64, current_price: f64) -> f64 {
    (current_price - cost_price) / cost_price * 100.0
}

/// Round to two decimals the way every price on the dashboard is displayed.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
