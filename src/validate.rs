//! # validate
//!
//! Pure record validators for the three data shapes the feed produces.
//!
//! ```text
//! record ─┬─ [1] Kind      → every number finite (no NaN / ±inf)
//!         ├─ [2] Range     → 0 < price ≤ MAX_PRICE, 0 ≤ volume ≤ MAX_VOLUME
//!         ├─ [3] Ordering  → OHLC envelope / P&L and % consistency
//!         └─ [4] Freshness → 0 < timestamp ≤ now + MAX_CLOCK_SKEW
//! ```
//!
//! Symbol membership is enforced by the [`Symbol`](crate::models::Symbol)
//! type itself: a record with an unknown pair cannot be constructed or
//! deserialised.
//!
//! `check_*` collects every failed check into a [`ValidationReport`];
//! `validate_*` is the boolean form. Nothing here panics or has side effects.

use chrono::{DateTime, Duration, Utc};

use crate::models::{
    position::{expected_pnl_amount, expected_pnl_percent},
    Candle, MarketSnapshot, Position,
};

pub const MAX_PRICE: f64 = 1_000_000.0;
pub const MAX_VOLUME: f64 = 1_000_000_000_000.0;

/// Absolute tolerance for P&L amount consistency (one cent, covers rounding).
pub const PNL_TOLERANCE: f64 = 0.01;
/// Absolute tolerance (percentage points) for derived percentages.
pub const PERCENT_TOLERANCE: f64 = 0.01;

/// How far into the future a timestamp may sit before it is rejected.
pub fn max_clock_skew() -> Duration {
    Duration::seconds(60)
}

// ─── Report ───────────────────────────────────────────────────────────────────

/// Every check a record failed, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// First failure, for log lines and error messages.
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }

    fn push(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn finite(&mut self, field: &str, value: f64) -> bool {
        if value.is_finite() {
            true
        } else {
            self.push(format!("{field} must be a finite number"));
            false
        }
    }

    fn price(&mut self, field: &str, value: f64) {
        if self.finite(field, value) && (value <= 0.0 || value > MAX_PRICE) {
            self.push(format!("{field} must be between 0 and {MAX_PRICE}"));
        }
    }

    fn volume(&mut self, field: &str, value: f64) {
        if self.finite(field, value) && !(0.0..=MAX_VOLUME).contains(&value) {
            self.push(format!("{field} must be between 0 and {MAX_VOLUME}"));
        }
    }

    fn timestamp(&mut self, field: &str, ts: DateTime<Utc>, now: DateTime<Utc>) {
        if ts.timestamp_millis() <= 0 || ts > now + max_clock_skew() {
            self.push(format!("Invalid {field}"));
        }
    }
}

// ─── MarketSnapshot ───────────────────────────────────────────────────────────

pub fn check_market_snapshot(s: &MarketSnapshot, now: DateTime<Utc>) -> ValidationReport {
    let mut report = ValidationReport::default();

    report.price("price", s.price);
    let change_ok = report.finite("change24h", s.change_24h);
    let pct_ok = report.finite("change24hPercent", s.change_24h_percent);
    report.volume("volume24h", s.volume_24h);
    report.timestamp("timestamp", s.timestamp, now);

    if report.is_valid() && change_ok && pct_ok {
        let implied = s.implied_change_percent();
        if (s.change_24h_percent - implied).abs() > PERCENT_TOLERANCE {
            report.push(format!(
                "change24hPercent {} inconsistent with change24h/price ({implied:.4})",
                s.change_24h_percent
            ));
        }
    }

    report
}

pub fn validate_market_snapshot(s: &MarketSnapshot, now: DateTime<Utc>) -> bool {
    check_market_snapshot(s, now).is_valid()
}

// ─── Candle ───────────────────────────────────────────────────────────────────

pub fn check_candle(c: &Candle, now: DateTime<Utc>) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (field, value) in [("open", c.open), ("high", c.high), ("low", c.low), ("close", c.close)] {
        report.price(field, value);
    }

    // NaN comparisons are false, so a non-finite field never slips through here
    if !(c.high >= c.low) {
        report.push("High must be greater than or equal to low");
    }
    if !(c.high >= c.open && c.high >= c.close) {
        report.push("High must be greater than or equal to both open and close");
    }
    if !(c.low <= c.open && c.low <= c.close) {
        report.push("Low must be less than or equal to both open and close");
    }

    report.volume("volume", c.volume);
    report.timestamp("timestamp", c.timestamp, now);

    report
}

pub fn validate_candle(c: &Candle, now: DateTime<Utc>) -> bool {
    check_candle(c, now).is_valid()
}

// ─── Position ─────────────────────────────────────────────────────────────────

pub fn check_position(p: &Position, now: DateTime<Utc>) -> ValidationReport {
    let mut report = ValidationReport::default();

    if report.finite("quantity", p.quantity) && p.quantity <= 0.0 {
        report.push("Quantity must be positive");
    }
    report.price("costPrice", p.cost_price);
    report.price("currentPrice", p.current_price);
    report.finite("pnlAmount", p.pnl_amount);
    report.finite("pnlPercent", p.pnl_percent);
    report.timestamp("entryTime", p.entry_time, now);
    report.timestamp("timestamp", p.timestamp, now);

    if p.entry_time > p.timestamp {
        report.push("entryTime must not be after timestamp");
    }

    // Consistency only makes sense once every input is in range
    if report.is_valid() {
        let amount = expected_pnl_amount(p.quantity, p.cost_price, p.current_price);
        if (p.pnl_amount - amount).abs() > PNL_TOLERANCE {
            report.push(format!(
                "pnlAmount {} inconsistent with (currentPrice - costPrice) * quantity ({amount:.4})",
                p.pnl_amount
            ));
        }

        let percent = expected_pnl_percent(p.cost_price, p.current_price);
        if (p.pnl_percent - percent).abs() > PERCENT_TOLERANCE {
            report.push(format!(
                "pnlPercent {} inconsistent with price move ({percent:.4})",
                p.pnl_percent
            ));
        }
    }

    report
}

pub fn validate_position(p: &Position, now: DateTime<Utc>) -> bool {
    check_position(p, now).is_valid()
}

// ─── Batch helpers ────────────────────────────────────────────────────────────

pub fn filter_valid_market_snapshots(items: Vec<MarketSnapshot>, now: DateTime<Utc>) -> Vec<MarketSnapshot> {
    items.into_iter().filter(|s| validate_market_snapshot(s, now)).collect()
}

pub fn filter_valid_candles(items: Vec<Candle>, now: DateTime<Utc>) -> Vec<Candle> {
    items.into_iter().filter(|c| validate_candle(c, now)).collect()
}

pub fn filter_valid_positions(items: Vec<Position>, now: DateTime<Utc>) -> Vec<Position> {
    items.into_iter().filter(|p| validate_position(p, now)).collect()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Symbol;

    fn make_candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: Utc::now() - Duration::hours(1),
            open,
            high,
            low,
            close,
            volume: 1_000.0,
        }
    }

    fn make_snapshot(price: f64, change: f64, pct: f64) -> MarketSnapshot {
        MarketSnapshot {
            symbol: Symbol::BtcUsdt,
            price,
            change_24h: change,
            change_24h_percent: pct,
            volume_24h: 5_000_000.0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_valid_candle() {
        assert!(validate_candle(&make_candle(100.0, 105.0, 98.0, 103.0), Utc::now()));
    }

    #[test]
    fn test_high_below_low_rejected() {
        let report = check_candle(&make_candle(100.0, 95.0, 99.0, 97.0), Utc::now());
        assert!(!report.is_valid());
        assert_eq!(report.first_error(), Some("High must be greater than or equal to low"));
    }

    #[test]
    fn test_low_above_close_rejected() {
        assert!(!validate_candle(&make_candle(100.0, 105.0, 101.0, 100.5), Utc::now()));
    }

    #[test]
    fn test_nan_candle_rejected() {
        assert!(!validate_candle(&make_candle(100.0, f64::NAN, 98.0, 101.0), Utc::now()));
    }

    #[test]
    fn test_negative_volume_rejected() {
        let mut candle = make_candle(100.0, 105.0, 98.0, 103.0);
        candle.volume = -1.0;
        assert!(!validate_candle(&candle, Utc::now()));
    }

    #[test]
    fn test_future_timestamp_rejected() {
        let now = Utc::now();
        let mut candle = make_candle(100.0, 105.0, 98.0, 103.0);
        candle.timestamp = now + Duration::seconds(30);
        assert!(validate_candle(&candle, now), "inside skew tolerance");
        candle.timestamp = now + Duration::minutes(5);
        assert!(!validate_candle(&candle, now));
    }

    #[test]
    fn test_snapshot_percent_consistency() {
        let now = Utc::now();
        assert!(validate_market_snapshot(&make_snapshot(50_000.0, 500.0, 1.0), now));
        assert!(!validate_market_snapshot(&make_snapshot(50_000.0, 500.0, 4.0), now));
    }

    #[test]
    fn test_snapshot_price_bounds() {
        let now = Utc::now();
        assert!(!validate_market_snapshot(&make_snapshot(0.0, 0.0, 0.0), now));
        assert!(!validate_market_snapshot(&make_snapshot(MAX_PRICE * 2.0, 0.0, 0.0), now));
    }

    #[test]
    fn test_position_consistency() {
        let now = Utc::now();
        let good = Position::new(Symbol::BtcUsdt, 0.5, 48_000.0, 51_200.0, now - Duration::days(7), now);
        assert!(validate_position(&good, now));

        let mut bad = good.clone();
        bad.pnl_percent = 3.33; // should be 6.67
        let report = check_position(&bad, now);
        assert!(!report.is_valid());
        assert!(report.first_error().unwrap().starts_with("pnlPercent"));
    }

    #[test]
    fn test_position_entry_after_mark_rejected() {
        let now = Utc::now();
        let pos = Position::new(Symbol::SolUsdt, 100.0, 95.0, 108.0, now, now - Duration::hours(1));
        assert!(!validate_position(&pos, now));
    }

    #[test]
    fn test_filter_drops_invalid() {
        let now = Utc::now();
        let kept = filter_valid_candles(
            vec![
                make_candle(100.0, 105.0, 98.0, 103.0),
                make_candle(100.0, 95.0, 99.0, 97.0),
            ],
            now,
        );
        assert_eq!(kept.len(), 1);

        let snapshots = filter_valid_market_snapshots(
            vec![make_snapshot(50_000.0, 500.0, 1.0), make_snapshot(-5.0, 0.0, 0.0)],
            now,
        );
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].price, 50_000.0);

        let good = Position::new(Symbol::BtcUsdt, 0.5, 48_000.0, 51_200.0, now - Duration::days(7), now);
        let mut bad = good.clone();
        bad.quantity = -1.0;
        let positions = filter_valid_positions(vec![bad, good.clone()], now);
        assert_eq!(positions, vec![good]);
    }
}
