//! # generator
//!
//! **Synthetic market feed** — produces internally consistent mock records for
//! the fixed symbol set.
//!
//! ## Randomness
//!
//! The generator owns a seedable [`StdRng`]. Production builds seed it from OS
//! entropy (or `GENERATOR_SEED`), tests pin it with [`MarketGenerator::from_seed`]
//! so every sequence is reproducible.
//!
//! ## Candles
//!
//! ```text
//! reference price ─▶ [open₀ close₀] ─▶ [open₁=close₀ close₁] ─▶ ...
//!                      wick ≤ ½·vol      wick ≤ ½·vol
//! vol = 2% of the running price
//! ```
//!
//! High and low are built to enclose open/close, so the OHLC envelope holds by
//! construction. Every record still goes through [`crate::validate`] before it
//! leaves this module; a failure there means a generator bug and is raised as
//! a typed error rather than silently dropped.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, warn};

use crate::error::{DataError, ErrorCode};
use crate::models::{position::round2, Candle, MarketSnapshot, Position, Symbol, Timeframe};
use crate::validate::{check_candle, check_market_snapshot, check_position, ValidationReport};

/// Reference price every symbol is quoted around.
pub const BASE_PRICE: f64 = 50_000.0;

pub const DEFAULT_CANDLE_LIMIT: usize = 500;
pub const MAX_CANDLE_LIMIT: usize = 1_000;

/// Max distance of a snapshot price from its reference.
const SNAPSHOT_PRICE_SPREAD: f64 = 1_000.0;
/// Max absolute 24h change.
const SNAPSHOT_CHANGE_SPREAD: f64 = 2_000.0;
const SNAPSHOT_MAX_VOLUME: f64 = 1_000_000_000.0;

/// Candle volatility as a fraction of the running price.
const CANDLE_VOLATILITY: f64 = 0.02;
const CANDLE_MAX_VOLUME: f64 = 10_000_000.0;

/// Max mark-to-market drift of a holding from its cost price.
const POSITION_DRIFT: f64 = 0.30;

// ─── Symbol table ─────────────────────────────────────────────────────────────

/// Reference price of `symbol` — [`BASE_PRICE`] plus a per-pair offset.
pub fn reference_price(symbol: Symbol) -> f64 {
    let offset = match symbol {
        Symbol::EthUsdt => -30_000.0,
        Symbol::BtcUsdt | Symbol::BnbUsdt | Symbol::SolUsdt | Symbol::AdaUsdt => 0.0,
    };
    BASE_PRICE + offset
}

/// A simulated holding: what was bought, at what cost, how long ago.
struct Holding {
    symbol: Symbol,
    quantity: f64,
    cost_price: f64,
    age_days: i64,
}

const HOLDINGS: [Holding; 3] = [
    Holding { symbol: Symbol::BtcUsdt, quantity: 0.5, cost_price: 48_000.0, age_days: 7 },
    Holding { symbol: Symbol::EthUsdt, quantity: 10.0, cost_price: 2_800.0, age_days: 3 },
    Holding { symbol: Symbol::SolUsdt, quantity: 100.0, cost_price: 95.0, age_days: 1 },
];

// ─── Generator ────────────────────────────────────────────────────────────────

pub struct MarketGenerator {
    rng: StdRng,
}

impl MarketGenerator {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Deterministic generator — same seed, same sequence of records.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Uniform sample in `[-0.5, 0.5)`.
    #[inline]
    fn centered(&mut self) -> f64 {
        self.rng.gen::<f64>() - 0.5
    }

    // ── Market snapshots ──────────────────────────────────────────────────────

    /// One snapshot per supported symbol, all stamped `now`.
    pub fn market_snapshots(&mut self, now: DateTime<Utc>) -> Result<Vec<MarketSnapshot>, DataError> {
        let snapshots = Symbol::ALL
            .iter()
            .map(|&symbol| {
                let price = round2(reference_price(symbol) + self.centered() * SNAPSHOT_PRICE_SPREAD);
                let change_24h = round2(self.centered() * SNAPSHOT_CHANGE_SPREAD);
                let volume_24h = round2(self.rng.gen::<f64>() * SNAPSHOT_MAX_VOLUME);

                MarketSnapshot {
                    symbol,
                    price,
                    change_24h,
                    change_24h_percent: round2(change_24h / price * 100.0),
                    volume_24h,
                    timestamp: now,
                }
            })
            .collect::<Vec<_>>();

        ensure_valid(&snapshots, ErrorCode::InvalidMarketData, "market snapshot", |s| {
            check_market_snapshot(s, now)
        })?;

        debug!(count = snapshots.len(), "market snapshots generated");
        Ok(snapshots)
    }

    // ── Candles ───────────────────────────────────────────────────────────────

    /// `limit` bars ending at `now`, oldest first, as one closed random walk.
    pub fn candles(
        &mut self,
        symbol: Symbol,
        timeframe: Timeframe,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<Candle>, DataError> {
        if limit == 0 || limit > MAX_CANDLE_LIMIT {
            return Err(DataError::validation(format!(
                "Candle limit must be between 1 and {MAX_CANDLE_LIMIT}, got {limit}"
            )));
        }

        let interval = timeframe.interval();
        let mut current = reference_price(symbol);
        let mut candles = Vec::with_capacity(limit);

        for back in (0..limit).rev() {
            let timestamp = now - step_back(interval, back);
            let volatility = current * CANDLE_VOLATILITY;

            let open = current;
            let close = round2(open + self.centered() * volatility);
            let body_high = open.max(close);
            let body_low = open.min(close);
            // Rounding must never pull a wick inside the body
            let high = round2(body_high + self.rng.gen::<f64>() * volatility * 0.5).max(body_high);
            let low = round2(body_low - self.rng.gen::<f64>() * volatility * 0.5).min(body_low);
            let volume = round2(self.rng.gen::<f64>() * CANDLE_MAX_VOLUME);

            candles.push(Candle { timestamp, open, high, low, close, volume });
            current = close;
        }

        ensure_valid(&candles, ErrorCode::InvalidCandleData, "candle", |c| check_candle(c, now))?;

        debug!(%symbol, %timeframe, limit, last_close = current, "candles generated");
        Ok(candles)
    }

    // ── Positions ─────────────────────────────────────────────────────────────

    /// The holdings book marked to a fresh simulated price.
    pub fn positions(&mut self, now: DateTime<Utc>) -> Result<Vec<Position>, DataError> {
        let positions = HOLDINGS
            .iter()
            .map(|h| {
                let current_price = round2(h.cost_price * (1.0 + self.centered() * POSITION_DRIFT));
                Position::new(
                    h.symbol,
                    h.quantity,
                    h.cost_price,
                    current_price,
                    now - Duration::days(h.age_days),
                    now,
                )
            })
            .collect::<Vec<_>>();

        ensure_valid(&positions, ErrorCode::InvalidPosition, "position", |p| check_position(p, now))?;

        debug!(count = positions.len(), "positions generated");
        Ok(positions)
    }
}

/// Fail the whole batch with `code` on the first record `check` rejects.
fn ensure_valid<T>(
    items: &[T],
    code: ErrorCode,
    kind: &str,
    check: impl Fn(&T) -> ValidationReport,
) -> Result<(), DataError> {
    for (idx, item) in items.iter().enumerate() {
        let report = check(item);
        if let Some(reason) = report.first_error() {
            warn!(kind, idx, %reason, "generated record failed validation");
            return Err(DataError::new(
                code,
                format!("Generated {kind} #{idx} failed validation: {reason}"),
            ));
        }
    }
    Ok(())
}

/// `interval * n` without overflowing `i32` multipliers.
fn step_back(interval: Duration, n: usize) -> Duration {
    Duration::milliseconds(interval.num_milliseconds() * n as i64)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
