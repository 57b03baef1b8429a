//! # service
//!
//! **Data access facade** — Generator + Validator + Cache behind three reads.
//!
//! ```text
//! market_snapshot() ─┐
//! candles(s, tf, n) ─┼─▶ cache hit? ──yes──▶ Arc<Vec<_>> (same allocation)
//! positions()       ─┘        │
//!                             no
//!                             ▼
//!                    generate + validate ──err──▶ DataError (INVALID_*)
//!                             │
//!                             ▼
//!                      cache.set(ttl) ──▶ Arc<Vec<_>>
//! ```
//!
//! The async `fetch_*` variants (the [`MarketFeed`] impl) wrap the sync reads
//! with the optional simulated latency and a hard timeout, and never fail:
//! every error is folded into an [`ApiResponse`] with `success: false`.
//!
//! Instances are built explicitly by the composition root (`state`) and
//! handed around as `Arc<MarketDataService>` — there is no global.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use crate::cache::{CacheStats, TtlCache};
use crate::error::{DataError, ErrorCode};
use crate::generator::MarketGenerator;
use crate::models::{ApiResponse, Candle, MarketSnapshot, Position, Symbol, Timeframe};

pub type Snapshots = Arc<Vec<MarketSnapshot>>;
pub type Candles = Arc<Vec<Candle>>;
pub type Positions = Arc<Vec<Position>>;

// ─── MarketFeed ───────────────────────────────────────────────────────────────

/// The asynchronous read surface the refresh controller consumes.
///
/// Implementations must not fail: errors come back as `success: false`
/// envelopes.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    async fn fetch_market_snapshot(&self) -> ApiResponse<Snapshots>;

    async fn fetch_candles(&self, symbol: Symbol, timeframe: Timeframe, limit: usize) -> ApiResponse<Candles>;

    async fn fetch_positions(&self) -> ApiResponse<Positions>;
}

// ─── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Snapshots change every tick — keep them briefly.
    pub market_ttl: Duration,
    pub candle_ttl: Duration,
    /// Holdings move slowly.
    pub position_ttl: Duration,
    /// Upper bound on any single async read.
    pub fetch_timeout: Duration,
    /// Artificial delay before each async read (0 = none).
    pub simulated_latency: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            market_ttl: Duration::from_secs(2),
            candle_ttl: Duration::from_secs(2),
            position_ttl: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(10),
            simulated_latency: Duration::ZERO,
        }
    }
}

// ─── Service ──────────────────────────────────────────────────────────────────

/// Request signature for the candle cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CandleKey {
    symbol: Symbol,
    timeframe: Timeframe,
    limit: usize,
}

/// Everything behind the single lock: generation and insert happen under one
/// guard, so two readers never generate the same key twice.
struct Inner {
    generator: MarketGenerator,
    market: TtlCache<(), Snapshots>,
    candles: TtlCache<CandleKey, Candles>,
    positions: TtlCache<(), Positions>,
}

pub struct MarketDataService {
    inner: Mutex<Inner>,
    config: ServiceConfig,
}

impl MarketDataService {
    pub fn new(generator: MarketGenerator, config: ServiceConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                generator,
                market: TtlCache::new(),
                candles: TtlCache::new(),
                positions: TtlCache::new(),
            }),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, DataError> {
        self.inner
            .lock()
            .map_err(|_| DataError::unknown("Market data state poisoned by an earlier panic"))
    }

    // ── Synchronous reads ─────────────────────────────────────────────────────

    pub fn market_snapshot(&self) -> Result<Snapshots, DataError> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;

        if let Some(hit) = inner.market.get(&()) {
            debug!("market snapshot cache hit");
            return Ok(hit);
        }

        let fresh = Arc::new(inner.generator.market_snapshots(Utc::now())?);
        inner.market.set((), Arc::clone(&fresh), self.config.market_ttl);
        debug!(count = fresh.len(), "market snapshot regenerated");
        Ok(fresh)
    }

    pub fn candles(&self, symbol: Symbol, timeframe: Timeframe, limit: usize) -> Result<Candles, DataError> {
        let key = CandleKey { symbol, timeframe, limit };
        let mut guard = self.lock()?;
        let inner = &mut *guard;

        if let Some(hit) = inner.candles.get(&key) {
            debug!(%symbol, %timeframe, limit, "candle cache hit");
            return Ok(hit);
        }

        let fresh = Arc::new(inner.generator.candles(symbol, timeframe, limit, Utc::now())?);
        inner.candles.set(key, Arc::clone(&fresh), self.config.candle_ttl);
        debug!(%symbol, %timeframe, limit, "candles regenerated");
        Ok(fresh)
    }

    pub fn positions(&self) -> Result<Positions, DataError> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;

        if let Some(hit) = inner.positions.get(&()) {
            debug!("positions cache hit");
            return Ok(hit);
        }

        let fresh = Arc::new(inner.generator.positions(Utc::now())?);
        inner.positions.set((), Arc::clone(&fresh), self.config.position_ttl);
        debug!(count = fresh.len(), "positions regenerated");
        Ok(fresh)
    }

    // ── Cache management ──────────────────────────────────────────────────────

    /// Drop every cached result so the next reads regenerate.
    pub fn invalidate_all(&self) -> Result<(), DataError> {
        let mut inner = self.lock()?;
        inner.market.clear();
        inner.candles.clear();
        inner.positions.clear();
        debug!("all caches invalidated");
        Ok(())
    }

    pub fn cache_stats(&self) -> Result<CacheStats, DataError> {
        let inner = self.lock()?;
        Ok(inner
            .market
            .stats()
            .merge(inner.candles.stats())
            .merge(inner.positions.stats()))
    }

    // ── Async plumbing ────────────────────────────────────────────────────────

    /// Latency → sync read, bounded by `fetch_timeout`, folded into an envelope.
    async fn guarded<T, F>(&self, op: &'static str, read: F) -> ApiResponse<T>
    where
        T: Default,
        F: FnOnce() -> Result<T, DataError> + Send,
    {
        let latency = self.config.simulated_latency;
        let work = async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            read()
        };

        let result = match tokio::time::timeout(self.config.fetch_timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(DataError::new(
                ErrorCode::TimeoutError,
                format!("{op} timed out after {:?}", self.config.fetch_timeout),
            )),
        };

        if let Err(err) = &result {
            warn!(op, code = %err.code, error = %err.message, "data read failed");
        }
        result.into()
    }
}

#[async_trait]
impl MarketFeed for MarketDataService {
    async fn fetch_market_snapshot(&self) -> ApiResponse<Snapshots> {
        self.guarded("market snapshot", || self.market_snapshot()).await
    }

    async fn fetch_candles(&self, symbol: Symbol, timeframe: Timeframe, limit: usize) -> ApiResponse<Candles> {
        self.guarded("candles", move || self.candles(symbol, timeframe, limit)).await
    }

    async fn fetch_positions(&self) -> ApiResponse<Positions> {
        self.guarded("positions", || self.positions()).await
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_candle;

    fn make_service() -> MarketDataService {
        MarketDataService::new(MarketGenerator::from_seed(42), ServiceConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_within_ttl_are_cached() {
        let svc = make_service();
        let a = svc.market_snapshot().unwrap();
        let b = svc.market_snapshot().unwrap();
        assert!(Arc::ptr_eq(&a, &b), "second read must not regenerate");

        let p1 = svc.positions().unwrap();
        let p2 = svc.positions().unwrap();
        assert!(Arc::ptr_eq(&p1, &p2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_btc_hourly_candles_cached_then_regenerated() {
        let svc = make_service();
        let first = svc.candles(Symbol::BtcUsdt, Timeframe::OneHour, 3).unwrap();

        tokio::time::advance(Duration::from_millis(900)).await;
        let second = svc.candles(Symbol::BtcUsdt, Timeframe::OneHour, 3).unwrap();
        assert_eq!(first.len(), 3);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);

        tokio::time::advance(Duration::from_secs(3)).await;
        let third = svc.candles(Symbol::BtcUsdt, Timeframe::OneHour, 3).unwrap();
        assert_eq!(third.len(), 3);
        assert_ne!(*first, *third, "expired entry must be regenerated");
        let now = Utc::now();
        assert!(third.iter().all(|c| validate_candle(c, now)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_positions_outlive_snapshots() {
        let svc = make_service();
        let m1 = svc.market_snapshot().unwrap();
        let p1 = svc.positions().unwrap();

        tokio::time::advance(Duration::from_secs(3)).await;
        let m2 = svc.market_snapshot().unwrap();
        let p2 = svc.positions().unwrap();
        assert!(!Arc::ptr_eq(&m1, &m2));
        assert!(Arc::ptr_eq(&p1, &p2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_candle_keys_are_independent() {
        let svc = make_service();
        let btc = svc.candles(Symbol::BtcUsdt, Timeframe::OneHour, 5).unwrap();
        let eth = svc.candles(Symbol::EthUsdt, Timeframe::OneHour, 5).unwrap();
        let btc_more = svc.candles(Symbol::BtcUsdt, Timeframe::OneHour, 6).unwrap();
        assert!(!Arc::ptr_eq(&btc, &eth));
        assert_eq!(btc_more.len(), 6);
        assert_eq!(svc.cache_stats().unwrap().entries, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_regeneration() {
        let svc = make_service();
        let a = svc.market_snapshot().unwrap();
        svc.invalidate_all().unwrap();
        let b = svc.market_snapshot().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_invalid_limit_surfaces_typed_error() {
        let err = make_service().candles(Symbol::BtcUsdt, Timeframe::OneHour, 0).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_async_wrapper_folds_errors() {
        let svc = make_service();
        let resp = svc.fetch_candles(Symbol::BtcUsdt, Timeframe::OneHour, 0).await;
        assert!(!resp.success);
        assert!(resp.data.is_empty());
        assert_eq!(resp.code, Some(ErrorCode::ValidationError));

        let resp = svc.fetch_market_snapshot().await;
        assert!(resp.success);
        assert_eq!(resp.data.len(), Symbol::ALL.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_read_times_out() {
        let svc = MarketDataService::new(
            MarketGenerator::from_seed(1),
            ServiceConfig {
                fetch_timeout: Duration::from_millis(100),
                simulated_latency: Duration::from_secs(1),
                ..ServiceConfig::default()
            },
        );
        let resp = svc.fetch_positions().await;
        assert!(!resp.success);
        assert_eq!(resp.code, Some(ErrorCode::TimeoutError));
    }
}
