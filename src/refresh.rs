//! # refresh
//!
//! **Refresh Controller** — polls the [`MarketFeed`] on a fixed cadence and on
//! demand, and owns the single [`RefreshState`] the dashboard renders.
//!
//! ## State machine
//!
//! ```text
//!            start / refresh
//!   ┌──────┐ ─────────────▶ ┌─────────┐  all 3 reads ok   ┌───────┐
//!   │ idle │                │ loading │ ────────────────▶ │ ready │
//!   └──────┘                └─────────┘                   └───────┘
//!                             ▲     │ any read fails          │
//!              tick / retry   │     ▼                         │ tick / refresh
//!                           ┌───────┐ ◀───────────────────────┘
//!                           │ error │   (last good data kept)
//!                           └───────┘
//! ```
//!
//! ## Superseded attempts
//!
//! Every attempt gets a monotonically increasing generation and its own
//! [`CancellationToken`]. Starting a new attempt cancels the previous token.
//! An attempt checks its token while waiting on the feed, and again — together
//! with its generation — under the state write lock before committing. A
//! superseded attempt therefore never touches the state, whatever order the
//! feed resolves in. An attempt cancelled by [`RefreshController::stop`] with
//! nothing newer behind it rolls the phase back to what it was before it began.
//!
//! ## Polling
//!
//! One `tokio::time::interval` per controller (`MissedTickBehavior::Skip`).
//! Each tick spawns a fresh attempt without waiting for the previous one; the
//! newer attempt supersedes the older. [`RefreshController::start`] refuses to
//! spawn a second poller while one is running.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{DataError, ErrorCode};
use crate::events::WsEvent;
use crate::generator::DEFAULT_CANDLE_LIMIT;
use crate::models::{Symbol, Timeframe};
use crate::service::{Candles, MarketFeed, Positions, Snapshots};

// ─── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Polling cadence.
    pub interval: Duration,
    /// Initial chart selection.
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub candle_limit: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            symbol: Symbol::BtcUsdt,
            timeframe: Timeframe::OneHour,
            candle_limit: DEFAULT_CANDLE_LIMIT,
        }
    }
}

// ─── State ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPhase {
    Idle,
    Loading,
    Ready,
    Error,
}

/// The three collections a dashboard frame is built from.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub market: Snapshots,
    pub candles: Candles,
    pub positions: Positions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl From<&DataError> for ErrorInfo {
    fn from(err: &DataError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// Everything the presentation layer reads. Only the controller writes it;
/// readers always get a clone.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshState {
    pub phase: RefreshPhase,
    pub data: DashboardData,
    pub is_loading: bool,
    pub error: Option<ErrorInfo>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Attempts started from the error phase since the last success.
    pub retry_count: u32,
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub candle_limit: usize,
    /// Generation of the most recently started attempt.
    pub generation: u64,
}

impl RefreshState {
    fn new(config: &RefreshConfig) -> Self {
        Self {
            phase: RefreshPhase::Idle,
            data: DashboardData::default(),
            is_loading: false,
            error: None,
            last_updated: None,
            retry_count: 0,
            symbol: config.symbol,
            timeframe: config.timeframe,
            candle_limit: config.candle_limit,
            generation: 0,
        }
    }
}

// ─── Outcome ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The attempt was current when it finished and wrote the state.
    Committed(RefreshPhase),
    /// A newer attempt started first; nothing was written.
    Superseded,
    /// Cancelled by [`RefreshController::stop`] while still the newest
    /// attempt; the state was rolled back to where it was before it began.
    Cancelled,
}

/// What an attempt captured when it started.
struct Attempt {
    generation: u64,
    token: CancellationToken,
    symbol: Symbol,
    timeframe: Timeframe,
    limit: usize,
    /// Restored if the attempt is cancelled without being superseded.
    prior_phase: RefreshPhase,
    prior_retry_count: u32,
}

struct Poller {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

// ─── Controller ───────────────────────────────────────────────────────────────

pub struct RefreshController {
    feed: Arc<dyn MarketFeed>,
    config: RefreshConfig,
    state: RwLock<RefreshState>,
    generation: AtomicU64,
    /// Generation + token of the newest attempt; the token is cancelled when
    /// the next one starts.
    in_flight: Mutex<Option<(u64, CancellationToken)>>,
    poller: Mutex<Option<Poller>>,
    events: broadcast::Sender<String>,
}

impl RefreshController {
    pub fn new(feed: Arc<dyn MarketFeed>, config: RefreshConfig, events: broadcast::Sender<String>) -> Self {
        Self {
            state: RwLock::new(RefreshState::new(&config)),
            feed,
            config,
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
            poller: Mutex::new(None),
            events,
        }
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Clone of the current state.
    pub async fn state(&self) -> RefreshState {
        self.state.read().await.clone()
    }

    /// Receiver for the JSON events this controller publishes.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.events.subscribe()
    }

    fn publish(&self, event: &WsEvent) {
        // Err only means nobody is listening
        let _ = self.events.send(event.to_json());
    }

    // ── One attempt ───────────────────────────────────────────────────────────

    /// Run one refresh attempt to completion.
    ///
    /// Starting it supersedes any attempt still in flight.
    pub async fn refresh(&self) -> RefreshOutcome {
        let attempt = self.begin().await;
        self.publish(&WsEvent::RefreshStarted {
            generation: attempt.generation,
        });

        let feed = Arc::clone(&self.feed);
        let fetch = async {
            let (market, candles, positions) = tokio::join!(
                feed.fetch_market_snapshot(),
                feed.fetch_candles(attempt.symbol, attempt.timeframe, attempt.limit),
                feed.fetch_positions(),
            );
            Ok::<_, DataError>(DashboardData {
                market: market.into_result()?,
                candles: candles.into_result()?,
                positions: positions.into_result()?,
            })
        };

        let result = tokio::select! {
            biased;
            _ = attempt.token.cancelled() => {
                debug!(generation = attempt.generation, "refresh cancelled while fetching");
                return self.abandon(&attempt).await;
            }
            result = fetch => result,
        };

        self.commit(&attempt, result).await
    }

    /// Allocate a generation, cancel the previous attempt, enter `loading`.
    async fn begin(&self) -> Attempt {
        let mut state = self.state.write().await;
        let prior_phase = state.phase;
        let prior_retry_count = state.retry_count;

        // Allocated under the write lock so generation order == begin order
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        {
            let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            if let Some((_, previous)) = slot.replace((generation, token.clone())) {
                previous.cancel();
            }
        }

        if state.phase == RefreshPhase::Error {
            state.retry_count += 1;
        }
        state.phase = RefreshPhase::Loading;
        state.is_loading = true;
        state.generation = generation;

        debug!(
            generation,
            symbol = %state.symbol,
            timeframe = %state.timeframe,
            retry_count = state.retry_count,
            "refresh started"
        );

        Attempt {
            generation,
            token,
            symbol: state.symbol,
            timeframe: state.timeframe,
            limit: state.candle_limit,
            prior_phase,
            prior_retry_count,
        }
    }

    /// Settle a cancelled attempt. If nothing newer began, the cancel came
    /// from `stop()`: leave `loading` the way the attempt found it.
    async fn abandon(&self, attempt: &Attempt) -> RefreshOutcome {
        let mut state = self.state.write().await;

        if state.generation != attempt.generation {
            drop(state);
            self.publish(&WsEvent::RefreshSuperseded {
                generation: attempt.generation,
            });
            return RefreshOutcome::Superseded;
        }

        state.phase = attempt.prior_phase;
        state.retry_count = attempt.prior_retry_count;
        state.is_loading = false;
        info!(generation = attempt.generation, phase = ?state.phase, "refresh cancelled, state rolled back");

        let snapshot = state.clone();
        drop(state);
        self.publish(&WsEvent::StateUpdated {
            state: Box::new(snapshot),
        });
        RefreshOutcome::Cancelled
    }

    /// Write the result if — and only if — this attempt is still the newest.
    async fn commit(&self, attempt: &Attempt, result: Result<DashboardData, DataError>) -> RefreshOutcome {
        let mut state = self.state.write().await;

        if attempt.token.is_cancelled() || state.generation != attempt.generation {
            debug!(
                generation = attempt.generation,
                current = state.generation,
                "stale refresh result discarded"
            );
            drop(state);
            return self.abandon(attempt).await;
        }

        match result {
            Ok(data) => {
                state.data = data;
                state.phase = RefreshPhase::Ready;
                state.error = None;
                state.last_updated = Some(Utc::now());
                state.retry_count = 0;
                debug!(generation = attempt.generation, "refresh committed");
            }
            Err(err) => {
                // Stale-while-error: keep whatever data the last success left
                state.phase = RefreshPhase::Error;
                state.error = Some(ErrorInfo::from(&err));
                warn!(
                    generation = attempt.generation,
                    code = %err.code,
                    error = %err.message,
                    "refresh failed, keeping last good data"
                );
            }
        }
        state.is_loading = false;

        {
            let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            if slot.as_ref().is_some_and(|(generation, _)| *generation == attempt.generation) {
                *slot = None;
            }
        }

        let phase = state.phase;
        let snapshot = state.clone();
        drop(state);
        self.publish(&WsEvent::StateUpdated {
            state: Box::new(snapshot),
        });

        RefreshOutcome::Committed(phase)
    }

    // ── Fire-and-forget triggers ──────────────────────────────────────────────

    /// Spawn a refresh attempt; the newest spawned attempt wins.
    pub fn trigger(self: &Arc<Self>) -> JoinHandle<RefreshOutcome> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.refresh().await })
    }

    /// Manual retry after an error. Re-enters `loading` like any refresh.
    pub fn retry(self: &Arc<Self>) -> JoinHandle<RefreshOutcome> {
        info!("manual retry requested");
        self.trigger()
    }

    /// Change the chart selection and refresh for it.
    pub async fn select(
        self: &Arc<Self>,
        symbol: Symbol,
        timeframe: Timeframe,
        limit: Option<usize>,
    ) -> JoinHandle<RefreshOutcome> {
        {
            let mut state = self.state.write().await;
            state.symbol = symbol;
            state.timeframe = timeframe;
            if let Some(limit) = limit {
                state.candle_limit = limit;
            }
        }
        info!(%symbol, %timeframe, "chart selection changed");
        self.trigger()
    }

    // ── Polling ───────────────────────────────────────────────────────────────

    /// Start the polling loop. Returns `false` if one is already running.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut slot = self.poller.lock().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().is_some_and(|p| !p.handle.is_finished()) {
            debug!("poller already running, start ignored");
            return false;
        }

        let shutdown = CancellationToken::new();
        let controller = Arc::clone(self);
        let token = shutdown.clone();
        let handle = tokio::spawn(async move { controller.poll_loop(token).await });
        *slot = Some(Poller { shutdown, handle });

        info!(interval = ?self.config.interval, "refresh poller started");
        true
    }

    /// Stop polling and cancel whatever attempt is in flight.
    pub fn stop(&self) {
        if let Some(poller) = self.poller.lock().unwrap_or_else(|e| e.into_inner()).take() {
            poller.shutdown.cancel();
            info!("refresh poller stopped");
        }
        if let Some((_, token)) = self.in_flight.lock().unwrap_or_else(|e| e.into_inner()).take() {
            token.cancel();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished() && !p.shutdown.is_cancelled())
    }

    async fn poll_loop(self: Arc<Self>, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                // First tick fires immediately: idle → loading on start
                _ = ticker.tick() => {
                    self.trigger();
                }
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
