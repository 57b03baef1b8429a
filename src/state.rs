//! # state
//!
//! Shared application state — the composition root.
//!
//! `build_state` wires Generator → [`MarketDataService`] → [`RefreshController`]
//! once at startup; handlers get `Arc<AppState>` through
//! `axum::extract::State`. Nothing here is a global.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::events::WsEvent;
use crate::generator::MarketGenerator;
use crate::preferences::PreferenceStore;
use crate::refresh::RefreshController;
use crate::service::{MarketDataService, MarketFeed};

/// Capacity of the WebSocket fan-out channel.
const BROADCAST_CAPACITY: usize = 256;

pub struct AppState {
    /// Data access facade (generator + validator + caches).
    pub service: Arc<MarketDataService>,

    /// Owns the dashboard's `RefreshState`; the only writer.
    pub refresh: Arc<RefreshController>,

    pub preferences: PreferenceStore,

    // ── Monitor / WebSocket ───────────────────────────────────────────────────
    /// Pre-serialized JSON events for every connected dashboard.
    pub broadcast_tx: broadcast::Sender<String>,

    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);

        let generator = match config.generator_seed {
            Some(seed) => MarketGenerator::from_seed(seed),
            None => MarketGenerator::from_entropy(),
        };
        let service = Arc::new(MarketDataService::new(generator, config.service.clone()));
        let feed: Arc<dyn MarketFeed> = service.clone();
        let refresh = Arc::new(RefreshController::new(feed, config.refresh.clone(), broadcast_tx.clone()));

        Self {
            service,
            refresh,
            preferences: PreferenceStore::load(&config.preferences_path),
            broadcast_tx,
            started_at: Instant::now(),
        }
    }

    /// Send to every WebSocket client; no receivers is not an error.
    pub fn broadcast(&self, event: &WsEvent) {
        let _ = self.broadcast_tx.send(event.to_json());
    }
}

pub type SharedState = Arc<AppState>;

pub fn build_state(config: &Config) -> SharedState {
    Arc::new(AppState::new(config))
}
