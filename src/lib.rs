//! # quant-dashboard
//!
//! Backend for a simulated crypto market dashboard.
//!
//! ```text
//!  MarketGenerator ──▶ validate ──▶ TtlCache ──▶ MarketDataService (MarketFeed)
//!                                                        │
//!                                                        ▼
//!   GET /api/market …  ◀── routes ◀── AppState ◀── RefreshController ──▶ /ws/dashboard
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod generator;
pub mod indicators;
pub mod models;
pub mod preferences;
pub mod refresh;
pub mod routes;
pub mod service;
pub mod state;
pub mod validate;
