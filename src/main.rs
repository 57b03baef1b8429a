//! # Quant Dashboard — simulated market data backend
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌──────────────┐  GET /api/market, /api/candles   ┌───────────────────────┐
//!  │  Dashboard   │ ────────────────────────────────▶│  MarketDataService    │
//!  │  Frontend    │                                  │  generator + caches   │
//!  └──────────────┘                                  └───────────────────────┘
//!         ▲                                                    ▲
//!         │  WS /ws/dashboard (STATE_UPDATED)                  │ every 3 s
//!         └──────────────────────────────────────── RefreshController
//! ```
//!
//! Configuration comes from the environment (see [`quant_dashboard::config`]);
//! `RUST_LOG` overrides the tracing filter.

use axum::http::Method;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use quant_dashboard::{config::Config, routes, state::build_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional — real env vars win) ──────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Initialise structured logging ─────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("quant_dashboard=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    // ── 3. Config + shared state ─────────────────────────────────────────────
    let config = Config::from_env()?;
    let state = build_state(&config);

    // ── 4. Start the refresh poller (first tick fires immediately) ───────────
    state.refresh.start();

    // ── 5. Router ────────────────────────────────────────────────────────────
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = routes::router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!(
        addr = %config.bind_addr,
        interval = ?config.refresh.interval,
        symbol = %config.refresh.symbol,
        timeframe = %config.refresh.timeframe,
        seeded = config.generator_seed.is_some(),
        "quant dashboard starting"
    );

    // ── 6. Serve until Ctrl-C ────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    state.refresh.stop();
    Ok(())
}
