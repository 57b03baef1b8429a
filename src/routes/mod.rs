//! # routes
//!
//! HTTP + WebSocket surface. [`router`] wires every handler onto one
//! `Router<()>`; `main` adds the CORS and trace layers.

pub mod dashboard;
pub mod indicators;
pub mod market;
pub mod preferences;

use axum::{extract::State, response::IntoResponse, routing::get, routing::post, Json, Router};
use serde_json::json;

use crate::state::SharedState;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        // ── Data facade ──────────────────────────────────────────────────────
        .route("/api/market", get(market::get_market))
        .route("/api/candles", get(market::get_candles))
        .route("/api/positions", get(market::get_positions))
        .route("/api/cache/stats", get(market::get_cache_stats))
        // ── Refresh controller ───────────────────────────────────────────────
        .route("/api/dashboard", get(dashboard::get_dashboard))
        .route("/api/dashboard/refresh", post(dashboard::refresh))
        .route("/api/dashboard/retry", post(dashboard::retry))
        .route("/api/dashboard/select", post(dashboard::select))
        .route("/ws/dashboard", get(dashboard::ws_dashboard))
        // ── Glossary ─────────────────────────────────────────────────────────
        .route("/api/indicators", get(indicators::list_indicators))
        .route("/api/indicators/categories", get(indicators::list_categories))
        .route("/api/indicators/popular", get(indicators::list_popular))
        .route("/api/indicators/:id", get(indicators::get_indicator))
        // ── Preferences ──────────────────────────────────────────────────────
        .route(
            "/api/preferences/dark-mode",
            get(preferences::get_dark_mode).post(preferences::set_dark_mode),
        )
        .with_state(state)
}

/// GET /api/health — liveness plus a few cheap vitals.
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    let refresh = state.refresh.state().await;
    Json(json!({
        "ok":          true,
        "status":      "healthy",
        "uptimeSecs":  state.started_at.elapsed().as_secs(),
        "polling":     state.refresh.is_polling(),
        "phase":       refresh.phase,
        "lastUpdated": refresh.last_updated.map(|t| t.timestamp_millis()),
    }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::state::{build_state, SharedState};

    pub fn test_state() -> SharedState {
        let prefs = std::env::temp_dir().join(format!("quant-dashboard-routes-{}.json", uuid::Uuid::new_v4()));
        let mut config = Config::from_lookup(|_| None).expect("default config");
        config.generator_seed = Some(7);
        config.preferences_path = prefs;
        build_state(&config)
    }

    pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    pub fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    pub fn post_empty(uri: &str) -> Request<Body> {
        Request::builder().method("POST").uri(uri).body(Body::empty()).expect("request")
    }
}

#[cfg(test)]
mod tests {
    use super::router;
    use super::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(router(test_state()), get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["phase"], "idle");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _) = send(router(test_state()), get("/api/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
