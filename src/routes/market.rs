//! # routes::market
//!
//! Direct reads through the data access facade.
//!
//! | Method | Path                                   | Description                     |
//! |--------|----------------------------------------|---------------------------------|
//! | GET    | `/api/market`                          | Snapshot for every pair         |
//! | GET    | `/api/candles?symbol&timeframe&limit`  | OHLCV series (cached per query) |
//! | GET    | `/api/positions`                       | Simulated holdings with P&L     |
//! | GET    | `/api/cache/stats`                     | Hit / miss / eviction counters  |
//!
//! Bodies are the `ApiResponse` envelope; the status code mirrors its
//! `code` so plain HTTP clients can branch without parsing.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    error::{AppError, ErrorCode},
    models::{ApiResponse, Symbol, Timeframe},
    service::MarketFeed,
    state::SharedState,
};

fn envelope<T: Serialize>(resp: ApiResponse<T>) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = match resp.code {
        None => StatusCode::OK,
        Some(ErrorCode::ValidationError) => StatusCode::BAD_REQUEST,
        Some(ErrorCode::TimeoutError) => StatusCode::GATEWAY_TIMEOUT,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(resp))
}

// ─── GET /api/market ──────────────────────────────────────────────────────────

pub async fn get_market(State(state): State<SharedState>) -> impl IntoResponse {
    envelope(state.service.fetch_market_snapshot().await)
}

// ─── GET /api/candles ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CandleQuery {
    pub symbol: Option<String>,
    pub timeframe: Option<String>,
    pub limit: Option<usize>,
}

/// Missing parameters fall back to the dashboard's configured selection.
pub async fn get_candles(
    State(state): State<SharedState>,
    Query(query): Query<CandleQuery>,
) -> Result<impl IntoResponse, AppError> {
    let defaults = state.refresh.config();

    let symbol = match query.symbol.as_deref() {
        Some(raw) => raw.parse::<Symbol>().map_err(AppError::BadRequest)?,
        None => defaults.symbol,
    };
    let timeframe = match query.timeframe.as_deref() {
        Some(raw) => raw.parse::<Timeframe>().map_err(AppError::BadRequest)?,
        None => defaults.timeframe,
    };
    let limit = query.limit.unwrap_or(defaults.candle_limit);

    Ok(envelope(state.service.fetch_candles(symbol, timeframe, limit).await))
}

// ─── GET /api/positions ───────────────────────────────────────────────────────

pub async fn get_positions(State(state): State<SharedState>) -> impl IntoResponse {
    envelope(state.service.fetch_positions().await)
}

// ─── GET /api/cache/stats ─────────────────────────────────────────────────────

pub async fn get_cache_stats(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    let stats = state.service.cache_stats()?;
    Ok(Json(json!({
        "ok":      true,
        "stats":   stats,
        "hitRate": stats.hit_rate(),
    })))
}

#[cfg(test)]
mod tests {
    use crate::routes::router;
    use crate::routes::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_market_envelope() {
        let (status, body) = send(router(test_state()), get("/api/market")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
        assert!(body["data"][0]["change24hPercent"].is_number());
        assert!(body["requestId"].is_string());
    }

    #[tokio::test]
    async fn test_candles_query() {
        let (status, body) = send(
            router(test_state()),
            get("/api/candles?symbol=BTC/USDT&timeframe=1h&limit=3"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let candles = body["data"].as_array().unwrap();
        assert_eq!(candles.len(), 3);
        for c in candles {
            let (o, h, l, cl) = (
                c["open"].as_f64().unwrap(),
                c["high"].as_f64().unwrap(),
                c["low"].as_f64().unwrap(),
                c["close"].as_f64().unwrap(),
            );
            assert!(h >= o.max(cl) && l <= o.min(cl));
        }
    }

    #[tokio::test]
    async fn test_candles_rejects_bad_input() {
        let state = test_state();
        let (status, body) = send(router(state.clone()), get("/api/candles?limit=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = send(router(state), get("/api/candles?timeframe=2h")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn test_positions_and_stats() {
        let state = test_state();
        let (status, body) = send(router(state.clone()), get("/api/positions")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 3);

        send(router(state.clone()), get("/api/positions")).await;
        let (_, stats) = send(router(state), get("/api/cache/stats")).await;
        assert_eq!(stats["stats"]["hits"], 1);
        assert_eq!(stats["stats"]["misses"], 1);
    }
}
