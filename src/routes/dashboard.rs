//! # routes::dashboard
//!
//! Endpoints driving the Refresh Controller.
//!
//! | Method    | Path                      | Description                              |
//! |-----------|---------------------------|------------------------------------------|
//! | GET       | `/api/dashboard`          | Current `RefreshState`                   |
//! | POST      | `/api/dashboard/refresh`  | Manual refresh (`?force=true` drops caches) |
//! | POST      | `/api/dashboard/retry`    | Manual retry after an error              |
//! | POST      | `/api/dashboard/select`   | Change symbol / timeframe / limit        |
//! | GET (WS)  | `/ws/dashboard`           | Snapshot, then every published event     |

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    error::AppError,
    generator::MAX_CANDLE_LIMIT,
    models::{Symbol, Timeframe},
    refresh::RefreshPhase,
    state::SharedState,
};

// ─── GET /api/dashboard ───────────────────────────────────────────────────────

pub async fn get_dashboard(State(state): State<SharedState>) -> impl IntoResponse {
    let snapshot = state.refresh.state().await;
    Json(json!({
        "ok":      true,
        "polling": state.refresh.is_polling(),
        "state":   snapshot,
    }))
}

// ─── POST /api/dashboard/refresh ──────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RefreshQuery {
    #[serde(default)]
    pub force: bool,
}

/// Starts an attempt and returns immediately; the result arrives as a
/// `STATE_UPDATED` event (or on the next `GET /api/dashboard`).
pub async fn refresh(
    State(state): State<SharedState>,
    Query(query): Query<RefreshQuery>,
) -> Result<impl IntoResponse, AppError> {
    if query.force {
        state.service.invalidate_all()?;
    }
    state.refresh.trigger();
    info!(force = query.force, "manual refresh requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "ok": true, "message": "Refresh triggered" })),
    ))
}

// ─── POST /api/dashboard/retry ────────────────────────────────────────────────

pub async fn retry(State(state): State<SharedState>) -> impl IntoResponse {
    let was_error = state.refresh.state().await.phase == RefreshPhase::Error;
    state.refresh.retry();

    (
        StatusCode::ACCEPTED,
        Json(json!({ "ok": true, "message": "Retry triggered", "wasError": was_error })),
    )
}

// ─── POST /api/dashboard/select ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub limit: Option<usize>,
}

pub async fn select(
    State(state): State<SharedState>,
    Json(req): Json<SelectRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(limit) = req.limit {
        if limit == 0 || limit > MAX_CANDLE_LIMIT {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {MAX_CANDLE_LIMIT}, got {limit}"
            )));
        }
    }

    state.refresh.select(req.symbol, req.timeframe, req.limit).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "ok":        true,
            "symbol":    req.symbol,
            "timeframe": req.timeframe,
        })),
    ))
}

// ─── WS /ws/dashboard ─────────────────────────────────────────────────────────

pub async fn ws_dashboard(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    // Subscribe before the snapshot so nothing falls in between
    let mut rx = state.broadcast_tx.subscribe();
    let (mut sender, mut receiver) = socket.split();

    info!("dashboard client connected");

    let snapshot = json!({
        "event":    "SNAPSHOT",
        "state":    state.refresh.state().await,
        "darkMode": state.preferences.dark_mode().await,
    })
    .to_string();

    if sender.send(Message::Text(snapshot)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(json_str) => {
                        if sender.send(Message::Text(json_str)).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!("dashboard client lagged, skipped {n} events");
                    }
                    Err(_) => break,
                }
            }

            result = receiver.next() => {
                match result {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("dashboard client disconnected");
}
