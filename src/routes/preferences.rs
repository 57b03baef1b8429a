//! # routes::preferences
//!
//! `GET  /api/preferences/dark-mode` — current flag.
//! `POST /api/preferences/dark-mode` — toggle on an empty body, set when the
//! body is `{"darkMode": bool}`, 400 on anything else. Either way the change
//! is broadcast to dashboards.

use axum::{body::Bytes, extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use crate::{error::AppError, events::WsEvent, state::SharedState};

pub async fn get_dark_mode(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "ok":       true,
        "darkMode": state.preferences.dark_mode().await,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DarkModeRequest {
    pub dark_mode: bool,
}

pub async fn set_dark_mode(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let dark_mode = if body.iter().all(u8::is_ascii_whitespace) {
        state.preferences.toggle_dark_mode().await?
    } else {
        let req: DarkModeRequest = serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid dark mode body: {e}")))?;
        state.preferences.set_dark_mode(req.dark_mode).await?;
        req.dark_mode
    };

    state.broadcast(&WsEvent::PreferencesChanged { dark_mode });

    Ok(Json(json!({
        "ok":       true,
        "darkMode": dark_mode,
    })))
}
