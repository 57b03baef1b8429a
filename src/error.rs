//! # error
//!
//! Two error layers:
//!
//! * [`DataError`] — raised by the generator / validator / facade. Carries a
//!   machine-readable [`ErrorCode`] that survives the trip through the
//!   async [`ApiResponse`](crate::models::ApiResponse) envelope.
//! * [`AppError`] — what HTTP handlers return. Axum's `IntoResponse` impl
//!   converts these into structured JSON error bodies so the dashboard always
//!   gets a machine-readable response even on failure.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

// ─── ErrorCode ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A request parameter or record failed shape/range checks.
    ValidationError,
    InvalidMarketData,
    InvalidCandleData,
    InvalidPosition,
    /// An async read did not resolve within the configured bound.
    TimeoutError,
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InvalidMarketData => "INVALID_MARKET_DATA",
            ErrorCode::InvalidCandleData => "INVALID_CANDLE_DATA",
            ErrorCode::InvalidPosition => "INVALID_POSITION",
            ErrorCode::TimeoutError => "TIMEOUT_ERROR",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── DataError ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{code}: {message}")]
pub struct DataError {
    pub code: ErrorCode,
    pub message: String,
}

impl DataError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnknownError, message)
    }
}

// ─── AppError ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AppError {
    /// The request was syntactically correct but semantically invalid.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The requested resource (e.g. an indicator id) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The data layer rejected or failed to produce a record.
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Catch-all for unexpected failures.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Data(err) if err.code == ErrorCode::ValidationError => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            AppError::Data(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            AppError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal error: {err}"),
            ),
        };

        let body = Json(json!({
            "ok":    false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_error_display_includes_code() {
        let err = DataError::new(ErrorCode::InvalidCandleData, "high below low");
        assert_eq!(err.to_string(), "INVALID_CANDLE_DATA: high below low");
    }

    #[test]
    fn validation_errors_map_to_bad_request() {
        let resp = AppError::from(DataError::validation("limit out of range")).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::from(DataError::unknown("boom")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
