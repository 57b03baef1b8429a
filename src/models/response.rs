//! # models::response
//!
//! The uniform envelope every asynchronous data read resolves to.
//!
//! Async reads never fail outright: errors are folded into
//! `success: false` plus a `message`, so callers only ever branch on the flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DataError, ErrorCode};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Payload. On failure this is `T::default()` (an empty collection).
    pub data: T,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Machine-readable failure kind (absent on success).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub request_id: Uuid,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data,
            success: true,
            message: None,
            code: None,
            timestamp: Utc::now(),
            request_id: Uuid::new_v4(),
        }
    }

    /// Convert back into a `Result`, re-hydrating the error kind.
    pub fn into_result(self) -> Result<T, DataError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(DataError::new(
                self.code.unwrap_or(ErrorCode::UnknownError),
                self.message.unwrap_or_else(|| "Failed to fetch data".to_string()),
            ))
        }
    }
}

impl<T: Default> ApiResponse<T> {
    pub fn failure(err: &DataError) -> Self {
        Self {
            data: T::default(),
            success: false,
            message: Some(err.message.clone()),
            code: Some(err.code),
            timestamp: Utc::now(),
            request_id: Uuid::new_v4(),
        }
    }
}

impl<T: Default> From<Result<T, DataError>> for ApiResponse<T> {
    fn from(result: Result<T, DataError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::failure(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_envelope_round_trips_error_kind() {
        let err = DataError::new(ErrorCode::TimeoutError, "read timed out");
        let resp: ApiResponse<Vec<u8>> = Err(err).into();
        assert!(!resp.success);
        assert!(resp.data.is_empty());

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["code"], "TIMEOUT_ERROR");
        assert_eq!(json["message"], "read timed out");
        assert!(json.get("requestId").is_some());

        let back = resp.into_result().unwrap_err();
        assert_eq!(back.code, ErrorCode::TimeoutError);
    }

    #[test]
    fn success_envelope_omits_message() {
        let resp = ApiResponse::ok(vec![1, 2, 3]);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("message").is_none());
        assert_eq!(resp.into_result().unwrap(), vec![1, 2, 3]);
    }
}
