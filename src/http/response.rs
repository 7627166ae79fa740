//! Error responses for failed database acquisition.
//!
//! Every `ConnectionError` becomes a JSON body with a machine-readable
//! `error.kind`, plus `Retry-After` when the breaker supplied a hint. Never a
//! stack trace.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;

use crate::connection::{ConnectionError, ErrorKind};

/// HTTP status for a failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Timeout
        | ErrorKind::ConnectionReset
        | ErrorKind::BrokenPipe
        | ErrorKind::ServerUnreachable
        | ErrorKind::CircuitOpen => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Whole seconds for a `Retry-After` header, rounded up, at least 1.
pub fn retry_after_secs(d: Duration) -> u64 {
    let ms = d.as_millis() as u64;
    ms.div_ceil(1000).max(1)
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    kind: ErrorKind,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

/// Response wrapper for [`ConnectionError`].
#[derive(Debug)]
pub struct ErrorResponse(pub ConnectionError);

impl From<ConnectionError> for ErrorResponse {
    fn from(err: ConnectionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = status_for(err.kind());
        let retry_after = err.retry_after().map(retry_after_secs);

        let body = ErrorBody {
            error: ErrorDetail {
                kind: err.kind(),
                message: err.message().to_string(),
            },
            retry_after,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_is_500_everything_else_503() {
        assert_eq!(status_for(ErrorKind::Unknown), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for(ErrorKind::CircuitOpen), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(ErrorKind::Timeout), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn retry_after_rounds_up() {
        assert_eq!(retry_after_secs(Duration::from_millis(29_999)), 30);
        assert_eq!(retry_after_secs(Duration::from_millis(30_000)), 30);
        assert_eq!(retry_after_secs(Duration::from_millis(1)), 1);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
    }

    #[tokio::test]
    async fn circuit_open_sets_header_and_body() {
        let response = ErrorResponse(ConnectionError::circuit_open(Duration::from_millis(12_500))).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "13");

        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["kind"], "circuit_open");
        assert_eq!(json["retryAfter"], 13);
    }

    #[tokio::test]
    async fn unknown_has_no_retry_hint() {
        let response = ErrorResponse(ConnectionError::new(ErrorKind::Unknown, "auth failed")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::RETRY_AFTER).is_none());

        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["message"], "auth failed");
        assert!(json.get("retryAfter").is_none());
    }
}
