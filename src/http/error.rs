//! Error normalization.
//!
//! # Responsibilities
//! - Single handler-facing error type (`HandlerError`)
//! - Map every failure to a stable `{message, code}` JSON body
//! - Log the full failure server-side, never send it to the client
//!
//! # Contracts
//! ```text
//! persistence failure → 503 {"message": "Database temporarily unavailable", "code": "DB_ERROR"}
//! anything else       → 500 {"message": "Internal server error",            "code": "SERVER_ERROR"}
//! ```
//!
//! Error responses produced outside the handlers (method mismatches,
//! extractor rejections) are rewritten into the same `{message, code}` shape
//! by `json_error_body`.

use std::any::Any;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    BoxError, Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::database::PersistenceError;
use crate::observability::metrics;

pub const DB_ERROR: &str = "DB_ERROR";
pub const SERVER_ERROR: &str = "SERVER_ERROR";
pub const ORIGIN_DENIED: &str = "ORIGIN_DENIED";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const METHOD_NOT_ALLOWED: &str = "METHOD_NOT_ALLOWED";
pub const CLIENT_ERROR: &str = "CLIENT_ERROR";

/// Upper bound on a non-JSON error body read back for logging.
const REJECTION_DETAIL_LIMIT: usize = 4 * 1024;

/// Failure surfaced by a request handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The database could not serve the request.
    #[error("persistence unavailable: {0}")]
    Persistence(#[from] PersistenceError),

    /// The request exceeded its deadline.
    #[error("request timed out")]
    Timeout,

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panic(String),

    /// Any other downstream failure.
    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        HandlerError::Internal(err.to_string())
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub message: &'static str,
    pub code: &'static str,
}

/// Status plus body for one failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl NormalizedError {
    fn new(status: StatusCode, message: &'static str, code: &'static str) -> Self {
        Self {
            status,
            body: ErrorBody { message, code },
        }
    }
}

impl IntoResponse for NormalizedError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Log `error` in full and map it to its public contract.
pub fn normalize(error: &HandlerError) -> NormalizedError {
    tracing::error!(error = %error, detail = ?error, "Unhandled request failure");

    let normalized = match error {
        HandlerError::Persistence(_) => NormalizedError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Database temporarily unavailable",
            DB_ERROR,
        ),
        HandlerError::Timeout | HandlerError::Panic(_) | HandlerError::Internal(_) => {
            NormalizedError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                SERVER_ERROR,
            )
        }
    };

    metrics::record_normalized_error(normalized.body.code);
    normalized
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        normalize(&self).into_response()
    }
}

/// Rejections produced by the gateway itself, before any handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayRejection {
    OriginDenied,
    NotFound,
    MethodNotAllowed,
}

impl IntoResponse for GatewayRejection {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            GatewayRejection::OriginDenied => {
                (StatusCode::FORBIDDEN, "Origin not allowed", ORIGIN_DENIED)
            }
            GatewayRejection::NotFound => (StatusCode::NOT_FOUND, "Not found", NOT_FOUND),
            GatewayRejection::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed",
                METHOD_NOT_ALLOWED,
            ),
        };
        (status, Json(ErrorBody { message, code })).into_response()
    }
}

/// Fallback for unmatched routes.
pub async fn not_found() -> GatewayRejection {
    GatewayRejection::NotFound
}

/// Fallback for a known path hit with the wrong method.
pub async fn method_not_allowed() -> GatewayRejection {
    GatewayRejection::MethodNotAllowed
}

fn client_error_body(status: StatusCode) -> ErrorBody {
    let (message, code) = match status {
        StatusCode::BAD_REQUEST => ("Bad request", "BAD_REQUEST"),
        StatusCode::NOT_FOUND => ("Not found", NOT_FOUND),
        StatusCode::METHOD_NOT_ALLOWED => ("Method not allowed", METHOD_NOT_ALLOWED),
        StatusCode::PAYLOAD_TOO_LARGE => ("Payload too large", "PAYLOAD_TOO_LARGE"),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ("Unsupported media type", "UNSUPPORTED_MEDIA_TYPE"),
        StatusCode::UNPROCESSABLE_ENTITY => ("Unprocessable entity", "UNPROCESSABLE_ENTITY"),
        _ => ("Request rejected", CLIENT_ERROR),
    };
    ErrorBody { message, code }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Response mapper that rewrites empty or non-JSON 4xx/5xx responses into
/// the `{message, code}` contract. Status and other headers are kept for
/// 4xx; any 5xx becomes the normalized 500.
pub async fn json_error_body(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let detail = axum::body::to_bytes(body, REJECTION_DETAIL_LIMIT)
        .await
        .unwrap_or_default();
    let detail = String::from_utf8_lossy(&detail);

    if status.is_server_error() {
        return HandlerError::Internal(format!("{status}: {detail}")).into_response();
    }

    tracing::debug!(status = %status, detail = %detail, "Rewriting rejection as JSON");
    let body = client_error_body(status);
    metrics::record_normalized_error(body.code);

    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);
    let mut response = (parts, Json(body)).into_response();
    *response.status_mut() = status;
    response
}

/// Error handler for fallible middleware (request timeout).
pub async fn handle_middleware_error(err: BoxError) -> Response {
    let error = if err.is::<tower::timeout::error::Elapsed>() {
        HandlerError::Timeout
    } else {
        HandlerError::Internal(err.to_string())
    };
    error.into_response()
}

/// Panic handler for `CatchPanicLayer`.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    HandlerError::Panic(detail).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use std::time::Duration;

    #[test]
    fn test_persistence_failures_map_to_db_error() {
        for err in [
            PersistenceError::Closed,
            PersistenceError::Timeout(Duration::from_secs(1)),
            PersistenceError::Other("replica set lost primary".into()),
        ] {
            let normalized = normalize(&HandlerError::from(err));
            assert_eq!(
                normalized,
                NormalizedError {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    body: ErrorBody {
                        message: "Database temporarily unavailable",
                        code: "DB_ERROR",
                    },
                }
            );
        }
    }

    #[test]
    fn test_other_failures_map_to_server_error() {
        for err in [
            HandlerError::internal("secret stack detail"),
            HandlerError::Timeout,
            HandlerError::Panic("boom".into()),
        ] {
            let normalized = normalize(&err);
            assert_eq!(normalized.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                normalized.body,
                ErrorBody {
                    message: "Internal server error",
                    code: "SERVER_ERROR",
                }
            );
        }
    }

    #[tokio::test]
    async fn test_response_body_hides_detail() {
        let response = HandlerError::internal("password=hunter2").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"message": "Internal server error", "code": "SERVER_ERROR"})
        );
    }

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_plain_text_rejection_becomes_json() {
        let rejection = Response::builder()
            .status(StatusCode::UNSUPPORTED_MEDIA_TYPE)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .header(header::VARY, "Accept")
            .body(Body::from("Expected request with `Content-Type: application/json`"))
            .unwrap();

        let response = json_error_body(rejection).await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()[header::VARY], "Accept");
        assert_eq!(
            body_of(response).await,
            serde_json::json!({"message": "Unsupported media type", "code": "UNSUPPORTED_MEDIA_TYPE"})
        );
    }

    #[tokio::test]
    async fn test_empty_server_error_becomes_normalized_500() {
        let response = Response::builder()
            .status(StatusCode::BAD_GATEWAY)
            .body(Body::empty())
            .unwrap();

        let response = json_error_body(response).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await["code"], "SERVER_ERROR");
    }

    #[tokio::test]
    async fn test_json_and_success_responses_pass_through() {
        let denied = GatewayRejection::OriginDenied.into_response();
        let response = json_error_body(denied).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_of(response).await["code"], "ORIGIN_DENIED");

        let ok = Response::new(Body::from("plain ok"));
        let response = json_error_body(ok).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_panic_payloads() {
        let response = handle_panic(Box::new("static str panic"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = handle_panic(Box::new(42u8));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
