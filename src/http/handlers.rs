//! Gateway-owned endpoints: liveness and cookie diagnostics.

use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::health::{HealthReport, ReadinessReporter};

/// Cookie set by `/debug/cookies`. Short-lived and deliberately not `Secure`.
pub const DEBUG_COOKIE: &str = "test-cookie=test-value; Path=/; Max-Age=60; SameSite=Lax";

pub async fn health(State(reporter): State<ReadinessReporter>) -> Json<HealthReport> {
    Json(reporter.report())
}

#[derive(Debug, Serialize)]
pub struct DebugCookies {
    pub message: &'static str,
    pub cookies: BTreeMap<String, String>,
    pub origin: Option<String>,
}

pub async fn debug_cookies(headers: HeaderMap) -> impl IntoResponse {
    let cookies = parse_cookies(&headers);
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    tracing::debug!(origin = ?origin, cookie_count = cookies.len(), "Cookie diagnostics requested");

    (
        [(header::SET_COOKIE, DEBUG_COOKIE)],
        Json(DebugCookies {
            message: "Test cookie set",
            cookies,
            origin,
        }),
    )
}

/// Collect `name=value` pairs from every `Cookie` header.
fn parse_cookies(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_parse_cookies() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; b = two ;junk; =x"));
        headers.append(header::COOKIE, HeaderValue::from_static("session=abc=def"));

        let cookies = parse_cookies(&headers);
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies["a"], "1");
        assert_eq!(cookies["b"], "two");
        assert_eq!(cookies["session"], "abc=def");
    }

    #[test]
    fn test_no_cookies() {
        assert!(parse_cookies(&HeaderMap::new()).is_empty());
    }
}
