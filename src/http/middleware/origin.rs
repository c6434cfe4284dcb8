//! Origin policy middleware.
//! Admits or rejects requests by their declared Origin and answers CORS
//! preflights.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::GatewayRejection;
use crate::security::OriginPolicy;

pub async fn origin_policy_middleware(
    State(policy): State<Arc<OriginPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // A non-UTF-8 Origin counts as present but malformed.
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .map(|v| v.to_str().unwrap_or_default());

    let decision = policy.decide(origin);
    if !decision.allowed {
        return GatewayRejection::OriginDenied.into_response();
    }

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    let mut headers = decision.headers;
    if let Some(vary) = headers.remove(header::VARY) {
        append_vary(response.headers_mut(), vary);
    }
    response.headers_mut().extend(headers);
    response
}

/// Add `value` to `Vary` unless a route already listed it.
fn append_vary(headers: &mut HeaderMap, value: HeaderValue) {
    let wanted = value.to_str().unwrap_or_default();
    let present = headers
        .get_all(header::VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|v| v.trim().eq_ignore_ascii_case(wanted) || v.trim() == "*");
    if !present {
        headers.append(header::VARY, value);
    }
}
