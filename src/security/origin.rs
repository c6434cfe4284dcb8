//! Cross-origin admission policy.
//!
//! # Responsibilities
//! - Decide per request whether the declared `Origin` may call the API
//! - Produce the CORS response headers for allowed requests
//!
//! # Rules (first match wins)
//! 1. No `Origin` header: allowed (non-browser clients)
//! 2. Exact match against the allow-list
//! 3. Host ends with the trusted suffix
//! 4. Host contains a loopback marker, outside production only
//!
//! Empty, `null` or otherwise unparsable origins never match rules 3 and 4.

use axum::http::{header, HeaderMap, HeaderValue};
use url::Url;

use crate::config::{CorsConfig, Environment};
use crate::observability::metrics;

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization, X-Requested-With";
pub const EXPOSED_HEADERS: &str = "Set-Cookie";

/// Outcome of an origin check. Recomputed for every request.
#[derive(Debug, Clone)]
pub struct OriginDecision {
    pub allowed: bool,
    pub headers: HeaderMap,
}

impl OriginDecision {
    fn deny() -> Self {
        Self {
            allowed: false,
            headers: HeaderMap::new(),
        }
    }
}

/// Which rule admitted an origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    NoOrigin,
    AllowList,
    TrustedSuffix,
    Loopback,
}

/// Origin allow policy built from configuration.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed_origins: Vec<String>,
    trusted_suffix: Option<String>,
    loopback_markers: Vec<String>,
    trust_loopback: bool,
}

impl OriginPolicy {
    pub fn new(
        allowed_origins: Vec<String>,
        trusted_suffix: Option<String>,
        loopback_markers: Vec<String>,
        trust_loopback: bool,
    ) -> Self {
        Self {
            allowed_origins,
            trusted_suffix: trusted_suffix.map(|s| s.to_ascii_lowercase()),
            loopback_markers,
            trust_loopback,
        }
    }

    pub fn from_config(config: &CorsConfig, environment: Environment) -> Self {
        Self::new(
            config.allowed_origins.clone(),
            config.trusted_suffix.clone(),
            config.loopback_markers.clone(),
            !environment.is_production(),
        )
    }

    /// Decide whether `origin` is admitted.
    pub fn decide(&self, origin: Option<&str>) -> OriginDecision {
        let admission = match origin {
            None => Some(Admission::NoOrigin),
            Some(origin) => self.admit(origin),
        };
        let origin_label = origin.unwrap_or("<none>");

        metrics::record_origin_decision(admission.is_some());

        let Some(admission) = admission else {
            tracing::warn!(
                origin = %origin_label,
                allowed_origins = ?self.allowed_origins,
                trusted_suffix = ?self.trusted_suffix,
                loopback_trusted = self.trust_loopback,
                "Origin denied"
            );
            return OriginDecision::deny();
        };

        tracing::info!(origin = %origin_label, rule = ?admission, "Origin allowed");

        OriginDecision {
            allowed: true,
            headers: allowed_headers(origin),
        }
    }

    fn admit(&self, origin: &str) -> Option<Admission> {
        if self.allowed_origins.iter().any(|o| o == origin) {
            return Some(Admission::AllowList);
        }

        let host = parse_origin_host(origin)?;

        if let Some(suffix) = &self.trusted_suffix {
            if host_matches_suffix(&host, suffix) {
                return Some(Admission::TrustedSuffix);
            }
        }

        if self.trust_loopback && self.loopback_markers.iter().any(|m| host.contains(m.as_str())) {
            return Some(Admission::Loopback);
        }

        None
    }
}

/// Host of a well-formed `scheme://host[:port]` origin, lowercased.
fn parse_origin_host(origin: &str) -> Option<String> {
    let url = Url::parse(origin).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.host_str().map(|h| h.to_ascii_lowercase())
}

/// `.example.app` matches any subdomain; `example.app` also matches itself.
fn host_matches_suffix(host: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    if suffix.starts_with('.') {
        host.ends_with(suffix)
    } else {
        host == suffix || host.ends_with(&format!(".{suffix}"))
    }
}

fn allowed_headers(origin: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSED_HEADERS),
    );

    if let Some(value) = origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    }

    headers
}
