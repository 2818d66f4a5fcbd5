//! Origin access control middleware.
//! Gates browser cross-origin access before any handler runs.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::observability::metrics;

const ALLOW_METHODS: HeaderValue = HeaderValue::from_static("GET, POST, OPTIONS");
const ALLOW_HEADERS: HeaderValue = HeaderValue::from_static("Content-Type, Authorization");
const MAX_AGE: HeaderValue = HeaderValue::from_static("600");
const WILDCARD: HeaderValue = HeaderValue::from_static("*");

/// Outcome of checking a request's `Origin` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginDecision {
    /// Cross-origin access granted; value for `Access-Control-Allow-Origin`.
    Allowed(HeaderValue),
    /// Origin present but not permitted.
    Denied,
    /// Same-origin or non-browser request.
    NoOriginHeader,
}

/// Allowed origins, or any origin.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allow_all: bool,
    origins: HashSet<String>,
}

impl OriginPolicy {
    /// Build a policy from a comma-separated origin list. Empty input, `*`,
    /// or a list with no non-blank entries allows any origin.
    pub fn from_list(allowed_origins: &str) -> Self {
        let allowed_origins = allowed_origins.trim();
        if allowed_origins.is_empty() || allowed_origins == "*" {
            return Self::allow_all();
        }

        let origins: HashSet<String> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() {
            return Self::allow_all();
        }
        Self { allow_all: false, origins }
    }

    pub fn allow_all() -> Self {
        Self {
            allow_all: true,
            origins: HashSet::new(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.allow_all
    }

    /// Decide on a raw `Origin` header value.
    pub fn decide(&self, origin: Option<&HeaderValue>) -> OriginDecision {
        let origin = match origin {
            Some(v) if !v.is_empty() => v,
            _ => return OriginDecision::NoOriginHeader,
        };

        if self.allow_all {
            return OriginDecision::Allowed(WILDCARD);
        }

        match origin.to_str() {
            Ok(s) if self.origins.contains(s) => OriginDecision::Allowed(origin.clone()),
            _ => OriginDecision::Denied,
        }
    }
}

/// Middleware applying [`OriginPolicy`] to every request.
pub async fn cors_middleware(
    State(policy): State<Arc<OriginPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let is_preflight = request.method() == Method::OPTIONS;

    let decision = policy.decide(request.headers().get(header::ORIGIN));
    let allowed_origin = match decision {
        OriginDecision::NoOriginHeader => {
            if is_preflight {
                return StatusCode::NO_CONTENT.into_response();
            }
            return next.run(request).await;
        }
        OriginDecision::Denied => {
            tracing::warn!(
                origin = ?request.headers().get(header::ORIGIN),
                method = %request.method(),
                path = %request.uri().path(),
                "Origin not allowed"
            );
            metrics::record_origin_rejected();
            return (StatusCode::FORBIDDEN, "origin not allowed").into_response();
        }
        OriginDecision::Allowed(value) => value,
    };

    let mut response = if is_preflight {
        let mut response = StatusCode::NO_CONTENT.into_response();
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS);
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS);
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, MAX_AGE);
        response
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allowed_origin);
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
    response
}
