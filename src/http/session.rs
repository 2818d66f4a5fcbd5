//! Session creation handler.
//!
//! Per request: method check → bounded body read → validation → upstream
//! call under a deadline → `{"client_secret": ...}`. The origin gate runs
//! before this handler as middleware. Nothing here retries: creating a
//! session is not idempotent.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::http::request::request_id;
use crate::observability::metrics::{self, Outcome};
use crate::session::{
    GatewayError, SessionCreator, SessionRequestValidator, SessionResponse, ValidationError,
};

/// State shared by session requests. Everything in it is read-only.
#[derive(Clone)]
pub struct SessionState {
    pub gateway: Arc<dyn SessionCreator>,
    pub validator: Arc<SessionRequestValidator>,
    pub upstream_timeout: Duration,
}

pub async fn create_session(
    State(state): State<SessionState>,
    request: Request<Body>,
) -> Response {
    if request.method() != Method::POST {
        metrics::record_request(Outcome::MethodNotAllowed);
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let request_id = request_id(&request);

    let body = match axum::body::to_bytes(request.into_body(), state.validator.max_body_bytes()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(request_id = %request_id, error = %e, "Failed to read request body");
            return reject(ValidationError::BodyTooLarge);
        }
    };

    let params = match state.validator.validate(&body) {
        Ok(params) => params,
        Err(e) => {
            tracing::debug!(request_id = %request_id, reason = %e, "Invalid session request");
            return reject(e);
        }
    };

    tracing::debug!(
        request_id = %request_id,
        user = %params.user,
        workflow_id = %params.workflow_id,
        expires_after_seconds = params.expires_after_seconds,
        rate_limit_per_minute = params.rate_limit_per_minute,
        "Creating session"
    );

    let start = Instant::now();
    let result = match tokio::time::timeout(state.upstream_timeout, state.gateway.create(params)).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout(state.upstream_timeout)),
    };
    metrics::record_upstream_call(start, result.is_ok());

    match result {
        Ok(secret) => {
            tracing::debug!(request_id = %request_id, "Session created");
            metrics::record_request(Outcome::Success);
            (
                StatusCode::OK,
                Json(SessionResponse {
                    client_secret: secret.into_inner(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to create session");
            metrics::record_request(Outcome::UpstreamError);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to create session").into_response()
        }
    }
}

fn reject(error: ValidationError) -> Response {
    metrics::record_request(Outcome::ClientError);
    (StatusCode::BAD_REQUEST, error.to_string()).into_response()
}
