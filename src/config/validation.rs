//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check required credentials are present
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check the upstream deadline fits inside the request deadline
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{RelayConfig, SessionPolicyMode};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upstream API key is required (OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("workflow id is required in server_fixed mode (CHATKIT_WORKFLOW_ID)")]
    MissingWorkflowId,

    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("invalid upstream base URL '{0}'")]
    InvalidBaseUrl(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("upstream timeout ({upstream_secs}s) must be shorter than request timeout ({request_secs}s)")]
    UpstreamTimeoutTooLong { upstream_secs: u64, request_secs: u64 },
}

/// Validate a fully loaded configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstream.api_key.trim().is_empty() {
        errors.push(ValidationError::MissingApiKey);
    }

    if config.session.mode == SessionPolicyMode::ServerFixed
        && config.session.workflow_id.trim().is_empty()
    {
        errors.push(ValidationError::MissingWorkflowId);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    match url::Url::parse(&config.upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidBaseUrl(config.upstream.base_url.clone())),
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.session.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue("session.max_body_bytes"));
    }
    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue("upstream.timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }
    if config.timeouts.shutdown_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.shutdown_secs"));
    }

    if config.upstream.timeout_secs >= config.timeouts.request_secs {
        errors.push(ValidationError::UpstreamTimeoutTooLong {
            upstream_secs: config.upstream.timeout_secs,
            request_secs: config.timeouts.request_secs,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
