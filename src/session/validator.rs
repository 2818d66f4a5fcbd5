//! Inbound session request validation.
//!
//! Decodes the raw body strictly, checks required fields and ranges, and
//! resolves the parameters the upstream call will use.
//!
//! A numeric field of zero is indistinguishable from "not sent" and is
//! replaced by the configured default; clients cannot ask for a literal
//! zero expiry or rate limit.

use thiserror::Error;

use crate::config::{SessionConfig, SessionPolicyMode};
use crate::session::types::{
    ClientSessionRequest, EffectiveSessionParameters, ExpiryAnchor, FixedSessionRequest,
};

/// Why a session request was rejected. The `Display` text is safe to send
/// to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request body too large")]
    BodyTooLarge,

    #[error("invalid JSON")]
    InvalidJson,

    #[error("user is required")]
    MissingUser,

    #[error("workflow_id is required")]
    MissingWorkflowId,

    #[error("expires_after_seconds must be non-negative")]
    NegativeExpiresAfter,

    #[error("rate_limit_per_minute must be non-negative")]
    NegativeRateLimit,
}

/// Validator bound to the server's session policy.
#[derive(Debug, Clone)]
pub struct SessionRequestValidator {
    mode: SessionPolicyMode,
    workflow_id: String,
    expires_after_seconds: u64,
    rate_limit_per_minute: u64,
    max_body_bytes: usize,
}

impl SessionRequestValidator {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            mode: config.mode,
            workflow_id: config.workflow_id.clone(),
            expires_after_seconds: config.expires_after_seconds,
            rate_limit_per_minute: config.rate_limit_per_minute,
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Validate a raw request body.
    pub fn validate(&self, raw: &[u8]) -> Result<EffectiveSessionParameters, ValidationError> {
        if raw.len() > self.max_body_bytes {
            return Err(ValidationError::BodyTooLarge);
        }

        match self.mode {
            SessionPolicyMode::ServerFixed => self.validate_fixed(raw),
            SessionPolicyMode::ClientSupplied => self.validate_client(raw),
        }
    }

    fn validate_fixed(&self, raw: &[u8]) -> Result<EffectiveSessionParameters, ValidationError> {
        let request: FixedSessionRequest = decode(raw)?;
        if request.user.is_empty() {
            return Err(ValidationError::MissingUser);
        }

        Ok(EffectiveSessionParameters {
            user: request.user,
            workflow_id: self.workflow_id.clone(),
            expires_after_seconds: self.expires_after_seconds,
            rate_limit_per_minute: self.rate_limit_per_minute,
            expiry_anchor: ExpiryAnchor::CreatedAt,
        })
    }

    fn validate_client(&self, raw: &[u8]) -> Result<EffectiveSessionParameters, ValidationError> {
        let request: ClientSessionRequest = decode(raw)?;
        if request.user.is_empty() {
            return Err(ValidationError::MissingUser);
        }
        if request.workflow_id.is_empty() {
            return Err(ValidationError::MissingWorkflowId);
        }

        let expires_after_seconds = resolve(
            request.expires_after_seconds,
            self.expires_after_seconds,
            ValidationError::NegativeExpiresAfter,
        )?;
        let rate_limit_per_minute = resolve(
            request.rate_limit_per_minute,
            self.rate_limit_per_minute,
            ValidationError::NegativeRateLimit,
        )?;

        Ok(EffectiveSessionParameters {
            user: request.user,
            workflow_id: request.workflow_id,
            expires_after_seconds,
            rate_limit_per_minute,
            expiry_anchor: ExpiryAnchor::CreatedAt,
        })
    }
}

/// Decode a JSON object into `T`. Derived struct deserializers also accept
/// positional arrays, so anything other than an object is rejected first.
fn decode<T: serde::de::DeserializeOwned>(raw: &[u8]) -> Result<T, ValidationError> {
    let value: serde_json::Value = serde_json::from_slice(raw).map_err(invalid_json)?;
    if !value.is_object() {
        tracing::debug!(kind = json_kind(&value), "Rejected non-object session request body");
        return Err(ValidationError::InvalidJson);
    }
    serde_json::from_value(value).map_err(invalid_json)
}

fn invalid_json(e: serde_json::Error) -> ValidationError {
    tracing::debug!(error = %e, "Rejected session request body");
    ValidationError::InvalidJson
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Zero and absent both mean "use the default".
fn resolve(value: Option<i64>, default: u64, negative: ValidationError) -> Result<u64, ValidationError> {
    match value {
        None | Some(0) => Ok(default),
        Some(n) => u64::try_from(n).map_err(|_| negative),
    }
}
