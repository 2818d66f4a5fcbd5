//! Session request and parameter types.

use serde::{Deserialize, Serialize};

/// Body accepted when workflow, expiry and rate limit are fixed by the
/// operator. Anything besides `user` is rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixedSessionRequest {
    #[serde(default)]
    pub user: String,
}

/// Body accepted when clients choose the workflow and may tune expiry and
/// rate limit.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSessionRequest {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub workflow_id: String,
    #[serde(default)]
    pub expires_after_seconds: Option<i64>,
    #[serde(default)]
    pub rate_limit_per_minute: Option<i64>,
}

/// What the session expiry is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryAnchor {
    #[default]
    CreatedAt,
}

/// Fully resolved parameters handed to the session gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveSessionParameters {
    pub user: String,
    pub workflow_id: String,
    pub expires_after_seconds: u64,
    pub rate_limit_per_minute: u64,
    pub expiry_anchor: ExpiryAnchor,
}

/// Opaque secret returned by the upstream API.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecret(String);

impl ClientSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ClientSecret(<redacted>)")
    }
}

/// Success body of `POST /api/chatkit/session`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub client_secret: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_secret_debug_redacted() {
        let secret = ClientSecret::new("ek_abc");
        assert!(!format!("{:?}", secret).contains("ek_abc"));
        assert_eq!(secret.expose(), "ek_abc");
    }

    #[test]
    fn test_expiry_anchor_wire_name() {
        assert_eq!(serde_json::to_string(&ExpiryAnchor::CreatedAt).unwrap(), "\"created_at\"");
    }

    #[test]
    fn test_response_shape() {
        let body = serde_json::to_string(&SessionResponse { client_secret: "secret".into() }).unwrap();
        assert_eq!(body, r#"{"client_secret":"secret"}"#);
    }
}
