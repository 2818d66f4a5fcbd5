//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files;
//! environment overrides are applied on top by the loader.

use serde::{Deserialize, Serialize};

/// Root configuration for the session relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream session API credentials and endpoint.
    pub upstream: UpstreamConfig,

    /// Session parameter policy.
    pub session: SessionConfig,

    /// Cross-origin access policy.
    pub cors: CorsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Security hardening settings.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream session API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// API key sent as a bearer token. Never exposed to clients.
    pub api_key: String,

    /// Base URL of the API (the sessions path is appended).
    pub base_url: String,

    /// Deadline for a single session-creation call, in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 15,
        }
    }
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// How session parameters other than `user` are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPolicyMode {
    /// Clients send `workflow_id` and may send expiry and rate limit;
    /// zero or missing numbers fall back to the configured defaults.
    ClientSupplied,
    /// Workflow, expiry and rate limit come from configuration only.
    /// Clients may send nothing but `user`.
    #[default]
    ServerFixed,
}

impl std::str::FromStr for SessionPolicyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client_supplied" | "client-supplied" => Ok(Self::ClientSupplied),
            "server_fixed" | "server-fixed" => Ok(Self::ServerFixed),
            other => Err(format!("unknown session policy mode '{}'", other)),
        }
    }
}

/// Session parameter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Policy mode.
    pub mode: SessionPolicyMode,

    /// Workflow to instantiate. Required in `server_fixed` mode.
    pub workflow_id: String,

    /// Session lifetime in seconds (default or fixed value, per mode).
    pub expires_after_seconds: u64,

    /// Per-minute request limit (default or fixed value, per mode).
    pub rate_limit_per_minute: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: SessionPolicyMode::default(),
            workflow_id: String::new(),
            expires_after_seconds: 1200,
            rate_limit_per_minute: 10,
            max_body_bytes: 4096,
        }
    }
}

/// Cross-origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Comma-separated allowed origins. Empty or `*` allows any origin.
    pub allowed_origins: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time for handling one request, in seconds.
    pub request_secs: u64,

    /// How long shutdown waits for in-flight requests, in seconds.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 20,
            shutdown_secs: 5,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add `nosniff` and `no-store` response headers.
    pub enable_headers: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Force debug logging for this crate.
    pub debug: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.session.mode, SessionPolicyMode::ServerFixed);
        assert_eq!(config.session.expires_after_seconds, 1200);
        assert_eq!(config.session.rate_limit_per_minute, 10);
        assert_eq!(config.session.max_body_bytes, 4096);
        assert_eq!(config.upstream.timeout_secs, 15);
        assert!(config.upstream.timeout_secs < config.timeouts.request_secs);
    }

    #[test]
    fn test_partial_toml() {
        let config: RelayConfig = toml::from_str(
            r#"
            [session]
            mode = "client_supplied"
            expires_after_seconds = 60

            [cors]
            allowed_origins = "https://app.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.session.mode, SessionPolicyMode::ClientSupplied);
        assert_eq!(config.session.expires_after_seconds, 60);
        assert_eq!(config.session.rate_limit_per_minute, 10);
        assert_eq!(config.cors.allowed_origins, "https://app.example.com");
    }

    #[test]
    fn test_api_key_redacted_in_debug() {
        let upstream = UpstreamConfig {
            api_key: "sk-live-123".into(),
            ..Default::default()
        };
        assert!(!format!("{:?}", upstream).contains("sk-live-123"));
    }

    #[test]
    fn test_policy_mode_from_str() {
        assert_eq!("SERVER_FIXED".parse::<SessionPolicyMode>(), Ok(SessionPolicyMode::ServerFixed));
        assert_eq!("client-supplied".parse::<SessionPolicyMode>(), Ok(SessionPolicyMode::ClientSupplied));
        assert!("both".parse::<SessionPolicyMode>().is_err());
    }
}
