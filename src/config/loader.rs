//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{key} is invalid: {reason}")]
    Env { key: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from an optional TOML file plus the
/// process environment.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => RelayConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`. Unset or empty variables
/// leave the current value untouched.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(v) = get("OPENAI_API_KEY") {
        config.upstream.api_key = v;
    }
    if let Some(v) = get("OPENAI_BASE_URL") {
        config.upstream.base_url = v;
    }
    if let Some(v) = get("ADDR") {
        config.listener.bind_address = normalize_bind_address(&v);
    }
    if let Some(v) = lookup("CORS_ALLOWED_ORIGINS") {
        config.cors.allowed_origins = v;
    }
    if let Some(v) = get("CHATKIT_POLICY_MODE") {
        config.session.mode = v.parse().map_err(|reason| ConfigError::Env {
            key: "CHATKIT_POLICY_MODE",
            reason,
        })?;
    }
    if let Some(v) = get("CHATKIT_WORKFLOW_ID") {
        config.session.workflow_id = v;
    }
    if let Some(v) = get("CHATKIT_EXPIRES_AFTER_SECONDS") {
        config.session.expires_after_seconds = parse_non_negative("CHATKIT_EXPIRES_AFTER_SECONDS", &v)?;
    }
    if let Some(v) = get("CHATKIT_RATE_LIMIT_PER_MINUTE") {
        config.session.rate_limit_per_minute = parse_non_negative("CHATKIT_RATE_LIMIT_PER_MINUTE", &v)?;
    }
    if let Some(v) = get("DEBUG") {
        config.observability.debug = matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }

    Ok(())
}

fn parse_non_negative(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    let n: i64 = value.trim().parse().map_err(|e| ConfigError::Env {
        key,
        reason: format!("must be an integer: {}", e),
    })?;
    u64::try_from(n).map_err(|_| ConfigError::Env {
        key,
        reason: "must be non-negative".to_string(),
    })
}

/// Accept Go-style `:8080` listen addresses.
fn normalize_bind_address(addr: &str) -> String {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{}", port),
        None => addr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::SessionPolicyMode;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_from_env() {
        let config = load_config_with(
            None,
            env(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("ADDR", ":9000"),
                ("CHATKIT_WORKFLOW_ID", "wf_1"),
                ("CHATKIT_EXPIRES_AFTER_SECONDS", "600"),
                ("CHATKIT_RATE_LIMIT_PER_MINUTE", "3"),
                ("CORS_ALLOWED_ORIGINS", "https://a.example.com, https://b.example.com"),
                ("DEBUG", "Yes"),
            ]),
        )
        .unwrap();

        assert_eq!(config.upstream.api_key, "sk-test");
        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert_eq!(config.session.workflow_id, "wf_1");
        assert_eq!(config.session.expires_after_seconds, 600);
        assert_eq!(config.session.rate_limit_per_minute, 3);
        assert_eq!(config.cors.allowed_origins, "https://a.example.com, https://b.example.com");
        assert!(config.observability.debug);
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = load_config_with(None, env(&[("CHATKIT_WORKFLOW_ID", "wf_1")])).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::MissingApiKey]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_negative_env_value_rejected() {
        let err = load_config_with(
            None,
            env(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("CHATKIT_WORKFLOW_ID", "wf_1"),
                ("CHATKIT_EXPIRES_AFTER_SECONDS", "-5"),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: "CHATKIT_EXPIRES_AFTER_SECONDS", .. }));
    }

    #[test]
    fn test_non_integer_env_value_rejected() {
        let err = load_config_with(
            None,
            env(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("CHATKIT_WORKFLOW_ID", "wf_1"),
                ("CHATKIT_RATE_LIMIT_PER_MINUTE", "ten"),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: "CHATKIT_RATE_LIMIT_PER_MINUTE", .. }));
    }

    #[test]
    fn test_policy_mode_from_env() {
        let config = load_config_with(
            None,
            env(&[("OPENAI_API_KEY", "sk-test"), ("CHATKIT_POLICY_MODE", "client_supplied")]),
        )
        .unwrap();
        assert_eq!(config.session.mode, SessionPolicyMode::ClientSupplied);
    }

    #[test]
    fn test_env_overrides_file() {
        let path = std::env::temp_dir().join(format!("relay-config-{}.toml", std::process::id()));
        fs::write(
            &path,
            r#"
            [upstream]
            api_key = "sk-file"

            [session]
            workflow_id = "wf_file"
            rate_limit_per_minute = 42
            "#,
        )
        .unwrap();

        let config = load_config_with(Some(&path), env(&[("CHATKIT_WORKFLOW_ID", "wf_env")])).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(config.upstream.api_key, "sk-file");
        assert_eq!(config.session.workflow_id, "wf_env");
        assert_eq!(config.session.rate_limit_per_minute, 42);
    }

    #[test]
    fn test_normalize_bind_address() {
        assert_eq!(normalize_bind_address(":8080"), "0.0.0.0:8080");
        assert_eq!(normalize_bind_address("127.0.0.1:1"), "127.0.0.1:1");
    }
}
