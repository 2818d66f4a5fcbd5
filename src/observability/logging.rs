//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Pick the filter: `RUST_LOG` first, then the configured level, with
//!   `debug` forced on for this crate when the debug toggle is set
//! - Log the effective configuration at startup. The workflow id only
//!   appears at debug level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{ObservabilityConfig, RelayConfig};

/// Filter directive used when `RUST_LOG` is absent.
pub fn default_directive(config: &ObservabilityConfig) -> String {
    if config.debug {
        "chatkit_session_relay=debug,tower_http=debug".to_string()
    } else {
        format!("chatkit_session_relay={0},tower_http={0}", config.log_level)
    }
}

/// Initialize the global subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Log the loaded configuration. Secrets are never included.
pub fn log_config(config: &RelayConfig) {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        mode = ?config.session.mode,
        expires_after_seconds = config.session.expires_after_seconds,
        rate_limit_per_minute = config.session.rate_limit_per_minute,
        allowed_origins = %config.cors.allowed_origins,
        debug = config.observability.debug,
        "Configuration loaded"
    );
    tracing::debug!(workflow_id = %config.session.workflow_id, "Session workflow");
}
