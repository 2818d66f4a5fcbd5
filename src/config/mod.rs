//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional config file (TOML)
//!     → environment overrides (OPENAI_API_KEY, CHATKIT_*, ...)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → pieces shared via Arc with request handlers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Environment is read through an injectable lookup so tests never
//!   touch process state

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CorsConfig, ListenerConfig, ObservabilityConfig, RelayConfig, SecurityConfig, SessionConfig,
    SessionPolicyMode, TimeoutConfig, UpstreamConfig,
};
