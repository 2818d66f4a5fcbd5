//! ChatKit session relay library.
//!
//! Mediates browser requests into upstream session creation using
//! credentials that never leave the server.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod session;

pub use config::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use session::{OpenAiSessionGateway, SessionCreator};
