//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → security::cors (origin gate)
//!     → session.rs (validate, call upstream, respond)
//!     → Send to client
//! ```

pub mod health;
pub mod request;
pub mod server;
pub mod session;

pub use request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{HttpServer, HEALTH_PATH, SESSION_PATH};
pub use session::{create_session, SessionState};
