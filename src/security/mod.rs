//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin gate; may answer 403 or a preflight 204)
//!     → handler
//!     → headers.rs (nosniff, no-store on the way out)
//! ```
//!
//! # Design Decisions
//! - Fail closed: an origin not on the list never reaches a handler
//! - No trust in client input

pub mod cors;
pub mod headers;

pub use cors::{cors_middleware, OriginDecision, OriginPolicy};
