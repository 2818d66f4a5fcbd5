//! Session creation subsystem.
//!
//! # Data Flow
//! ```text
//! raw request body
//!     → validator.rs (bound, strict decode, required fields, ranges)
//!     → EffectiveSessionParameters (defaults/overrides resolved)
//!     → gateway.rs (upstream call, bounded by the pipeline's deadline)
//!     → ClientSecret
//! ```

pub mod gateway;
pub mod types;
pub mod validator;

pub use gateway::{GatewayError, GatewayResult, OpenAiSessionGateway, SessionCreator};
pub use types::{ClientSecret, EffectiveSessionParameters, ExpiryAnchor, SessionResponse};
pub use validator::{SessionRequestValidator, ValidationError};
