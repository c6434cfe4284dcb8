//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, tracing span)
//!     → middleware/origin.rs (admit or reject by Origin, preflight)
//!     → handlers.rs or a mounted route group
//!     → error.rs (every failure becomes {message, code})
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use error::{normalize, HandlerError, NormalizedError};
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::GatewayServer;
