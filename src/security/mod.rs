//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → origin.rs (admit or reject the declared Origin)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - Fail closed: unknown or malformed origins are rejected
//! - Rejections never describe which rule failed

pub mod origin;

pub use origin::{OriginDecision, OriginPolicy};
