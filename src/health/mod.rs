//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → readiness.rs report()
//!     → ConnectionSupervisor::current_state() (atomic read)
//!     → {status, database, timestamp}
//! ```
//!
//! # Design Decisions
//! - Always 200; the `database` field carries the signal
//! - No caching: every call reads live state

pub mod readiness;

pub use readiness::{HealthReport, ReadinessReporter};
