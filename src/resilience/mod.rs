//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Database connect phase:
//!     → retries.rs (attempt counter + wall-clock deadline)
//!     → On failure: backoff.rs (exponential delay with jitter)
//!     → Budget spent: fatal, startup aborts
//! ```
//!
//! # Design Decisions
//! - Every attempt and the whole phase have a deadline
//! - Jittered backoff avoids synchronized reconnect storms

pub mod backoff;
pub mod retries;

pub use backoff::Backoff;
pub use retries::RetryBudget;
