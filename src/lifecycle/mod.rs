//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (controller.rs):
//!     Connect database (with retry) → Bind listener → Serve
//!
//! Shutdown (controller.rs + shutdown.rs):
//!     Signal received → Stop accepting → Drain → Close database → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → SignalReceived event
//! ```
//!
//! # Design Decisions
//! - Fail fast: a database that never comes up is fatal, exit 1
//! - Listener binds last (traffic only when ready)
//! - Shutdown has timeouts: draining and closing are both bounded

pub mod controller;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use controller::{LifecycleController, LifecycleReport, EXIT_FAILURE, EXIT_OK};
pub use shutdown::Shutdown;
pub use state::{LifecycleEvent, LifecycleState};
