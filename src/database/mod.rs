//! Database connection subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     supervisor.rs connect_with_retry()
//!     → client.rs PersistenceClient::connect (one call per attempt)
//!     → state.rs events (connecting / connected / failed)
//!
//! Requests:
//!     handlers borrow the client through the supervisor
//!
//! Shutdown:
//!     supervisor.rs close() → client.rs close → state.rs disconnected
//! ```
//!
//! # Design Decisions
//! - One owned handle, passed explicitly; no global connection
//! - State is an atomic so readers never wait on the connect loop
//! - Close is idempotent and serialized

pub mod client;
pub mod state;
pub mod supervisor;

pub use client::{PersistenceClient, PersistenceError, TcpStoreClient};
pub use state::{ConnectionEvent, ConnectionState};
pub use supervisor::{ConnectionSupervisor, FatalConnectError};
