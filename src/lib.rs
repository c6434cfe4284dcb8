//! Sheets API gateway library.
//!
//! Bootstrap and request-gateway layer: database connection with retry,
//! origin policy, liveness/debug endpoints, route group mounting, error
//! normalization and signal-driven shutdown.

pub mod config;
pub mod database;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use database::{ConnectionState, ConnectionSupervisor, PersistenceClient};
pub use http::GatewayServer;
pub use lifecycle::{LifecycleController, Shutdown};
pub use routing::RouteGroups;
pub use security::OriginPolicy;
