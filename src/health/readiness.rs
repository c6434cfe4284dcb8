//! Readiness reporting.
//!
//! Reads the supervisor's live state on every call. Holds only a weak
//! reference so a dropped supervisor reads as `disconnected` instead of
//! failing.

use std::sync::{Arc, Weak};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::database::{ConnectionState, ConnectionSupervisor};

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: ConnectionState,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct ReadinessReporter {
    supervisor: Weak<ConnectionSupervisor>,
}

impl ReadinessReporter {
    pub fn new(supervisor: &Arc<ConnectionSupervisor>) -> Self {
        Self {
            supervisor: Arc::downgrade(supervisor),
        }
    }

    /// Never fails.
    pub fn report(&self) -> HealthReport {
        let database = self
            .supervisor
            .upgrade()
            .map(|s| s.current_state())
            .unwrap_or(ConnectionState::Disconnected);

        HealthReport {
            status: "OK",
            database,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
