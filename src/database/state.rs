//! Connection state machine.
//!
//! # States
//! - Disconnected: no connection, nothing in flight
//! - Connecting: an attempt is in flight
//! - Connected: the client reported success
//! - Disconnecting: close in progress
//!
//! # State Transitions
//! ```text
//! Disconnected  → Connecting:    attempt started
//! Connecting    → Connected:     client reported success
//! Connecting    → Disconnected:  attempt failed
//! Connected     → Disconnecting: close requested
//! Disconnecting → Disconnected:  close finished
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;
use thiserror::Error;

/// Connection state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Disconnecting = 3,
}

impl From<u8> for ConnectionState {
    fn from(val: u8) -> Self {
        match val {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Disconnecting,
            _ => ConnectionState::Disconnected,
        }
    }
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnecting => "disconnecting",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle events reported by the persistence client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    AttemptStarted,
    Established,
    AttemptFailed,
    CloseStarted,
    Closed,
}

impl ConnectionEvent {
    fn edge(self) -> (ConnectionState, ConnectionState) {
        use ConnectionState::*;
        match self {
            ConnectionEvent::AttemptStarted => (Disconnected, Connecting),
            ConnectionEvent::Established => (Connecting, Connected),
            ConnectionEvent::AttemptFailed => (Connecting, Disconnected),
            ConnectionEvent::CloseStarted => (Connected, Disconnecting),
            ConnectionEvent::Closed => (Disconnecting, Disconnected),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event {event:?} is not valid while {current}")]
pub struct InvalidStateTransition {
    pub current: ConnectionState,
    pub event: ConnectionEvent,
}

/// Lock-free holder of the current state.
#[derive(Debug)]
pub struct ConnectionStateCell {
    state: AtomicU8,
}

impl ConnectionStateCell {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(ConnectionState::Disconnected as u8),
        }
    }

    pub fn load(&self) -> ConnectionState {
        ConnectionState::from(self.state.load(Ordering::Acquire))
    }

    /// Apply an event, moving along its edge only if the current state is the
    /// edge's source.
    pub fn apply(&self, event: ConnectionEvent) -> Result<ConnectionState, InvalidStateTransition> {
        let (from, to) = event.edge();
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| {
                tracing::debug!(from = %from, to = %to, "Database connection state changed");
                to
            })
            .map_err(|current| InvalidStateTransition {
                current: ConnectionState::from(current),
                event,
            })
    }
}

impl Default for ConnectionStateCell {
    fn default() -> Self {
        Self::new()
    }
}
