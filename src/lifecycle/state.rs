//! Process lifecycle state machine.
//!
//! # State Transitions
//! ```text
//! Starting     → Connecting:   Boot
//! Connecting   → Ready:        ConnectSucceeded (listener bound)
//! Connecting   → Terminated:   ConnectFailed | BindFailed
//! Ready        → ShuttingDown: SignalReceived | ServerStopped
//! ShuttingDown → Terminated:   CloseCompleted
//! ```
//! Everything else is rejected.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Connecting,
    Ready,
    ShuttingDown,
    Terminated,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Connecting => "connecting",
            LifecycleState::Ready => "ready",
            LifecycleState::ShuttingDown => "shutting_down",
            LifecycleState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Discrete events that drive the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Boot,
    ConnectSucceeded,
    ConnectFailed,
    BindFailed,
    SignalReceived,
    ServerStopped,
    CloseCompleted { ok: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("lifecycle event {event:?} is not valid in state {state}")]
pub struct InvalidTransition {
    pub state: LifecycleState,
    pub event: LifecycleEvent,
}

/// Next state for `event` in `state`.
pub fn transition(
    state: LifecycleState,
    event: LifecycleEvent,
) -> Result<LifecycleState, InvalidTransition> {
    use LifecycleEvent as E;
    use LifecycleState as S;

    match (state, event) {
        (S::Starting, E::Boot) => Ok(S::Connecting),
        (S::Connecting, E::ConnectSucceeded) => Ok(S::Ready),
        (S::Connecting, E::ConnectFailed | E::BindFailed) => Ok(S::Terminated),
        (S::Ready, E::SignalReceived | E::ServerStopped) => Ok(S::ShuttingDown),
        (S::ShuttingDown, E::CloseCompleted { .. }) => Ok(S::Terminated),
        _ => Err(InvalidTransition { state, event }),
    }
}
