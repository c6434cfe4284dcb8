//! Connection supervisor.
//!
//! Owns the single persistence handle, drives the connect-with-retry
//! handshake, and exposes the live connection state.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::config::DatabaseConfig;
use crate::database::client::{PersistenceClient, PersistenceError};
use crate::database::state::{ConnectionEvent, ConnectionState, ConnectionStateCell};
use crate::observability::metrics;
use crate::resilience::RetryBudget;

/// The retry budget was spent without establishing a connection.
#[derive(Debug, Error)]
#[error("could not connect to {target} after {attempts} attempt(s) in {elapsed:?}")]
pub struct FatalConnectError {
    pub target: String,
    pub attempts: u32,
    pub elapsed: Duration,
    #[source]
    pub source: PersistenceError,
}

/// Supervises the database connection.
pub struct ConnectionSupervisor {
    client: Arc<dyn PersistenceClient>,
    state: ConnectionStateCell,
    config: DatabaseConfig,
    close_lock: Mutex<()>,
}

impl ConnectionSupervisor {
    pub fn new(client: Arc<dyn PersistenceClient>, config: DatabaseConfig) -> Self {
        Self {
            client,
            state: ConnectionStateCell::new(),
            config,
            close_lock: Mutex::new(()),
        }
    }

    /// Current connection state. Never blocks.
    pub fn current_state(&self) -> ConnectionState {
        self.state.load()
    }

    /// Connect, retrying with backoff until success or the budget is spent.
    pub async fn connect_with_retry(&self) -> Result<(), FatalConnectError> {
        if self.current_state() == ConnectionState::Connected {
            return Ok(());
        }

        let target = self.client.describe();
        let connect_timeout = Duration::from_millis(self.config.connect_timeout_ms);
        let mut budget = RetryBudget::from_config(&self.config);
        let mut last_error = PersistenceError::Other("retry budget allowed no attempts".to_string());

        while let Some(attempt) = budget.begin_attempt() {
            self.transition(ConnectionEvent::AttemptStarted);
            tracing::info!(
                database = %target,
                attempt,
                max_attempts = self.config.max_attempts,
                "Connecting to database"
            );

            let attempt_timeout = connect_timeout.min(budget.remaining());
            let result = match timeout(attempt_timeout, self.client.connect()).await {
                Ok(result) => result,
                Err(_) => Err(PersistenceError::Timeout(attempt_timeout)),
            };

            match result {
                Ok(()) => {
                    self.transition(ConnectionEvent::Established);
                    metrics::record_connect_attempt(true);
                    tracing::info!(
                        database = %target,
                        attempt,
                        elapsed = ?budget.elapsed(),
                        "Database connected"
                    );
                    return Ok(());
                }
                Err(e) => {
                    self.transition(ConnectionEvent::AttemptFailed);
                    metrics::record_connect_attempt(false);
                    tracing::warn!(database = %target, attempt, error = %e, "Database connection attempt failed");
                    last_error = e;
                }
            }

            match budget.next_delay() {
                Some(delay) => {
                    tracing::info!(attempt, delay = ?delay, "Retrying database connection");
                    tokio::time::sleep(delay).await;
                }
                None => break,
            }
        }

        Err(FatalConnectError {
            target,
            attempts: budget.attempts(),
            elapsed: budget.elapsed(),
            source: last_error,
        })
    }

    /// Verify the connection can serve a request.
    pub async fn ensure_available(&self) -> Result<(), PersistenceError> {
        if self.current_state() != ConnectionState::Connected {
            return Err(PersistenceError::Closed);
        }
        self.client.ping().await
    }

    /// Close the connection. Idempotent; concurrent callers close at most once.
    ///
    /// Dropping the returned future mid-close (a shutdown timeout) still
    /// leaves the state at `Disconnected`. The client is not asked to close
    /// again; the caller that gave up owns reporting the failure.
    pub async fn close(&self) -> Result<(), PersistenceError> {
        let _guard = self.close_lock.lock().await;

        if self.current_state() != ConnectionState::Connected {
            tracing::debug!(state = %self.current_state(), "Close requested, nothing to do");
            return Ok(());
        }

        self.transition(ConnectionEvent::CloseStarted);
        let mut closing = CloseInProgress {
            state: &self.state,
            finished: false,
        };
        let result = self.client.close().await;
        closing.finished = true;
        drop(closing);

        match &result {
            Ok(()) => tracing::info!(database = %self.client.describe(), "Database connection closed"),
            Err(e) => tracing::error!(error = %e, "Database connection closed with error"),
        }
        result
    }

    fn transition(&self, event: ConnectionEvent) {
        if let Err(e) = self.state.apply(event) {
            tracing::warn!(error = %e, "Ignored out-of-order connection event");
        }
    }
}

/// Applies `Closed` when dropped, whether or not the client finished.
struct CloseInProgress<'a> {
    state: &'a ConnectionStateCell,
    finished: bool,
}

impl Drop for CloseInProgress<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Database close abandoned before the client finished");
        }
        if let Err(e) = self.state.apply(ConnectionEvent::Closed) {
            tracing::warn!(error = %e, "Ignored out-of-order connection event");
        }
    }
}
