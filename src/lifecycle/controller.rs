//! Startup and shutdown orchestration.
//!
//! Drives the state machine in `state.rs` from real events: the connect
//! handshake, the listener bind, the termination signal and the final close.
//! The listener is bound only after the database is connected, so no request
//! is accepted before then.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::config::GatewayConfig;
use crate::database::ConnectionSupervisor;
use crate::http::GatewayServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::state::{transition, LifecycleEvent, LifecycleState};
use crate::routing::RouteGroups;

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

/// Outcome of one process lifetime.
#[derive(Debug, Clone)]
pub struct LifecycleReport {
    pub exit_code: u8,
    pub final_state: LifecycleState,
    /// Every state entered after `Starting`, in order.
    pub history: Vec<LifecycleState>,
    /// Listener address, if the process ever became ready.
    pub bound_addr: Option<SocketAddr>,
}

pub struct LifecycleController {
    config: GatewayConfig,
    supervisor: Arc<ConnectionSupervisor>,
    routes: RouteGroups,
    state: LifecycleState,
    history: Vec<LifecycleState>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
}

impl LifecycleController {
    pub fn new(
        config: GatewayConfig,
        supervisor: Arc<ConnectionSupervisor>,
        routes: RouteGroups,
    ) -> Self {
        Self {
            config,
            supervisor,
            routes,
            state: LifecycleState::Starting,
            history: Vec::new(),
            ready_tx: None,
        }
    }

    /// Receive the bound address once the gateway is ready.
    pub fn notify_ready(&mut self) -> oneshot::Receiver<SocketAddr> {
        let (tx, rx) = oneshot::channel();
        self.ready_tx = Some(tx);
        rx
    }

    /// Run until `signal` resolves (or startup fails) and report how the
    /// process should exit.
    pub async fn run<F>(mut self, signal: F) -> LifecycleReport
    where
        F: Future + Send,
    {
        self.advance(LifecycleEvent::Boot);

        if let Err(e) = self.supervisor.connect_with_retry().await {
            tracing::error!(
                error = %e,
                cause = %e.source,
                "Database unavailable, aborting startup"
            );
            self.advance(LifecycleEvent::ConnectFailed);
            return self.finish(EXIT_FAILURE, None);
        }

        let bind_address = self.config.listener.bind_address();
        let listener = match TcpListener::bind(&bind_address).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(address = %bind_address, error = %e, "Failed to bind listener");
                self.advance(LifecycleEvent::BindFailed);
                if let Err(e) = self.supervisor.close().await {
                    tracing::error!(error = %e, "Failed to close database after bind failure");
                }
                return self.finish(EXIT_FAILURE, None);
            }
        };
        let local_addr = listener.local_addr().ok();

        self.advance(LifecycleEvent::ConnectSucceeded);
        tracing::info!(
            address = ?local_addr,
            environment = ?self.config.environment,
            "Gateway ready"
        );
        if let (Some(tx), Some(addr)) = (self.ready_tx.take(), local_addr) {
            let _ = tx.send(addr);
        }

        let shutdown = Shutdown::new();
        let routes = std::mem::take(&mut self.routes);
        let server = GatewayServer::new(&self.config, &self.supervisor, routes);
        let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

        self.serve_until(signal, server_task, shutdown, local_addr).await
    }

    /// Wait for `signal` or for the server to stop on its own, then drain and
    /// close within the configured grace period.
    async fn serve_until<F>(
        mut self,
        signal: F,
        mut server_task: JoinHandle<io::Result<()>>,
        shutdown: Shutdown,
        local_addr: Option<SocketAddr>,
    ) -> LifecycleReport
    where
        F: Future + Send,
    {
        let mut server_failed = false;
        tokio::select! {
            _ = signal => {
                self.advance(LifecycleEvent::SignalReceived);
            }
            result = &mut server_task => {
                server_failed = true;
                match result {
                    Ok(Ok(())) => tracing::error!("HTTP server stopped unexpectedly"),
                    Ok(Err(e)) => tracing::error!(error = %e, "HTTP server failed"),
                    Err(e) => tracing::error!(error = %e, "HTTP server task aborted"),
                }
                self.advance(LifecycleEvent::ServerStopped);
            }
        }
        shutdown.trigger();

        let grace = Duration::from_millis(self.config.database.close_timeout_ms);
        if !server_failed && timeout(grace, &mut server_task).await.is_err() {
            tracing::warn!(grace = ?grace, "HTTP server did not drain in time");
            server_task.abort();
        }

        let close_ok = match timeout(grace, self.supervisor.close()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Failed to close database connection");
                false
            }
            Err(_) => {
                tracing::error!(timeout = ?grace, "Timed out closing database connection");
                false
            }
        };
        self.advance(LifecycleEvent::CloseCompleted { ok: close_ok });

        let exit_code = if close_ok && !server_failed {
            EXIT_OK
        } else {
            EXIT_FAILURE
        };
        self.finish(exit_code, local_addr)
    }

    fn advance(&mut self, event: LifecycleEvent) {
        match transition(self.state, event) {
            Ok(next) => {
                tracing::info!(from = %self.state, to = %next, event = ?event, "Lifecycle transition");
                self.state = next;
                self.history.push(next);
            }
            Err(e) => tracing::error!(error = %e, "Rejected lifecycle event"),
        }
    }

    fn finish(self, exit_code: u8, bound_addr: Option<SocketAddr>) -> LifecycleReport {
        tracing::info!(exit_code, state = %self.state, "Gateway terminated");
        LifecycleReport {
            exit_code,
            final_state: self.state,
            history: self.history,
            bound_addr,
        }
    }
}
