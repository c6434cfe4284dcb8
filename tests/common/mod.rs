//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use tokio::net::TcpListener;

use sheets_gateway::config::{DatabaseConfig, GatewayConfig};
use sheets_gateway::database::{ConnectionSupervisor, PersistenceClient, PersistenceError};

/// Start a TCP listener that stands in for the database host. Accepted
/// sockets are held open until the task ends.
pub async fn start_mock_database() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// In-memory client that always connects (or never does).
pub struct StaticClient {
    connect_ok: bool,
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    pub healthy: AtomicBool,
}

impl StaticClient {
    pub fn new(connect_ok: bool) -> Self {
        Self {
            connect_ok,
            connects: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            healthy: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl PersistenceClient for StaticClient {
    async fn connect(&self) -> Result<(), PersistenceError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.connect_ok {
            Ok(())
        } else {
            Err(PersistenceError::Other("connection refused".into()))
        }
    }

    async fn ping(&self) -> Result<(), PersistenceError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PersistenceError::Timeout(Duration::from_millis(100)))
        }
    }

    async fn close(&self) -> Result<(), PersistenceError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "static".into()
    }
}

pub fn fast_database(url: String) -> DatabaseConfig {
    DatabaseConfig {
        url,
        max_attempts: 2,
        base_delay_ms: 10,
        max_delay_ms: 20,
        connect_timeout_ms: 500,
        max_total_ms: 5_000,
        close_timeout_ms: 1_000,
    }
}

pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.database = fast_database("mongodb://127.0.0.1:1/test".into());
    config
}

pub async fn connected_supervisor(client: Arc<StaticClient>) -> Arc<ConnectionSupervisor> {
    let supervisor = Arc::new(ConnectionSupervisor::new(client, test_config().database));
    supervisor.connect_with_retry().await.unwrap();
    supervisor
}

pub fn get(path: &str, origin: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(origin) = origin {
        builder = builder.header("origin", origin);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .cookie_store(true)
        .build()
        .unwrap()
}
