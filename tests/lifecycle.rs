//! End-to-end lifecycle tests: real listener, real TCP database client.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use sheets_gateway::database::{ConnectionState, ConnectionSupervisor, TcpStoreClient};
use sheets_gateway::lifecycle::{LifecycleController, LifecycleState, EXIT_FAILURE, EXIT_OK};
use sheets_gateway::routing::RouteGroups;

mod common;
use common::{closed_port, fast_database, http_client, test_config, StaticClient};

fn tcp_supervisor(url: &str) -> Arc<ConnectionSupervisor> {
    let config = fast_database(url.to_string());
    let client = TcpStoreClient::from_url(url, Duration::from_millis(config.connect_timeout_ms))
        .unwrap();
    Arc::new(ConnectionSupervisor::new(Arc::new(client), config))
}

#[tokio::test]
async fn test_serves_after_connect_and_shuts_down_cleanly() {
    let db_addr = common::start_mock_database().await;
    let url = format!("mongodb://{db_addr}/sheets");

    let mut config = test_config();
    config.database = fast_database(url.clone());
    let supervisor = tcp_supervisor(&url);

    let mut controller = LifecycleController::new(config, supervisor.clone(), RouteGroups::default());
    let ready = controller.notify_ready();
    let (signal_tx, signal_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(controller.run(async move {
        let _ = signal_rx.await;
    }));

    let addr = ready.await.expect("gateway should become ready");
    let client = http_client();

    let health: serde_json::Value = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "OK");
    assert_eq!(health["database"], "connected");

    // First call sets the cookie, second call sees it.
    let first = client
        .get(format!("http://{addr}/debug/cookies"))
        .header("origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);
    assert_eq!(
        first.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );
    let second: serde_json::Value = client
        .get(format!("http://{addr}/debug/cookies"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["cookies"]["test-cookie"], "test-value");
    assert_eq!(second["origin"], serde_json::Value::Null);

    let denied = client
        .get(format!("http://{addr}/health"))
        .header("origin", "https://evil.example")
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), 403);

    signal_tx.send(()).unwrap();
    let report = run.await.unwrap();

    assert_eq!(report.exit_code, EXIT_OK);
    assert_eq!(
        report.history,
        vec![
            LifecycleState::Connecting,
            LifecycleState::Ready,
            LifecycleState::ShuttingDown,
            LifecycleState::Terminated,
        ]
    );
    assert_eq!(supervisor.current_state(), ConnectionState::Disconnected);

    // The listener is gone after shutdown.
    let after = client.get(format!("http://{addr}/health")).send().await;
    assert!(after.is_err());
}

#[tokio::test]
async fn test_unreachable_database_aborts_startup() {
    let db_addr = closed_port().await;
    let url = format!("mongodb://{db_addr}/sheets");

    let mut config = test_config();
    config.database = fast_database(url.clone());
    let supervisor = tcp_supervisor(&url);

    let mut controller = LifecycleController::new(config, supervisor.clone(), RouteGroups::default());
    let mut ready = controller.notify_ready();

    let report = tokio::time::timeout(
        Duration::from_secs(10),
        controller.run(std::future::pending::<()>()),
    )
    .await
    .expect("startup failure must not hang");

    assert_eq!(report.exit_code, EXIT_FAILURE);
    assert_eq!(report.final_state, LifecycleState::Terminated);
    assert_eq!(report.bound_addr, None);
    assert!(!report.history.contains(&LifecycleState::Ready));
    assert!(ready.try_recv().is_err());
    assert_eq!(supervisor.current_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_signal_closes_database_exactly_once() {
    let client = Arc::new(StaticClient::new(true));
    let config = test_config();
    let supervisor = Arc::new(ConnectionSupervisor::new(client.clone(), config.database.clone()));

    let mut controller = LifecycleController::new(config, supervisor.clone(), RouteGroups::default());
    let ready = controller.notify_ready();
    let (signal_tx, signal_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(controller.run(async move {
        let _ = signal_rx.await;
    }));

    ready.await.unwrap();
    signal_tx.send(()).unwrap();
    let report = run.await.unwrap();

    // A late second close from elsewhere is a no-op.
    supervisor.close().await.unwrap();

    assert_eq!(report.exit_code, EXIT_OK);
    assert_eq!(client.connects.load(Ordering::SeqCst), 1);
    assert_eq!(client.closes.load(Ordering::SeqCst), 1);
}
