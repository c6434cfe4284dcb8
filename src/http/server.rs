//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with gateway endpoints and route groups
//! - Wire up middleware (request ID, tracing, panic capture, origin policy,
//!   request timeout)
//! - Serve on a bound listener until shutdown is signalled
//!
//! # Middleware order (outermost first)
//! ```text
//! SetRequestId → Trace → PropagateRequestId → CatchPanic
//!     → OriginPolicy → JSON error bodies → Timeout → handlers
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::database::ConnectionSupervisor;
use crate::health::ReadinessReporter;
use crate::http::error::{
    handle_middleware_error, handle_panic, json_error_body, method_not_allowed, not_found,
};
use crate::http::handlers::{debug_cookies, health};
use crate::http::middleware::origin_policy_middleware;
use crate::http::request::{make_request_span, UuidRequestId};
use crate::routing::RouteGroups;
use crate::security::OriginPolicy;

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(
        config: &GatewayConfig,
        supervisor: &Arc<ConnectionSupervisor>,
        routes: RouteGroups,
    ) -> Self {
        let policy = Arc::new(OriginPolicy::from_config(&config.cors, config.environment));
        let reporter = ReadinessReporter::new(supervisor);
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);

        Self {
            router: Self::build_router(request_timeout, policy, reporter, routes),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        request_timeout: Duration,
        policy: Arc<OriginPolicy>,
        reporter: ReadinessReporter,
        routes: RouteGroups,
    ) -> Router {
        let gateway = Router::new()
            .route("/health", get(health))
            .route("/debug/cookies", get(debug_cookies))
            .with_state(reporter);

        routes
            .mount(gateway)
            .fallback(not_found)
            .method_not_allowed_fallback(method_not_allowed)
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_middleware_error))
                    .layer(tower::timeout::TimeoutLayer::new(request_timeout)),
            )
            .layer(middleware::map_response(json_error_body))
            .layer(middleware::from_fn_with_state(policy, origin_policy_middleware))
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The fully layered router, for driving requests in-process.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight
    /// requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
