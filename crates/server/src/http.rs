//! HTTP server implementation using Axum
//!
//! [`HttpServer`] wraps an application router with the middleware stack every
//! buswatch endpoint shares and implements [`Server`](crate::Server) for
//! lifecycle management.

use async_trait::async_trait;
use axum::{http::Method, middleware, Router};
use observability::ServerMetrics;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::middleware::track_metrics;
use crate::traits::Server;

/// HTTP server implementation using Axum
///
/// Layers applied to the router, outermost first:
///
/// - `x-request-id` assignment, echoed back on the response
/// - request tracing (`TraceLayer`)
/// - CORS open to any origin for `GET`
/// - per-route Prometheus metrics, counting timed-out requests as `408`
/// - per-request timeout answering `408`
///
/// # Example
///
/// ```ignore
/// use server::{HttpServer, ServerConfig, ServerExt};
///
/// let server = HttpServer::new(ServerConfig::new("127.0.0.1", 5000), app_router);
/// server.run_with_ctrl_c().await?;
/// ```
#[derive(Clone)]
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
    running: Arc<AtomicBool>,
    bound_addr: Arc<RwLock<Option<SocketAddr>>>,
}

impl HttpServer {
    /// Create a new HTTP server around an application router
    pub fn new(config: ServerConfig, router: Router) -> Self {
        let router = apply_middleware(router, &config, ServerMetrics::new("http"));
        Self {
            config,
            router,
            running: Arc::new(AtomicBool::new(false)),
            bound_addr: Arc::new(RwLock::new(None)),
        }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the layered router (for testing or inspection)
    pub fn router(&self) -> &Router {
        &self.router
    }
}

fn apply_middleware(router: Router, config: &ServerConfig, metrics: ServerMetrics) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    router
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(middleware::from_fn_with_state(metrics, track_metrics))
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[async_trait]
impl Server for HttpServer {
    fn name(&self) -> &str {
        "http"
    }

    fn address(&self) -> Option<SocketAddr> {
        *self.bound_addr.read()
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run(&self, shutdown_token: CancellationToken) -> Result<()> {
        let addr = self.config.http_addr()?;

        info!(%addr, "Starting HTTP server");

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::bind(addr.to_string(), e))?;

        let local_addr = listener.local_addr().map_err(ServerError::Io)?;
        *self.bound_addr.write() = Some(local_addr);

        info!(%local_addr, "HTTP server listening");

        self.running.store(true, Ordering::SeqCst);

        let result = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                shutdown_token.cancelled().await;
                info!("HTTP server received shutdown signal");
            })
            .await;

        self.running.store(false, Ordering::SeqCst);
        *self.bound_addr.write() = None;

        match result {
            Ok(()) => {
                info!("HTTP server shutdown complete");
                Ok(())
            }
            Err(e) => {
                error!(%e, "HTTP server error");
                Err(ServerError::Io(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ServerExt;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        routing::get,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_router() -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
    }

    #[tokio::test]
    async fn test_http_server_shutdown() {
        let server = HttpServer::new(ServerConfig::new("127.0.0.1", 0), test_router());
        let probe = server.clone();
        let (handle, token) = server.spawn();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(probe.is_running());
        assert!(probe.address().is_some());

        token.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(result.is_ok(), "Server should shutdown within timeout");
        assert!(!probe.is_running());
    }

    #[test]
    fn test_http_server_name() {
        let server = HttpServer::new(ServerConfig::new("127.0.0.1", 8080), test_router());
        assert_eq!(server.name(), "http");
        assert!(server.address().is_none());
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let server = HttpServer::new(ServerConfig::new("127.0.0.1", 0), test_router());

        let response = server
            .router()
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header(header::ORIGIN, "http://map.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let server = HttpServer::new(ServerConfig::new("127.0.0.1", 0), test_router());

        let response = server
            .router()
            .clone()
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));

        let response = server
            .router()
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers().get("x-request-id").unwrap(), "abc-123");
    }

    #[tokio::test]
    async fn test_request_timeout_answers_408() {
        let config = ServerConfig::new("127.0.0.1", 0).with_request_timeout(Duration::from_millis(50));
        let server = HttpServer::new(config, test_router());

        let response = server
            .router()
            .clone()
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    fn rendered_sample(rendered: &str, prefix: &str, labels: &[&str]) -> Option<f64> {
        rendered
            .lines()
            .filter(|line| line.starts_with(prefix))
            .find(|line| labels.iter().all(|label| line.contains(label)))
            .and_then(|line| line.rsplit(' ').next())
            .and_then(|value| value.parse().ok())
    }

    #[tokio::test]
    async fn test_timed_out_request_is_counted_and_released() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        assert!(metrics::set_global_recorder(recorder).is_ok());

        let config = ServerConfig::new("127.0.0.1", 0).with_request_timeout(Duration::from_millis(50));
        let router = apply_middleware(test_router(), &config, ServerMetrics::new("timeouts"));

        let response = router
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let rendered = handle.render();
        assert_eq!(
            rendered_sample(&rendered, "http_requests_in_flight{", &["server=\"timeouts\""]),
            Some(0.0)
        );
        assert_eq!(
            rendered_sample(
                &rendered,
                "http_requests_total{",
                &["server=\"timeouts\"", "status=\"408\""]
            ),
            Some(1.0)
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let server = HttpServer::new(ServerConfig::new("127.0.0.1", 0), test_router());

        let response = server
            .router()
            .clone()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
