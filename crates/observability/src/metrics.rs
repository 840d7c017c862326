//! Prometheus metrics infrastructure

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus recorder and serve `/metrics` on `port`.
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// HTTP request metrics for one server.
///
/// # Metrics
///
/// * `http_requests_total{server,route,status}` - Completed requests
/// * `http_request_duration_seconds{server,route}` - Request latency
/// * `http_requests_in_flight{server}` - Requests currently being handled
///
/// Without an installed recorder every call is a no-op.
#[derive(Debug, Clone)]
pub struct ServerMetrics {
    server_name: String,
}

impl ServerMetrics {
    pub fn new(server_name: &str) -> Self {
        Self {
            server_name: server_name.to_string(),
        }
    }

    /// Record a completed request against its matched route.
    pub fn record_request(&self, route: &str, status_code: u16, duration: Duration) {
        counter!(
            "http_requests_total",
            "server" => self.server_name.clone(),
            "route" => route.to_string(),
            "status" => status_code.to_string()
        )
        .increment(1);
        histogram!(
            "http_request_duration_seconds",
            "server" => self.server_name.clone(),
            "route" => route.to_string()
        )
        .record(duration.as_secs_f64());
    }

    pub fn request_started(&self) {
        gauge!("http_requests_in_flight", "server" => self.server_name.clone()).increment(1.0);
    }

    pub fn request_finished(&self) {
        gauge!("http_requests_in_flight", "server" => self.server_name.clone()).decrement(1.0);
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }
}
