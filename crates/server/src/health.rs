//! Liveness and readiness endpoints

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// A dependency the service needs before it can answer requests.
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    /// Name reported in the readiness body (e.g. "database").
    fn name(&self) -> &str;

    /// `Err` carries a human-readable reason.
    async fn check(&self) -> std::result::Result<(), String>;
}

/// Outcome of one readiness check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub service: String,
    pub connected: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Shared state for health checks
#[derive(Clone)]
pub struct HealthState {
    pub service_name: String,
    pub start_time: Instant,
    checks: Vec<Arc<dyn ReadinessCheck>>,
}

impl HealthState {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            start_time: Instant::now(),
            checks: Vec::new(),
        }
    }

    /// Register a dependency probed by `/health/ready`.
    pub fn with_check(mut self, check: Arc<dyn ReadinessCheck>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Run every registered check in order.
    pub async fn probe(&self) -> Vec<ConnectionStatus> {
        let mut statuses = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            let started = Instant::now();
            let outcome = check.check().await;
            statuses.push(ConnectionStatus {
                service: check.name().to_string(),
                connected: outcome.is_ok(),
                latency_ms: started.elapsed().as_millis() as u64,
                error: outcome.err(),
            });
        }
        statuses
    }
}

/// Liveness: answers as long as the process serves requests
pub async fn health_handler(State(state): State<Arc<HealthState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
    }))
}

/// Readiness: 503 when any registered dependency is down
pub async fn readiness_handler(
    State(state): State<Arc<HealthState>>,
) -> (StatusCode, Json<Value>) {
    let connections = state.probe().await;
    let all_healthy = connections.iter().all(|c| c.connected);
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = json!({
        "status": if all_healthy { "ready" } else { "degraded" },
        "service": state.service_name,
        "timestamp": Utc::now().to_rfc3339(),
        "connections": connections,
    });

    (status_code, Json(body))
}

/// `GET /health` and `GET /health/ready`
pub fn health_routes(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/health/ready", get(readiness_handler))
        .with_state(Arc::new(state))
}
