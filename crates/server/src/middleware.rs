//! Request middleware shared by every router the server hosts.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use observability::ServerMetrics;
use std::time::Instant;

/// Route label used when no route matched (404s, CORS preflight on unknown paths).
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Record request count, latency and in-flight gauge per matched route.
///
/// The route label is the route template (`/api/v1/nyc/trips`), never the raw
/// URI, so query strings do not blow up label cardinality.
pub async fn track_metrics(
    State(metrics): State<ServerMetrics>,
    req: Request,
    next: Next,
) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

    let start = Instant::now();
    let in_flight = InFlight::start(&metrics);
    let response = next.run(req).await;
    drop(in_flight);

    metrics.record_request(&route, response.status().as_u16(), start.elapsed());
    response
}

/// Holds one slot of the in-flight gauge; released on drop, so a request
/// future dropped mid-flight (client disconnect, shutdown) still decrements.
struct InFlight<'a> {
    metrics: &'a ServerMetrics,
}

impl<'a> InFlight<'a> {
    fn start(metrics: &'a ServerMetrics) -> Self {
        metrics.request_started();
        Self { metrics }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.metrics.request_finished();
    }
}
