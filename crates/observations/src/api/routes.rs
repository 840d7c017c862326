//! Axum route definitions for the observations API.

use crate::api::handlers::{self, ObservationApiState};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// Create all observation routes under `prefix` (e.g. `/api/v1/nyc`).
///
/// # Routes
///
/// - `GET {prefix}/knownroutes` - Distinct route identifiers
/// - `GET {prefix}/livemap` - Positions reported within the live window
/// - `GET {prefix}/livemap2` - Last-known-positions snapshot, parsed
/// - `GET {prefix}/trips` - One trip on one service date
/// - `GET {prefix}/buses` - Every observation in a time range
/// - `GET {prefix}/lastknownpositions` - Last-known-positions snapshot, raw
pub fn observation_routes(state: Arc<ObservationApiState>, prefix: &str) -> Router {
    let prefix = normalize_prefix(prefix);
    let path = |p: &str| format!("{}{}", prefix, p);

    Router::new()
        .route(&path("/knownroutes"), get(handlers::known_routes))
        .route(&path("/livemap"), get(handlers::live_map))
        .route(&path("/livemap2"), get(handlers::live_map_snapshot))
        .route(&path("/trips"), get(handlers::trips))
        .route(&path("/buses"), get(handlers::buses))
        .route(
            &path("/lastknownpositions"),
            get(handlers::last_known_positions),
        )
        .with_state(state)
}

/// Leading slash, no trailing slash; `/` and the empty string mount at the root.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("/api/v1/nyc"), "/api/v1/nyc");
        assert_eq!(normalize_prefix("api/v1/nyc/"), "/api/v1/nyc");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix(""), "");
    }
}
