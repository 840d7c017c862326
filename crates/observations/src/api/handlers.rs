//! HTTP request handlers for the observations API.

use crate::api::models::{api_error, invalid_request, ApiResult, KnownRoutesResponse};
use crate::api::validation::{QuerySchema, SYSTEM_QUERY, TRIP_QUERY};
use crate::format::{OutputFormat, Rendered};
use crate::geojson::{to_feature_collection, FeatureCollection};
use crate::snapshot::SnapshotSource;
use crate::store::ObservationStore;
use crate::types::ObservationRow;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Duration;
use std::sync::Arc;
use tracing::debug;

/// Content type of the raw snapshot response.
pub const GEOJSON_CONTENT_TYPE: &str = "application/geo+json";

/// Shared state for observation API handlers.
pub struct ObservationApiState {
    pub store: Arc<dyn ObservationStore>,
    pub snapshot: SnapshotSource,
    /// How far back the live map looks.
    pub live_window: Duration,
}

impl ObservationApiState {
    pub fn new(
        store: Arc<dyn ObservationStore>,
        snapshot: SnapshotSource,
        live_window: Duration,
    ) -> Self {
        Self {
            store,
            snapshot,
            live_window,
        }
    }

    async fn run_query(
        &self,
        schema: &QuerySchema,
        params: &[(String, String)],
    ) -> ApiResult<Json<Rendered>> {
        let query = schema
            .validate(params)
            .map_err(|fields| invalid_request("Invalid request parameters", fields))?;
        debug!(filter = %query.filter, output = %query.output, "Running observation query");

        let rows = self
            .store
            .query(&query.filter)
            .await
            .map_err(|e| api_error("Failed to query observations", e))?;

        render(query.output, rows)
    }
}

fn render(output: OutputFormat, rows: Vec<ObservationRow>) -> ApiResult<Json<Rendered>> {
    output
        .render(rows)
        .map(Json)
        .map_err(|e| api_error("Failed to serialize observations", e))
}

/// GET {prefix}/knownroutes
pub async fn known_routes(
    State(state): State<Arc<ObservationApiState>>,
) -> ApiResult<Json<KnownRoutesResponse>> {
    let routes = state
        .store
        .known_routes()
        .await
        .map_err(|e| api_error("Failed to fetch known routes", e))?;

    Ok(Json(KnownRoutesResponse { routes }))
}

/// GET {prefix}/livemap
pub async fn live_map(
    State(state): State<Arc<ObservationApiState>>,
) -> ApiResult<Json<FeatureCollection>> {
    let rows = state
        .store
        .recent(state.live_window)
        .await
        .map_err(|e| api_error("Failed to fetch live positions", e))?;

    to_feature_collection(rows)
        .map(Json)
        .map_err(|e| api_error("Failed to serialize live positions", e))
}

/// GET {prefix}/livemap2
pub async fn live_map_snapshot(
    State(state): State<Arc<ObservationApiState>>,
) -> ApiResult<Json<serde_json::Value>> {
    state
        .snapshot
        .read_json()
        .await
        .map(Json)
        .map_err(|e| api_error("Failed to load snapshot", e))
}

/// GET {prefix}/trips
pub async fn trips(
    State(state): State<Arc<ObservationApiState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Rendered>> {
    state.run_query(&TRIP_QUERY, &params).await
}

/// GET {prefix}/buses
pub async fn buses(
    State(state): State<Arc<ObservationApiState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Rendered>> {
    state.run_query(&SYSTEM_QUERY, &params).await
}

/// GET {prefix}/lastknownpositions
pub async fn last_known_positions(
    State(state): State<Arc<ObservationApiState>>,
) -> ApiResult<Response> {
    let bytes = state
        .snapshot
        .read_raw()
        .await
        .map_err(|e| api_error("Failed to load snapshot", e))?;

    Ok(([(header::CONTENT_TYPE, GEOJSON_CONTENT_TYPE)], bytes).into_response())
}
