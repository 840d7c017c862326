//! HTTP API over the observations table.
//!
//! ## Modules
//!
//! - `handlers` - endpoint handlers and shared state
//! - `routes` - Axum router mounting the handlers under a prefix
//! - `validation` - query-parameter schemas for the trip and system queries
//! - `models` - response and error bodies

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validation;

pub use handlers::ObservationApiState;
pub use routes::observation_routes;
