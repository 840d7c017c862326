//! # Observations Crate
//!
//! Domain layer of buswatch: read-only access to a table of bus-position
//! observations and the conversions the map frontend consumes.
//!
//! ## Key Components
//!
//! - **Filter**: request parameters → predicate list, bound as SQL placeholders
//! - **Rows**: `ObservationRow` (ordered column → value) and the typed `Observation`
//! - **Serializers**: GeoJSON `FeatureCollection` and the kepler.gl table bundle
//! - **Store**: `ObservationStore` trait with in-memory and PostgreSQL adapters
//! - **API**: axum handlers for the six read endpoints
//!
//! ```text
//!   query params ──► Filter ──► ObservationStore ──► Vec<ObservationRow>
//!                                                        │
//!                                  ┌─────────────────────┴──────────┐
//!                                  ▼                                ▼
//!                          FeatureCollection                   KeplerTable
//! ```

pub mod error;
pub mod filter;
pub mod format;
pub mod geojson;
pub mod kepler;
pub mod snapshot;
pub mod store;
pub mod types;

#[cfg(feature = "postgres")]
pub mod db;

#[cfg(feature = "api")]
pub mod api;

pub use error::{ObservationError, ObservationResult};
pub use filter::{parse_timestamp, Filter, Operator, Predicate, SqlFilter};
pub use format::{OutputFormat, Rendered};
pub use geojson::{to_feature_collection, Feature, FeatureCollection, Geometry};
pub use kepler::{KeplerField, KeplerTable};
pub use snapshot::SnapshotSource;
pub use store::{InMemoryObservationStore, ObservationStore};
pub use types::{unpack_rows, FieldValue, Observation, ObservationRow};

#[cfg(feature = "postgres")]
pub use db::PostgresObservationStore;

#[cfg(feature = "api")]
pub use api::{observation_routes, ObservationApiState};
