//! Database layer for observation storage.
//!
//! PostgreSQL-backed implementation of the `ObservationStore` trait. Rows are
//! decoded column by column according to the type the server reports, so the
//! store works against any table that carries the core observation columns.

pub mod decode;
pub mod postgres;

pub use postgres::PostgresObservationStore;
