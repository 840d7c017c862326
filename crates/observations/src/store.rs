//! Observation storage traits and implementations.
//!
//! `ObservationStore` is the read-only data-access seam the HTTP handlers are
//! built against. The Postgres adapter lives in [`crate::db`]; the in-memory
//! store here backs tests and local development.

use crate::error::ObservationResult;
use crate::filter::Filter;
use crate::types::{columns, ObservationRow};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Read access to the observations table.
///
/// # Example
///
/// ```ignore
/// use observations::{Filter, ObservationStore};
///
/// async fn example(store: &dyn ObservationStore) {
///     let filter = Filter::from_params([("route_short", "B41")])?;
///     let rows = store.query(&filter).await?;
///     println!("{} observations", rows.len());
/// }
/// ```
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Distinct non-null route identifiers, sorted.
    async fn known_routes(&self) -> ObservationResult<Vec<String>>;

    /// Observations whose timestamp falls within `window` of the current time.
    async fn recent(&self, window: Duration) -> ObservationResult<Vec<ObservationRow>>;

    /// Observations matching every predicate of `filter`, oldest first. An empty
    /// filter returns the whole table.
    async fn query(&self, filter: &Filter) -> ObservationResult<Vec<ObservationRow>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> ObservationResult<()> {
        Ok(())
    }
}

/// In-memory implementation of ObservationStore.
///
/// Clones share the same rows. Every trait call bumps a counter so callers can
/// assert whether the store was consulted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObservationStore {
    rows: Arc<RwLock<Vec<ObservationRow>>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryObservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<ObservationRow>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn insert(&self, row: ObservationRow) {
        self.rows.write().push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    pub fn clear(&self) {
        self.rows.write().clear();
    }

    /// Number of store calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn sort_by_timestamp(rows: &mut [ObservationRow]) {
    // Rows without a timestamp sort last, matching NULLS LAST.
    rows.sort_by_key(|row| {
        let ts = row.get(columns::TIMESTAMP).and_then(|v| v.as_timestamp());
        (ts.is_none(), ts)
    });
}

#[async_trait]
impl ObservationStore for InMemoryObservationStore {
    async fn known_routes(&self) -> ObservationResult<Vec<String>> {
        self.record_call();
        let routes: BTreeSet<String> = self
            .rows
            .read()
            .iter()
            .filter_map(|row| row.get(columns::ROUTE).and_then(|v| v.filter_text()))
            .collect();
        Ok(routes.into_iter().collect())
    }

    async fn recent(&self, window: Duration) -> ObservationResult<Vec<ObservationRow>> {
        self.record_call();
        let cutoff = Utc::now().naive_utc() - window;
        let mut rows: Vec<ObservationRow> = self
            .rows
            .read()
            .iter()
            .filter(|row| {
                row.get(columns::TIMESTAMP)
                    .and_then(|v| v.as_timestamp())
                    .is_some_and(|ts| ts >= cutoff)
            })
            .cloned()
            .collect();
        sort_by_timestamp(&mut rows);
        Ok(rows)
    }

    async fn query(&self, filter: &Filter) -> ObservationResult<Vec<ObservationRow>> {
        self.record_call();
        let mut rows: Vec<ObservationRow> = self
            .rows
            .read()
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        sort_by_timestamp(&mut rows);
        Ok(rows)
    }
}
