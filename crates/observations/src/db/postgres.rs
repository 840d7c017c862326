//! PostgreSQL implementation of the `ObservationStore` trait.
//!
//! The table name comes from configuration and is validated as a plain
//! identifier. Filter values are always bound as parameters.

use crate::db::decode::{column_names, decode_row};
use crate::error::{ObservationError, ObservationResult};
use crate::filter::{is_identifier, quote_identifier, Filter};
use crate::store::ObservationStore;
use crate::types::{columns, unpack_rows, ObservationRow};
use async_trait::async_trait;
use chrono::Duration;
use config::DatabaseConfig;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::query::Query;
use sqlx::{Executor, PgPool, Postgres, Row};
use std::str::FromStr;
use std::time::Duration as StdDuration;
use tracing::{debug, info, instrument};

/// PostgreSQL-backed observation store.
#[derive(Debug, Clone)]
pub struct PostgresObservationStore {
    pool: PgPool,
    table: String,
}

impl PostgresObservationStore {
    /// Open a bounded connection pool from configuration.
    ///
    /// Every new connection gets the configured `statement_timeout`.
    pub async fn connect(config: &DatabaseConfig) -> ObservationResult<Self> {
        let options = connect_options(config)?;
        let setup = session_setup(config.statement_timeout_seconds);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(StdDuration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Some(StdDuration::from_secs(config.idle_timeout_seconds)))
            .after_connect(move |conn, _meta| {
                let setup = setup.clone();
                Box::pin(async move {
                    for sql in &setup {
                        conn.execute(sql.as_str()).await?;
                    }
                    Ok(())
                })
            })
            .connect_with(options)
            .await
            .map_err(|e| {
                ObservationError::StorageError(format!("Failed to connect to database: {}", e))
            })?;

        info!(
            "Connected to PostgreSQL, table '{}' (max {} connections)",
            config.table, config.max_connections
        );

        Self::from_pool(pool, &config.table)
    }

    /// Create from an existing connection pool.
    pub fn from_pool(pool: PgPool, table: &str) -> ObservationResult<Self> {
        if !is_identifier(table) {
            return Err(ObservationError::StorageError(format!(
                "Invalid table name: {}",
                table
            )));
        }
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn quoted_table(&self) -> String {
        quote_identifier(&self.table)
    }

    async fn fetch_rows(
        &self,
        query: Query<'_, Postgres, PgArguments>,
        what: &str,
    ) -> ObservationResult<Vec<ObservationRow>> {
        let rows = query.fetch_all(&self.pool).await.map_err(|e| {
            ObservationError::StorageError(format!("Failed to fetch {}: {}", what, e))
        })?;

        let Some(first) = rows.first() else {
            return Ok(Vec::new());
        };
        let names = column_names(first);
        let values = rows
            .iter()
            .map(decode_row)
            .collect::<ObservationResult<Vec<_>>>()?;
        unpack_rows(&names, values)
    }
}

/// Largest `statement_timeout` Postgres accepts, in milliseconds.
const MAX_STATEMENT_TIMEOUT_MS: u64 = i32::MAX as u64;

/// Statements run on every new connection.
///
/// Sessions run in UTC so naive `timestamp` columns, `timestamptz` columns and
/// `NOW()` all compare the way the in-memory store does.
fn session_setup(statement_timeout_seconds: u64) -> Vec<String> {
    let mut statements = vec!["SET TIME ZONE 'UTC'".to_string()];
    let timeout_ms = statement_timeout_seconds
        .saturating_mul(1000)
        .min(MAX_STATEMENT_TIMEOUT_MS);
    if timeout_ms > 0 {
        statements.push(format!("SET statement_timeout = {}", timeout_ms));
    }
    statements
}

fn connect_options(config: &DatabaseConfig) -> ObservationResult<PgConnectOptions> {
    if let Some(url) = &config.url {
        return PgConnectOptions::from_str(url)
            .map_err(|e| ObservationError::StorageError(format!("Invalid database url: {}", e)));
    }

    let ssl_mode = PgSslMode::from_str(&config.ssl_mode)
        .map_err(|e| ObservationError::StorageError(format!("Invalid ssl_mode: {}", e)))?;

    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.database)
        .username(&config.user)
        .ssl_mode(ssl_mode);
    if let Some(password) = &config.password {
        options = options.password(password);
    }
    Ok(options)
}

#[async_trait]
impl ObservationStore for PostgresObservationStore {
    #[instrument(skip(self))]
    async fn known_routes(&self) -> ObservationResult<Vec<String>> {
        let route = quote_identifier(columns::ROUTE);
        let sql = format!(
            "SELECT DISTINCT {route}::text FROM {table} WHERE {route} IS NOT NULL ORDER BY 1",
            route = route,
            table = self.quoted_table()
        );

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await.map_err(|e| {
            ObservationError::StorageError(format!("Failed to fetch known routes: {}", e))
        })?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>(0).map_err(|e| {
                    ObservationError::StorageError(format!("Failed to decode route: {}", e))
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn recent(&self, window: Duration) -> ObservationResult<Vec<ObservationRow>> {
        let timestamp = quote_identifier(columns::TIMESTAMP);
        let sql = format!(
            "SELECT * FROM {table} WHERE {ts} >= NOW() - make_interval(secs => $1) ORDER BY {ts}",
            table = self.quoted_table(),
            ts = timestamp
        );
        let seconds = window.num_milliseconds() as f64 / 1000.0;

        self.fetch_rows(sqlx::query(&sql).bind(seconds), "live observations")
            .await
    }

    #[instrument(skip(self, filter), fields(filter = %filter))]
    async fn query(&self, filter: &Filter) -> ObservationResult<Vec<ObservationRow>> {
        let where_clause = filter.to_sql(1);
        let mut sql = format!("SELECT * FROM {}", self.quoted_table());
        if !where_clause.clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause.clause);
        }
        sql.push_str(&format!(
            " ORDER BY {}",
            quote_identifier(columns::TIMESTAMP)
        ));
        debug!(sql = %sql, binds = where_clause.binds.len(), "Executing observation query");

        let mut query = sqlx::query(&sql);
        for value in where_clause.binds {
            query = query.bind(value);
        }

        self.fetch_rows(query, "observations").await
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> ObservationResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| ObservationError::StorageError(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}
