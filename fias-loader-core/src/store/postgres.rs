//! PostgreSQL store backed by a `sqlx` connection pool.
//!
//! This is the production destination. Statements are prepared once per
//! connection and cached by `sqlx`, so the per-row insert issued by every
//! pipeline is parsed only once.

use super::{Store, StoreConfig, StoreError, StoreType};
use crate::coercion::TypedValue;
use crate::error::{FiasLoaderError, Result, redact_database_url};
use async_trait::async_trait;
use sqlx::Postgres;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions};
use sqlx::query::Query;
use tracing::debug;

/// PostgreSQL destination store.
pub struct PostgresStore {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore")
            .field("pool_size", &self.pool.size())
            .field("idle", &self.pool.num_idle())
            .finish_non_exhaustive()
    }
}

impl PostgresStore {
    /// Opens a connection pool and verifies that the server is reachable.
    ///
    /// # Errors
    /// Returns [`FiasLoaderError::Connection`] (credentials sanitized) if no
    /// connection can be established within `connect_timeout`.
    pub async fn connect(database_url: &str, config: &StoreConfig) -> Result<Self> {
        let options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .test_before_acquire(true);

        let pool = tokio::time::timeout(config.connect_timeout, options.connect(database_url))
            .await
            .map_err(|e| FiasLoaderError::connection_failed(database_url, e))?
            .map_err(|e| FiasLoaderError::connection_failed(database_url, e))?;

        debug!(
            "Connected to PostgreSQL at {}",
            redact_database_url(database_url)
        );

        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for verification queries.
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q TypedValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        TypedValue::Integer(v) => query.bind(*v),
        TypedValue::OptionalInteger(v) => query.bind(*v),
        TypedValue::Text(v) => query.bind(v.as_str()),
        TypedValue::OptionalText(v) => query.bind(v.as_deref()),
        TypedValue::Boolean(v) => query.bind(*v),
        TypedValue::Date(v) => query.bind(*v),
        TypedValue::OptionalDate(v) => query.bind(*v),
        TypedValue::Uuid(v) => query.bind(*v),
        TypedValue::OptionalUuid(v) => query.bind(*v),
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn execute(
        &self,
        statement: &str,
        params: &[TypedValue],
    ) -> std::result::Result<u64, StoreError> {
        let query = params
            .iter()
            .fold(sqlx::query(statement), |query, value| bind_value(query, value));
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${position}")
    }

    fn store_type(&self) -> StoreType {
        StoreType::PostgreSQL
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
