//! SQLite store backed by a `sqlx` connection pool.
//!
//! Used for local runs and as the in-memory destination of the test suite.
//!
//! # Connection Modes
//! - File-based: `sqlite:///path/to/fias.db` or a bare `.db` path, created if missing
//! - In-memory: `sqlite::memory:` or `:memory:`, pinned to a single connection
//!   because every new connection would open a separate empty database

use super::{Store, StoreConfig, StoreError, StoreType};
use crate::coercion::TypedValue;
use crate::error::{FiasLoaderError, Result};
use async_trait::async_trait;
use sqlx::Sqlite;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// SQLite destination store.
pub struct SqliteStore {
    pool: SqlitePool,
    in_memory: bool,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("in_memory", &self.in_memory)
            .field("pool_size", &self.pool.size())
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Opens a SQLite database.
    ///
    /// # Errors
    /// Returns a configuration error for a malformed URL and
    /// [`FiasLoaderError::Connection`] when the database cannot be opened.
    pub async fn connect(database_url: &str, config: &StoreConfig) -> Result<Self> {
        let normalized = normalize_connection_string(database_url);
        let in_memory = is_in_memory(&normalized);

        let options = SqliteConnectOptions::from_str(&normalized)
            .map_err(|e| {
                FiasLoaderError::configuration(format!("Invalid SQLite connection string: {e}"))
            })?
            .create_if_missing(true);

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .idle_timeout(config.idle_timeout)
        };
        let pool_options = pool_options.acquire_timeout(config.acquire_timeout);

        let pool = tokio::time::timeout(config.connect_timeout, pool_options.connect_with(options))
            .await
            .map_err(|e| FiasLoaderError::connection_failed(database_url, e))?
            .map_err(|e| FiasLoaderError::connection_failed(database_url, e))?;

        Ok(Self { pool, in_memory })
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    /// Returns [`FiasLoaderError::Connection`] if SQLite cannot be initialized.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", &StoreConfig::default()).await
    }

    /// Underlying pool, for verification queries.
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Whether the database lives only in memory.
    pub const fn is_in_memory(&self) -> bool {
        self.in_memory
    }
}

fn is_in_memory(connection_string: &str) -> bool {
    connection_string.contains(":memory:") || connection_string.contains("mode=memory")
}

/// Normalizes connection string to SQLite URL format.
fn normalize_connection_string(connection_string: &str) -> String {
    if connection_string == ":memory:" {
        return "sqlite::memory:".to_string();
    }

    if connection_string.starts_with("sqlite:") {
        return connection_string.to_string();
    }

    format!("sqlite://{connection_string}")
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q TypedValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        TypedValue::Integer(v) => query.bind(*v),
        TypedValue::OptionalInteger(v) => query.bind(*v),
        TypedValue::Text(v) => query.bind(v.as_str()),
        TypedValue::OptionalText(v) => query.bind(v.as_deref()),
        TypedValue::Boolean(v) => query.bind(*v),
        TypedValue::Date(v) => query.bind(*v),
        TypedValue::OptionalDate(v) => query.bind(*v),
        TypedValue::Uuid(v) => query.bind(v.hyphenated().to_string()),
        TypedValue::OptionalUuid(v) => query.bind(v.map(|id| id.hyphenated().to_string())),
    }
}

#[async_trait]
impl Store for SqliteStore {
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
        format!("?{position}")
    }

    fn store_type(&self) -> StoreType {
        StoreType::SQLite
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
