//! Destination store boundary.
//!
//! The pipeline only needs to execute parameterized statements, so the store
//! is reduced to [`Store::execute`] plus the dialect's parameter syntax.
//! Concrete stores wrap a `sqlx` pool; the pool owns connection concurrency,
//! so one store is shared by every entity pipeline through an `Arc`.

use crate::coercion::TypedValue;
use crate::error::{FiasLoaderError, Result, redact_database_url};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

pub mod config;
#[cfg(feature = "postgresql")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::StoreConfig;

/// Error reported by a store; drivers box their native error type.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Supported destination engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    /// PostgreSQL server, `postgres://` URLs
    PostgreSQL,
    /// SQLite file or in-memory database
    SQLite,
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PostgreSQL => f.write_str("PostgreSQL"),
            Self::SQLite => f.write_str("SQLite"),
        }
    }
}

/// Generic SQL execution interface used for DDL and single-row inserts.
///
/// Implementations must be safe to share across tasks; statements from
/// different pipelines may run concurrently.
#[async_trait]
pub trait Store: Send + Sync {
    /// Executes one statement with positional parameters.
    ///
    /// # Returns
    /// Number of rows affected.
    ///
    /// # Errors
    /// Returns the driver error when the statement is rejected or the
    /// connection is lost.
    async fn execute(
        &self,
        statement: &str,
        params: &[TypedValue],
    ) -> std::result::Result<u64, StoreError>;

    /// Positional parameter marker for the 1-based `position`.
    fn placeholder(&self, position: usize) -> String;

    /// Engine behind this store.
    fn store_type(&self) -> StoreType;

    /// Closes every pooled connection.
    async fn close(&self);
}

/// Connects to the store addressed by `database_url`.
///
/// # Supported URLs
/// - `postgres://` / `postgresql://`
/// - `sqlite://path`, `sqlite::memory:`, `:memory:`, or a `.db`/`.sqlite` path
///
/// # Errors
/// Returns a configuration error for an unrecognized URL or a driver that is
/// not compiled in, and [`FiasLoaderError::Connection`] when the store is
/// unreachable.
pub async fn create_store(database_url: &str, config: &StoreConfig) -> Result<Arc<dyn Store>> {
    config.validate()?;

    match detect_store_type(database_url)? {
        #[cfg(feature = "postgresql")]
        StoreType::PostgreSQL => {
            let store = postgres::PostgresStore::connect(database_url, config).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgresql"))]
        StoreType::PostgreSQL => Err(FiasLoaderError::unsupported_feature(
            "PostgreSQL store",
            "Compile with --features postgresql to enable PostgreSQL support",
        )),
        #[cfg(feature = "sqlite")]
        StoreType::SQLite => {
            let store = sqlite::SqliteStore::connect(database_url, config).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "sqlite"))]
        StoreType::SQLite => Err(FiasLoaderError::unsupported_feature(
            "SQLite store",
            "Compile with --features sqlite to enable SQLite support",
        )),
    }
}

/// Detects the store engine from a connection URL.
///
/// # Errors
/// Returns a configuration error if the URL format is unrecognized.
pub fn detect_store_type(database_url: &str) -> Result<StoreType> {
    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok(StoreType::PostgreSQL)
    } else if database_url.starts_with("sqlite:")
        || database_url == ":memory:"
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url.ends_with(".sqlite3")
    {
        Ok(StoreType::SQLite)
    } else {
        Err(FiasLoaderError::configuration(format!(
            "Unrecognized database connection string format: {}",
            redact_database_url(database_url)
        )))
    }
}
