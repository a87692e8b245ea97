//! Store connection pool configuration.

use crate::error::{FiasLoaderError, Result};
use std::time::Duration;

/// Pool settings for a destination store.
///
/// The default pool is sized so that every entity pipeline can hold a
/// connection at the same time.
///
/// # Example
/// ```rust
/// use fias_loader_core::store::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_max_connections(32)
///     .with_acquire_timeout(Duration::from_secs(60));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// Timeout for establishing the first connection
    pub connect_timeout: Duration,
    /// Timeout for checking a connection out of the pool
    pub acquire_timeout: Duration,
    /// Idle connections are closed after this long
    pub idle_timeout: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_connections: 16,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            acquire_timeout: Duration::from_secs(300),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }
}

impl StoreConfig {
    /// Sets the maximum pool size.
    #[must_use]
    pub const fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Sets the minimum idle pool size.
    #[must_use]
    pub const fn with_min_connections(mut self, min_connections: u32) -> Self {
        self.min_connections = min_connections;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the acquire timeout.
    #[must_use]
    pub const fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Sets the idle timeout, `None` keeps idle connections forever.
    #[must_use]
    pub const fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Validates pool parameters.
    ///
    /// # Errors
    /// Returns a configuration error if a value is zero or out of range.
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(FiasLoaderError::configuration(
                "max_connections must be greater than 0",
            ));
        }

        if self.max_connections > 100 {
            return Err(FiasLoaderError::configuration(
                "max_connections should not exceed 100",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(FiasLoaderError::configuration(
                "min_connections cannot exceed max_connections",
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(FiasLoaderError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }

        if self.acquire_timeout.is_zero() {
            return Err(FiasLoaderError::configuration(
                "acquire_timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}
