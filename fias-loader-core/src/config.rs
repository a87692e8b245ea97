//! Import run configuration.

use crate::error::{FiasLoaderError, Result};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Capacity of each entity's progress channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Period of the status refresh.
pub const DEFAULT_RENDER_INTERVAL: Duration = Duration::from_secs(1);

/// Format of the input export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputFormat {
    /// XML export, one file per entity
    Xml,
    /// DBF export; accepted on the command line but not importable
    Dbf,
}

impl InputFormat {
    /// Directory under the data directory holding files of this format.
    pub const fn directory_name(self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Dbf => "dbf",
        }
    }

    /// Whether this build can import the format.
    pub const fn is_supported(self) -> bool {
        matches!(self, Self::Xml)
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directory_name())
    }
}

/// Settings of one import run.
///
/// # Example
/// ```rust
/// use fias_loader_core::config::{ImportConfig, InputFormat};
///
/// let config = ImportConfig::default()
///     .with_data_dir("/srv/fias")
///     .with_entities(vec!["addrobj".to_string()]);
///
/// assert_eq!(config.format, InputFormat::Xml);
/// assert_eq!(config.input_dir(), std::path::Path::new("/srv/fias/xml"));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Input format
    pub format: InputFormat,
    /// Directory containing the per-format subdirectory
    pub data_dir: PathBuf,
    /// Bound of each entity's progress channel
    pub channel_capacity: usize,
    /// Status refresh period
    pub render_interval: Duration,
    /// Tables to import; empty means all
    pub entities: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            format: InputFormat::Xml,
            data_dir: PathBuf::from("."),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            render_interval: DEFAULT_RENDER_INTERVAL,
            entities: Vec::new(),
        }
    }
}

impl ImportConfig {
    /// Sets the input format.
    #[must_use]
    pub const fn with_format(mut self, format: InputFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Sets the progress channel capacity.
    #[must_use]
    pub const fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Sets the status refresh period.
    #[must_use]
    pub const fn with_render_interval(mut self, interval: Duration) -> Self {
        self.render_interval = interval;
        self
    }

    /// Restricts the run to the named tables.
    #[must_use]
    pub fn with_entities(mut self, entities: Vec<String>) -> Self {
        self.entities = entities;
        self
    }

    /// Directory the entity files are looked up in.
    pub fn input_dir(&self) -> PathBuf {
        self.data_dir.join(self.format.directory_name())
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns a configuration error for a zero channel capacity or refresh
    /// period.
    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(FiasLoaderError::configuration(
                "channel_capacity must be greater than 0",
            ));
        }

        if self.render_interval.is_zero() {
            return Err(FiasLoaderError::configuration(
                "render_interval must be greater than 0",
            ));
        }

        Ok(())
    }
}
