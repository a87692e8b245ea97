//! Input file discovery.
//!
//! The export ships one file per entity named `AS_<TABLE>_<DATE>_<GUID>.XML`.
//! The table name plus the trailing underscore identifies the entity, which
//! keeps `AS_HOUSE_` from matching `AS_HOUSEINT_`.

use crate::config::InputFormat;
use crate::error::{FiasLoaderError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Whether `file_name` is the export file of `table` in `format`.
pub fn matches_table(file_name: &str, table: &str, format: InputFormat) -> bool {
    let upper = file_name.to_ascii_uppercase();
    let prefix = format!("AS_{}_", table.to_ascii_uppercase());
    let suffix = format!(".{}", format.directory_name().to_ascii_uppercase());

    upper.starts_with(&prefix) && upper.ends_with(&suffix)
}

/// Finds the input file of `table` in `directory`.
///
/// When several files match, the lexicographically greatest name wins; the
/// export date follows the table name, so that is the most recent one.
///
/// # Errors
/// Returns [`FiasLoaderError::Io`] if the directory cannot be listed and
/// [`FiasLoaderError::FileNotFound`] if no file matches.
pub async fn locate_input(directory: &Path, table: &str, format: InputFormat) -> Result<PathBuf> {
    let mut entries = tokio::fs::read_dir(directory).await.map_err(|e| {
        FiasLoaderError::io(format!("cannot list {}", directory.display()), e)
    })?;

    let mut best: Option<String> = None;
    while let Some(entry) = entries.next_entry().await.map_err(|e| {
        FiasLoaderError::io(format!("cannot list {}", directory.display()), e)
    })? {
        let Ok(file_name) = entry.file_name().into_string() else {
            continue;
        };
        if !matches_table(&file_name, table, format) {
            continue;
        }
        if best.as_ref().is_none_or(|current| file_name > *current) {
            best = Some(file_name);
        }
    }

    match best {
        Some(file_name) => {
            let path = directory.join(file_name);
            debug!(table, path = %path.display(), "Located input file");
            Ok(path)
        }
        None => Err(FiasLoaderError::FileNotFound {
            table: table.to_string(),
            directory: directory.display().to_string(),
        }),
    }
}
