//! Single-row insert execution.
//!
//! Each record becomes one autonomous `INSERT` statement. The statement text
//! is built once per pipeline and reused, so the store can cache its prepared
//! form.

use crate::error::{FiasLoaderError, Result};
use crate::schema::{EntitySchema, TypedRecord};
use crate::store::Store;
use tracing::trace;

/// Builds the parameterized insert statement for `schema` in the store's
/// placeholder dialect.
pub fn insert_statement(schema: &EntitySchema, store: &dyn Store) -> String {
    let placeholders = (1..=schema.fields.len())
        .map(|position| store.placeholder(position))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.table_name,
        schema.column_list(),
        placeholders
    )
}

/// Inserts records of one entity and counts committed rows.
pub struct BulkInserter<'a> {
    schema: &'a EntitySchema,
    store: &'a dyn Store,
    statement: String,
    inserted: u64,
}

impl std::fmt::Debug for BulkInserter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkInserter")
            .field("table", &self.schema.table_name)
            .field("statement", &self.statement)
            .field("inserted", &self.inserted)
            .finish_non_exhaustive()
    }
}

impl<'a> BulkInserter<'a> {
    /// Prepares an inserter for `schema`.
    pub fn new(schema: &'a EntitySchema, store: &'a dyn Store) -> Self {
        Self {
            schema,
            store,
            statement: insert_statement(schema, store),
            inserted: 0,
        }
    }

    /// The statement issued for every row.
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Rows committed so far.
    pub const fn inserted(&self) -> u64 {
        self.inserted
    }

    /// Inserts one record.
    ///
    /// # Errors
    /// Returns [`FiasLoaderError::Insert`] with the 1-based row index and the
    /// count of rows already committed.
    pub async fn insert(&mut self, record: &TypedRecord) -> Result<()> {
        let row = self.inserted.saturating_add(1);

        self.store
            .execute(&self.statement, record.values())
            .await
            .map_err(|source| FiasLoaderError::Insert {
                table: self.schema.table_name.to_string(),
                row,
                inserted: self.inserted,
                source,
            })?;

        self.inserted = row;
        trace!(table = self.schema.table_name, row, "Inserted row");
        Ok(())
    }
}
