//! Destination table provisioning.
//!
//! Every run replaces the entity's table: drop if present, then create from
//! the schema DDL. The two statements are not transactional with each other
//! or with the inserts that follow, so a failure here leaves the table absent
//! and must end the entity's pipeline.

use crate::error::{FiasLoaderError, Result};
use crate::schema::EntitySchema;
use crate::store::Store;
use tracing::debug;

/// Drops and recreates the destination table of `schema`.
///
/// # Errors
/// Returns [`FiasLoaderError::Schema`] naming the rejected statement.
pub async fn provision(schema: &EntitySchema, store: &dyn Store) -> Result<()> {
    let drop_statement = format!("DROP TABLE IF EXISTS {}", schema.table_name);

    store
        .execute(&drop_statement, &[])
        .await
        .map_err(|source| FiasLoaderError::Schema {
            table: schema.table_name.to_string(),
            statement: "DROP TABLE",
            source,
        })?;
    debug!(table = schema.table_name, "Dropped previous table");

    store
        .execute(schema.ddl, &[])
        .await
        .map_err(|source| FiasLoaderError::Schema {
            table: schema.table_name.to_string(),
            statement: "CREATE TABLE",
            source,
        })?;
    debug!(table = schema.table_name, "Created table");

    Ok(())
}
