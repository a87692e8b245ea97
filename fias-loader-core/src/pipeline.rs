//! Per-entity import pipeline.
//!
//! One pipeline moves one entity kind through
//! `Provisioning -> Streaming -> (Completed | Failed)`:
//! the destination table is recreated, the entity's input file is located and
//! streamed element by element, and every element is coerced and inserted
//! before the next one is read. A running count is reported after each row.
//!
//! Failures never cross entity boundaries. A pipeline that fails sends one
//! terminal status line explaining why and returns a failed
//! [`EntityReport`]; rows inserted before the failure stay in the table.

use crate::config::InputFormat;
use crate::decoder::ElementStream;
use crate::discovery::locate_input;
use crate::error::{FiasLoaderError, Result};
use crate::insert::BulkInserter;
use crate::progress::ProgressSender;
use crate::provision::provision;
use crate::schema::EntitySchema;
use crate::store::Store;
use futures::TryStreamExt;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, trace};

/// Lifecycle state of one entity's import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    /// Table being dropped and recreated
    Provisioning,
    /// Elements being decoded and inserted
    Streaming,
    /// Input exhausted without error
    Completed,
    /// Ended early; see the report's error
    Failed,
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provisioning => f.write_str("provisioning"),
            Self::Streaming => f.write_str("streaming"),
            Self::Completed => f.write_str("completed"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Outcome of one entity pipeline.
#[derive(Debug, Serialize)]
pub struct EntityReport {
    /// Element name of the entity
    pub entity: &'static str,
    /// Destination table
    pub table: &'static str,
    /// Terminal state
    pub state: EntityState,
    /// Rows committed before the pipeline ended
    pub rows_inserted: u64,
    /// Cause of a failure
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<FiasLoaderError>,
}

impl EntityReport {
    /// Whether the entity reached [`EntityState::Completed`].
    pub fn is_completed(&self) -> bool {
        self.state == EntityState::Completed
    }

    pub(crate) fn failed(schema: &EntitySchema, rows_inserted: u64, error: FiasLoaderError) -> Self {
        Self {
            entity: schema.element_name,
            table: schema.table_name,
            state: EntityState::Failed,
            rows_inserted,
            error: Some(error),
        }
    }
}

fn serialize_error<S: Serializer>(
    error: &Option<FiasLoaderError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    error
        .as_ref()
        .map(FiasLoaderError::chain_message)
        .serialize(serializer)
}

/// Progress line reported after each inserted row.
pub fn progress_message(element_name: &str, rows: u64) -> String {
    format!("{element_name} {rows} rows affected")
}

/// Terminal status line of a failed entity.
pub fn failure_message(element_name: &str, rows: u64, error: &FiasLoaderError) -> String {
    format!(
        "{element_name} failed after {rows} rows: {}",
        error.chain_message()
    )
}

/// Imports one entity kind.
pub struct EntityPipeline {
    schema: &'static EntitySchema,
    store: Arc<dyn Store>,
    progress: ProgressSender,
    input_dir: PathBuf,
    format: InputFormat,
    state: EntityState,
}

impl fmt::Debug for EntityPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityPipeline")
            .field("table", &self.schema.table_name)
            .field("input_dir", &self.input_dir)
            .field("format", &self.format)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl EntityPipeline {
    /// Creates a pipeline reading from `input_dir`.
    pub fn new(
        schema: &'static EntitySchema,
        store: Arc<dyn Store>,
        progress: ProgressSender,
        input_dir: impl Into<PathBuf>,
        format: InputFormat,
    ) -> Self {
        Self {
            schema,
            store,
            progress,
            input_dir: input_dir.into(),
            format,
            state: EntityState::Provisioning,
        }
    }

    /// Runs the pipeline to a terminal state.
    ///
    /// The progress sender is dropped when this returns, which is how the
    /// aggregator learns the entity has ended.
    pub async fn run(mut self) -> EntityReport {
        info!(
            entity = self.schema.element_name,
            table = self.schema.table_name,
            "Provisioning table"
        );

        if let Err(error) = provision(self.schema, self.store.as_ref()).await {
            return self.fail(0, error).await;
        }

        self.transition(EntityState::Streaming);
        let stream = match self.open_input().await {
            Ok(stream) => stream,
            Err(error) => return self.fail(0, error).await,
        };

        let store = Arc::clone(&self.store);
        let mut inserter = BulkInserter::new(self.schema, store.as_ref());
        debug!(
            table = self.schema.table_name,
            statement = inserter.statement(),
            "Prepared insert statement"
        );

        if let Err(error) = self.stream_rows(stream, &mut inserter).await {
            let rows = inserter.inserted();
            return self.fail(rows, error).await;
        }

        let rows = inserter.inserted();
        self.transition(EntityState::Completed);
        info!(
            entity = self.schema.element_name,
            table = self.schema.table_name,
            rows,
            "Import completed"
        );

        EntityReport {
            entity: self.schema.element_name,
            table: self.schema.table_name,
            state: EntityState::Completed,
            rows_inserted: rows,
            error: None,
        }
    }

    async fn open_input(&self) -> Result<ElementStream> {
        let path = locate_input(&self.input_dir, self.schema.table_name, self.format).await?;
        info!(
            entity = self.schema.element_name,
            path = %path.display(),
            "Streaming input file"
        );
        ElementStream::open(path, self.schema.element_name).await
    }

    async fn stream_rows(
        &self,
        stream: ElementStream,
        inserter: &mut BulkInserter<'_>,
    ) -> Result<()> {
        let elements = stream.into_stream();
        futures::pin_mut!(elements);

        while let Some(element) = elements.try_next().await? {
            let row = inserter.inserted().saturating_add(1);
            let record = self
                .schema
                .coerce_record(&element)
                .map_err(|source| FiasLoaderError::Coercion { row, source })?;

            inserter.insert(&record).await?;

            let rows = inserter.inserted();
            trace!(entity = self.schema.element_name, rows, "Row imported");
            self.progress
                .send(progress_message(self.schema.element_name, rows))
                .await;
        }

        Ok(())
    }

    async fn fail(mut self, rows: u64, error: FiasLoaderError) -> EntityReport {
        error!(
            entity = self.schema.element_name,
            table = self.schema.table_name,
            state = %self.state,
            rows,
            kind = error.kind(),
            "Import failed: {}",
            error.chain_message()
        );
        self.transition(EntityState::Failed);

        self.progress
            .send(failure_message(self.schema.element_name, rows, &error))
            .await;

        EntityReport::failed(self.schema, rows, error)
    }

    fn transition(&mut self, next: EntityState) {
        debug!(
            table = self.schema.table_name,
            from = %self.state,
            to = %next,
            "Entity state changed"
        );
        self.state = next;
    }
}
