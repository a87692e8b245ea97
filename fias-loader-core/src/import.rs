//! Import orchestration.
//!
//! Launches one [`EntityPipeline`] per schema as an independent task, runs
//! the progress aggregator in the foreground, and collects one
//! [`EntityReport`] per schema once every pipeline has ended.

use crate::config::ImportConfig;
use crate::error::{FiasLoaderError, Result};
use crate::pipeline::{EntityPipeline, EntityReport, EntityState};
use crate::progress::{
    AggregatorExit, ProgressAggregator, StatusRenderer, StatusSnapshot, progress_channel,
};
use crate::schema::EntitySchema;
use crate::store::Store;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Result of one import run.
#[derive(Debug, Serialize)]
pub struct ImportSummary {
    /// Input format directory the run read from
    pub format: &'static str,
    /// One report per finished pipeline, in registry order
    pub reports: Vec<EntityReport>,
    /// Set when the run was quit before every pipeline ended
    pub cancelled: bool,
    /// Wall time of the run
    #[serde(serialize_with = "serialize_seconds")]
    pub elapsed: Duration,
    /// Status lines at exit
    #[serde(skip)]
    pub snapshot: StatusSnapshot,
}

impl ImportSummary {
    /// Whether the run finished and every entity completed.
    pub fn all_completed(&self) -> bool {
        !self.cancelled && self.reports.iter().all(EntityReport::is_completed)
    }

    /// Reports of failed entities.
    pub fn failed(&self) -> impl Iterator<Item = &EntityReport> {
        self.reports.iter().filter(|report| !report.is_completed())
    }

    /// Rows inserted across all entities.
    pub fn total_rows(&self) -> u64 {
        self.reports
            .iter()
            .fold(0u64, |total, report| total.saturating_add(report.rows_inserted))
    }
}

fn serialize_seconds<S: Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

/// Imports every schema in `schemas` into `store`.
///
/// Each schema gets its own pipeline task and its own status slot, in the
/// order given. The call returns when every pipeline has ended, or as soon
/// as `cancel` fires; in the latter case pipelines still running are
/// aborted.
///
/// An unsupported input format performs no work and returns an empty
/// summary.
///
/// # Errors
/// Returns a configuration error if `config` is invalid. Pipeline failures
/// are reported in the summary, not as errors.
pub async fn run_import<R>(
    config: &ImportConfig,
    store: Arc<dyn Store>,
    schemas: &[&'static EntitySchema],
    renderer: &mut R,
    cancel: CancellationToken,
) -> Result<ImportSummary>
where
    R: StatusRenderer + ?Sized,
{
    config.validate()?;

    if !config.format.is_supported() {
        warn!(format = %config.format, "Input format is not importable, nothing to do");
        return Ok(ImportSummary {
            format: config.format.directory_name(),
            reports: Vec::new(),
            cancelled: false,
            elapsed: Duration::ZERO,
            snapshot: StatusSnapshot::new(0),
        });
    }

    let input_dir = config.input_dir();
    info!(
        entities = schemas.len(),
        input_dir = %input_dir.display(),
        store = %store.store_type(),
        "Starting import"
    );

    let mut tasks = JoinSet::new();
    let mut receivers = Vec::with_capacity(schemas.len());

    for (slot, schema) in schemas.iter().copied().enumerate() {
        let (sender, receiver) = progress_channel(schema.element_name, config.channel_capacity);
        receivers.push(receiver);

        let pipeline = EntityPipeline::new(
            schema,
            Arc::clone(&store),
            sender,
            input_dir.clone(),
            config.format,
        );
        tasks.spawn(async move { (slot, pipeline.run().await) });
    }

    let outcome = ProgressAggregator::new(receivers, config.render_interval)
        .run(renderer, cancel)
        .await;

    let mut slots: Vec<Option<EntityReport>> = schemas.iter().map(|_| None).collect();
    let cancelled = outcome.exit == AggregatorExit::Cancelled;

    if cancelled {
        warn!("Import quit before all pipelines ended");
        while let Some(joined) = tasks.try_join_next() {
            record_report(&mut slots, joined);
        }
        tasks.abort_all();
    } else {
        while let Some(joined) = tasks.join_next().await {
            record_report(&mut slots, joined);
        }
    }

    let reports = schemas
        .iter()
        .zip(slots)
        .filter_map(|(schema, report)| match report {
            Some(report) => Some(report),
            None if cancelled => None,
            None => Some(EntityReport::failed(
                schema,
                0,
                FiasLoaderError::Pipeline {
                    entity: schema.element_name.to_string(),
                    context: "task did not report".to_string(),
                },
            )),
        })
        .collect::<Vec<_>>();

    let summary = ImportSummary {
        format: config.format.directory_name(),
        reports,
        cancelled,
        elapsed: outcome.elapsed,
        snapshot: outcome.snapshot,
    };

    for report in &summary.reports {
        match report.state {
            EntityState::Completed => {
                info!(table = report.table, rows = report.rows_inserted, "Entity completed");
            }
            _ => warn!(
                table = report.table,
                rows = report.rows_inserted,
                "Entity failed"
            ),
        }
    }

    Ok(summary)
}

fn record_report(
    slots: &mut [Option<EntityReport>],
    joined: std::result::Result<(usize, EntityReport), tokio::task::JoinError>,
) {
    match joined {
        Ok((slot, report)) => {
            if let Some(entry) = slots.get_mut(slot) {
                *entry = Some(report);
            }
        }
        Err(join_error) => {
            warn!("Pipeline task ended abnormally: {}", join_error);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::coercion::TypedValue;
    use crate::config::InputFormat;
    use crate::progress::NullRenderer;
    use crate::store::{StoreError, StoreType};
    use async_trait::async_trait;

    struct UnusedStore;

    #[async_trait]
    impl Store for UnusedStore {
        async fn execute(
            &self,
            _statement: &str,
            _params: &[TypedValue],
        ) -> std::result::Result<u64, StoreError> {
            Err("store must not be used".into())
        }

        fn placeholder(&self, position: usize) -> String {
            format!("?{position}")
        }

        fn store_type(&self) -> StoreType {
            StoreType::SQLite
        }

        async fn close(&self) {}
    }

    #[tokio::test]
    async fn test_dbf_format_does_no_work() {
        let config = ImportConfig::default().with_format(InputFormat::Dbf);
        let summary = run_import(
            &config,
            Arc::new(UnusedStore),
            &crate::registry::fias_entities(),
            &mut NullRenderer,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(summary.reports.is_empty());
        assert!(summary.all_completed());
        assert_eq!(summary.format, "dbf");
    }

    #[tokio::test]
    async fn test_empty_schema_list_completes() {
        let summary = run_import(
            &ImportConfig::default(),
            Arc::new(UnusedStore),
            &[],
            &mut NullRenderer,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(summary.all_completed());
        assert_eq!(summary.total_rows(), 0);
    }
}
