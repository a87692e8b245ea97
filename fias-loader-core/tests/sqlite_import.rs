//! End-to-end import tests against in-memory SQLite.
//!
//! Fixtures are written to a temporary data directory laid out the way the
//! export is distributed (`<data_dir>/xml/AS_<TABLE>_<DATE>_<ID>.XML`).

#![cfg(feature = "sqlite")]
#![allow(clippy::unwrap_used)]

use fias_loader_core::{
    EntityPipeline, EntitySchema, EntityState, FieldMapping, FiasLoaderError, ImportConfig,
    InputFormat, Result, Store, StatusRenderer, StatusView,
    coercion::CoercionKind,
    progress::{NullRenderer, progress_channel},
    registry,
    run_import,
    store::sqlite::SqliteStore,
};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

static KIND: EntitySchema = EntitySchema {
    table_name: "kind",
    element_name: "Kind",
    ddl: "CREATE TABLE kind (id INTEGER NOT NULL, name TEXT NOT NULL, PRIMARY KEY (id))",
    fields: &[
        FieldMapping::new("id", "id", CoercionKind::Integer),
        FieldMapping::new("name", "name", CoercionKind::Text),
    ],
};

static OTHER: EntitySchema = EntitySchema {
    table_name: "other",
    element_name: "Other",
    ddl: "CREATE TABLE other (code TEXT NOT NULL, note TEXT)",
    fields: &[
        FieldMapping::new("CODE", "code", CoercionKind::Text),
        FieldMapping::new("NOTE", "note", CoercionKind::OptionalText),
    ],
};

static BROKEN_DDL: EntitySchema = EntitySchema {
    table_name: "broken",
    element_name: "Broken",
    ddl: "CREATE TABLE broken (",
    fields: &[FieldMapping::new("id", "id", CoercionKind::Integer)],
};

const KIND_OK: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Kinds>
  <Kind id="1" name="Alpha"/>
  <Kind id="2" name="Beta"/>
</Kinds>"#;

const KIND_MISSING_NAME: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Kinds>
  <Kind id="1" name="Alpha"/>
  <Kind id="2"/>
  <Kind id="3" name="Gamma"/>
</Kinds>"#;

const KIND_DUPLICATE_ID: &str = r#"<Kinds>
  <Kind id="1" name="Alpha"/>
  <Kind id="2" name="Beta"/>
  <Kind id="2" name="Again"/>
  <Kind id="3" name="Gamma"/>
</Kinds>"#;

const KIND_TRUNCATED: &str = r#"<Root><Kind id="1" name="A"/>"#;

const OTHER_OK: &str = r#"<Others>
  <Other CODE="01" NOTE="first"/>
  <Other CODE="02"/>
  <Other CODE="03" NOTE=""/>
</Others>"#;

#[derive(Default)]
struct RecordingRenderer {
    finished: Vec<Vec<String>>,
}

impl StatusRenderer for RecordingRenderer {
    fn render(&mut self, view: &StatusView<'_>) {
        if view.finished {
            self.finished.push(view.snapshot.slots().to_vec());
        }
    }
}

fn write_fixture(data_dir: &Path, file_name: &str, contents: &str) {
    let xml_dir = data_dir.join("xml");
    std::fs::create_dir_all(&xml_dir).unwrap();
    std::fs::write(xml_dir.join(file_name), contents).unwrap();
}

async fn memory_store() -> Result<Arc<SqliteStore>> {
    Ok(Arc::new(SqliteStore::in_memory().await?))
}

async fn kind_rows(store: &SqliteStore) -> Vec<(i64, String)> {
    sqlx::query_as("SELECT id, name FROM kind ORDER BY id")
        .fetch_all(store.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_end_to_end_import() -> Result<()> {
    let data_dir = tempfile::tempdir().unwrap();
    write_fixture(data_dir.path(), "AS_KIND_20240101_0001.XML", KIND_OK);
    let store = memory_store().await?;

    let config = ImportConfig::default().with_data_dir(data_dir.path());
    let mut renderer = RecordingRenderer::default();
    let summary = run_import(
        &config,
        store.clone(),
        &[&KIND],
        &mut renderer,
        CancellationToken::new(),
    )
    .await?;

    assert!(summary.all_completed());
    assert_eq!(summary.reports.len(), 1);
    assert_eq!(summary.reports[0].state, EntityState::Completed);
    assert_eq!(summary.reports[0].rows_inserted, 2);
    assert_eq!(summary.snapshot.get(0), Some("Kind 2 rows affected"));
    assert_eq!(renderer.finished, vec![vec!["Kind 2 rows affected".to_string()]]);

    assert_eq!(
        kind_rows(&store).await,
        vec![(1, "Alpha".to_string()), (2, "Beta".to_string())]
    );
    Ok(())
}

#[tokio::test]
async fn test_pipeline_reports_running_count() -> Result<()> {
    let data_dir = tempfile::tempdir().unwrap();
    write_fixture(data_dir.path(), "AS_KIND_20240101_0001.XML", KIND_OK);
    let store = memory_store().await?;

    let (sender, mut receiver) = progress_channel(KIND.element_name, 1000);
    let pipeline = EntityPipeline::new(
        &KIND,
        store.clone(),
        sender,
        data_dir.path().join("xml"),
        InputFormat::Xml,
    );
    let report = pipeline.run().await;

    let mut messages = Vec::new();
    while let Some(event) = receiver.recv().await {
        assert_eq!(event.entity, "Kind");
        messages.push(event.message);
    }

    assert!(report.is_completed());
    assert_eq!(messages, vec!["Kind 1 rows affected", "Kind 2 rows affected"]);
    Ok(())
}

#[tokio::test]
async fn test_missing_attribute_fails_entity_and_keeps_prior_rows() -> Result<()> {
    let data_dir = tempfile::tempdir().unwrap();
    write_fixture(data_dir.path(), "AS_KIND_20240101_0001.XML", KIND_MISSING_NAME);
    let store = memory_store().await?;

    let summary = run_import(
        &ImportConfig::default().with_data_dir(data_dir.path()),
        store.clone(),
        &[&KIND],
        &mut NullRenderer,
        CancellationToken::new(),
    )
    .await?;

    assert!(!summary.all_completed());
    let report = &summary.reports[0];
    assert_eq!(report.state, EntityState::Failed);
    assert_eq!(report.rows_inserted, 1);
    match &report.error {
        Some(FiasLoaderError::Coercion { row, source }) => {
            assert_eq!(*row, 2);
            assert_eq!(source.field, "name");
            assert_eq!(source.raw, None);
        }
        other => unreachable!("expected a coercion error, got {other:?}"),
    }

    let slot = summary.snapshot.get(0).unwrap();
    assert!(slot.starts_with("Kind failed after 1 rows"), "{slot}");
    assert!(slot.contains("name"), "{slot}");

    assert_eq!(kind_rows(&store).await, vec![(1, "Alpha".to_string())]);
    Ok(())
}

#[tokio::test]
async fn test_rejected_insert_fails_entity_and_keeps_prior_rows() -> Result<()> {
    let data_dir = tempfile::tempdir().unwrap();
    write_fixture(data_dir.path(), "AS_KIND_20240101_0001.XML", KIND_DUPLICATE_ID);
    let store = memory_store().await?;

    let summary = run_import(
        &ImportConfig::default().with_data_dir(data_dir.path()),
        store.clone(),
        &[&KIND],
        &mut NullRenderer,
        CancellationToken::new(),
    )
    .await?;

    let report = &summary.reports[0];
    assert_eq!(report.state, EntityState::Failed);
    assert_eq!(report.rows_inserted, 2);
    assert!(
        matches!(
            report.error,
            Some(FiasLoaderError::Insert { row: 3, inserted: 2, .. })
        ),
        "{:?}",
        report.error
    );

    let slot = summary.snapshot.get(0).unwrap();
    assert!(slot.starts_with("Kind failed after 2 rows: "), "{slot}");

    assert_eq!(
        kind_rows(&store).await,
        vec![(1, "Alpha".to_string()), (2, "Beta".to_string())]
    );
    Ok(())
}

#[tokio::test]
async fn test_truncated_document_fails_entity() -> Result<()> {
    let data_dir = tempfile::tempdir().unwrap();
    write_fixture(data_dir.path(), "AS_KIND_20240101_0001.XML", KIND_TRUNCATED);
    let store = memory_store().await?;

    let summary = run_import(
        &ImportConfig::default().with_data_dir(data_dir.path()),
        store.clone(),
        &[&KIND],
        &mut NullRenderer,
        CancellationToken::new(),
    )
    .await?;

    assert!(!summary.all_completed());
    let report = &summary.reports[0];
    assert_eq!(report.state, EntityState::Failed);
    assert_eq!(report.rows_inserted, 1);
    assert!(
        matches!(report.error, Some(FiasLoaderError::Decode { .. })),
        "{:?}",
        report.error
    );

    let slot = summary.snapshot.get(0).unwrap();
    assert!(slot.starts_with("Kind failed after 1 rows"), "{slot}");

    assert_eq!(kind_rows(&store).await, vec![(1, "A".to_string())]);
    Ok(())
}

#[tokio::test]
async fn test_failure_is_isolated_to_one_entity() -> Result<()> {
    let data_dir = tempfile::tempdir().unwrap();
    write_fixture(data_dir.path(), "AS_KIND_20240101_0001.XML", KIND_MISSING_NAME);
    write_fixture(data_dir.path(), "AS_OTHER_20240101_0002.XML", OTHER_OK);
    let store = memory_store().await?;

    let summary = run_import(
        &ImportConfig::default().with_data_dir(data_dir.path()),
        store.clone(),
        &[&KIND, &OTHER],
        &mut NullRenderer,
        CancellationToken::new(),
    )
    .await?;

    assert_eq!(summary.reports[0].state, EntityState::Failed);
    assert_eq!(summary.reports[1].state, EntityState::Completed);
    assert_eq!(summary.reports[1].rows_inserted, 3);
    assert_eq!(summary.snapshot.get(1), Some("Other 3 rows affected"));
    assert_eq!(summary.failed().count(), 1);

    let notes: Vec<(String, Option<String>)> =
        sqlx::query_as("SELECT code, note FROM other ORDER BY code")
            .fetch_all(store.pool())
            .await
            .unwrap();
    assert_eq!(
        notes,
        vec![
            ("01".to_string(), Some("first".to_string())),
            ("02".to_string(), None),
            ("03".to_string(), Some(String::new())),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_rerun_replaces_table_contents() -> Result<()> {
    let data_dir = tempfile::tempdir().unwrap();
    write_fixture(data_dir.path(), "AS_KIND_20240101_0001.XML", KIND_OK);
    let store = memory_store().await?;
    let config = ImportConfig::default().with_data_dir(data_dir.path());

    for _ in 0..2 {
        let summary = run_import(
            &config,
            store.clone(),
            &[&KIND],
            &mut NullRenderer,
            CancellationToken::new(),
        )
        .await?;
        assert!(summary.all_completed());
    }

    assert_eq!(kind_rows(&store).await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_missing_input_file_fails_after_provisioning() -> Result<()> {
    let data_dir = tempfile::tempdir().unwrap();
    write_fixture(data_dir.path(), "AS_OTHER_20240101_0002.XML", OTHER_OK);
    let store = memory_store().await?;

    let summary = run_import(
        &ImportConfig::default().with_data_dir(data_dir.path()),
        store.clone(),
        &[&KIND],
        &mut NullRenderer,
        CancellationToken::new(),
    )
    .await?;

    let report = &summary.reports[0];
    assert_eq!(report.state, EntityState::Failed);
    assert!(matches!(
        report.error,
        Some(FiasLoaderError::FileNotFound { ref table, .. }) if table == "kind"
    ));
    assert!(kind_rows(&store).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_rejected_ddl_fails_without_streaming() -> Result<()> {
    let data_dir = tempfile::tempdir().unwrap();
    write_fixture(data_dir.path(), "AS_BROKEN_20240101_0001.XML", r#"<R><Broken id="1"/></R>"#);
    let store = memory_store().await?;

    let (sender, mut receiver) = progress_channel(BROKEN_DDL.element_name, 10);
    let report = EntityPipeline::new(
        &BROKEN_DDL,
        store.clone(),
        sender,
        data_dir.path().join("xml"),
        InputFormat::Xml,
    )
    .run()
    .await;

    assert_eq!(report.state, EntityState::Failed);
    assert_eq!(report.rows_inserted, 0);
    assert!(matches!(
        report.error,
        Some(FiasLoaderError::Schema { statement: "CREATE TABLE", .. })
    ));

    let mut messages = Vec::new();
    while let Some(event) = receiver.recv().await {
        messages.push(event.message);
    }
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Broken failed after 0 rows"));
    Ok(())
}

#[tokio::test]
async fn test_registry_schema_imports_actual_statuses() -> Result<()> {
    let data_dir = tempfile::tempdir().unwrap();
    write_fixture(
        data_dir.path(),
        "AS_ACTSTAT_20160609_c8f8d9a5-5b46-4b1a-9b5f-5b0c4e1a0e6d.XML",
        r#"<?xml version="1.0" encoding="utf-8"?>
<ActualStatuses>
  <ActualStatus ACTSTATID="0" NAME="Не актуальный"/>
  <ActualStatus ACTSTATID="1" NAME="Актуальный"/>
</ActualStatuses>"#,
    );
    let store = memory_store().await?;
    let schemas = registry::select(&["actstat".to_string()])?;

    let summary = run_import(
        &ImportConfig::default().with_data_dir(data_dir.path()),
        store.clone(),
        &schemas,
        &mut NullRenderer,
        CancellationToken::new(),
    )
    .await?;

    assert!(summary.all_completed());
    assert_eq!(summary.total_rows(), 2);
    assert_eq!(summary.snapshot.get(0), Some("ActualStatus 2 rows affected"));

    let names: Vec<(i64, String)> =
        sqlx::query_as("SELECT act_stat_id, name FROM actstat ORDER BY act_stat_id")
            .fetch_all(store.pool())
            .await
            .unwrap();
    assert_eq!(names[1], (1, "Актуальный".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_every_registry_table_provisions() -> Result<()> {
    let store = memory_store().await?;

    for schema in registry::fias_entities() {
        fias_loader_core::provision::provision(schema, store.as_ref()).await?;
    }

    let (tables,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(tables, 15);
    Ok(())
}

#[tokio::test]
async fn test_summary_serializes_error_chain() -> Result<()> {
    let data_dir = tempfile::tempdir().unwrap();
    write_fixture(data_dir.path(), "AS_KIND_20240101_0001.XML", KIND_MISSING_NAME);
    let store = memory_store().await?;

    let summary = run_import(
        &ImportConfig::default().with_data_dir(data_dir.path()),
        store.clone(),
        &[&KIND],
        &mut NullRenderer,
        CancellationToken::new(),
    )
    .await?;

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["format"], "xml");
    assert_eq!(json["cancelled"], false);
    assert_eq!(json["reports"][0]["table"], "kind");
    assert_eq!(json["reports"][0]["state"], "failed");
    assert_eq!(json["reports"][0]["rows_inserted"], 1);
    assert!(
        json["reports"][0]["error"]
            .as_str()
            .unwrap()
            .contains("field 'name'")
    );

    store.close().await;
    Ok(())
}
