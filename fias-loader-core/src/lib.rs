//! Concurrent loader for the FIAS address registry export.
//!
//! Each entity kind of the export (address objects, houses, status
//! dictionaries, ...) is imported by its own pipeline: its table is
//! recreated, its XML file is streamed element by element, and every element
//! is coerced into typed column values and inserted. All pipelines run at
//! once and report progress over bounded channels to one aggregator, which
//! keeps the latest status line per entity and drives a renderer on a fixed
//! tick.
//!
//! # Architecture
//! - [`registry`] holds the static [`EntitySchema`] of every entity kind
//! - [`decoder`] streams matching XML elements with constant memory
//! - [`coercion`] turns attribute text into [`TypedValue`]s
//! - [`provision`] and [`insert`] talk to a [`Store`]
//! - [`pipeline`] runs one entity, [`progress`] aggregates status
//! - [`import`] wires everything together
//!
//! Failures are local to one entity; only the initial store connection is
//! fatal to a run.

pub mod coercion;
pub mod config;
pub mod decoder;
pub mod discovery;
pub mod error;
pub mod import;
pub mod insert;
pub mod logging;
pub mod pipeline;
pub mod progress;
pub mod provision;
pub mod registry;
pub mod schema;
pub mod store;

// Re-export commonly used types
pub use coercion::{CoercionError, CoercionKind, TypedValue, coerce};
pub use config::{ImportConfig, InputFormat};
pub use error::{FiasLoaderError, Result};
pub use import::{ImportSummary, run_import};
pub use pipeline::{EntityPipeline, EntityReport, EntityState};
pub use progress::{StatusRenderer, StatusSnapshot, StatusView};
pub use schema::{EntitySchema, FieldMapping, RawElement, TypedRecord};
pub use store::{Store, StoreConfig, StoreType, create_store};
