//! Grid engine: the request-level surface
//!
//! [`GridEngine`] ties the document store, the snapshot cell and the
//! training pipeline together. Every method maps onto one client request;
//! errors carry their status via [`Error::status_code`](crate::Error::status_code).
//!
//! ## Concurrency
//!
//! - Readers (`schema`, `predict`) load one snapshot and never block writers.
//! - Mutations hold the writer gate for their whole duration, including the
//!   store propagation, and publish a single new snapshot at the end.
//! - `train` holds nothing while fitting. It re-takes the gate to install the
//!   models and fails with `DatasetReplaced` if the dataset changed meanwhile.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use trueno_grid::engine::GridEngine;
//!
//! # async fn example() -> trueno_grid::Result<()> {
//! let engine = GridEngine::builder().build();
//!
//! let mut csv = String::from("temp,humidity,pressure\n");
//! for i in 0..20 {
//!     csv.push_str(&format!("{},{},{}\n", 20 + i, 40 + (i * 3) % 7, 1000 + 2 * i));
//! }
//! let schema = engine.replace_dataset(csv.as_bytes()).await?;
//! assert_eq!(schema.target(), Some("pressure"));
//!
//! engine.train().await?;
//! let values = HashMap::from([("temp".to_string(), 25.0), ("humidity".to_string(), 42.0)]);
//! let prediction = engine.predict("linear", &values).await?;
//! assert!(prediction.prediction.is_finite());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{Resource, ValidationError};
use crate::predict::Prediction;
use crate::record::{Fields, Record, RecordId, Value};
use crate::schema::{compute_schema, infer_from_records, AddColumn, DatasetSchema};
use crate::state::{Snapshot, SnapshotCell};
use crate::store::{DocumentStore, MemoryDocumentStore};
use crate::tabular::{export_columns, parse_table, write_csv, Table};
use crate::training::{TrainingPipeline, TrainingReport};
use crate::{Error, Result};

/// Result of [`GridEngine::add_column`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnAdded {
    /// Column appended; carries the published schema.
    Added(Arc<DatasetSchema>),
    /// Column was already present; carries the unchanged schema.
    AlreadyExists(Arc<DatasetSchema>),
}

impl ColumnAdded {
    /// Schema after the call, whichever way it went.
    #[must_use]
    pub fn schema(&self) -> &DatasetSchema {
        match self {
            Self::Added(schema) | Self::AlreadyExists(schema) => schema,
        }
    }
}

/// Schema, records and models behind one handle.
#[derive(Debug)]
pub struct GridEngine<S = MemoryDocumentStore> {
    store: Arc<S>,
    state: SnapshotCell,
    config: EngineConfig,
}

impl GridEngine<MemoryDocumentStore> {
    /// Builder backed by an in-memory store.
    #[must_use]
    pub fn builder() -> GridEngineBuilder<MemoryDocumentStore> {
        GridEngineBuilder::default()
    }
}

/// Builder for [`GridEngine`].
#[derive(Debug, Default)]
pub struct GridEngineBuilder<S> {
    config: EngineConfig,
    store: S,
}

impl<S: DocumentStore> GridEngineBuilder<S> {
    /// Set engine configuration
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use another document store
    #[must_use]
    pub fn store<T: DocumentStore>(self, store: T) -> GridEngineBuilder<T> {
        GridEngineBuilder {
            config: self.config,
            store,
        }
    }

    /// Build the engine
    #[must_use]
    pub fn build(self) -> GridEngine<S> {
        GridEngine {
            store: Arc::new(self.store),
            state: SnapshotCell::new(),
            config: self.config,
        }
    }
}

impl<S: DocumentStore> GridEngine<S> {
    /// Engine over `store` with default configuration.
    #[must_use]
    pub fn new(store: S) -> Self {
        GridEngineBuilder {
            config: EngineConfig::default(),
            store,
        }
        .build()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Underlying document store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current snapshot of schema and models.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.load()
    }

    // Dataset lifecycle

    /// Replace the whole dataset with the contents of a CSV upload.
    ///
    /// # Errors
    ///
    /// Returns `Validation(EmptyDataset)` if no data row survives parsing, or
    /// a storage error.
    pub async fn replace_dataset(&self, bytes: &[u8]) -> Result<Arc<DatasetSchema>> {
        let table = parse_table(bytes)?;
        self.replace_from_rows(table).await
    }

    /// Replace the whole dataset with already-parsed rows.
    ///
    /// Store contents, schema and models all change together; readers see
    /// either the old dataset or the new one.
    ///
    /// # Errors
    ///
    /// Returns `Validation(EmptyDataset)` for a table without rows, or a
    /// storage error.
    pub async fn replace_from_rows(&self, table: Table) -> Result<Arc<DatasetSchema>> {
        if table.is_empty() {
            return Err(ValidationError::EmptyDataset.into());
        }
        let schema = compute_schema(&table);
        let records = table.into_records();

        let gate = self.state.writer().await;
        self.store.delete_all().await?;
        self.store.insert_many(records).await?;
        let next = self.state.store(&gate, self.state.load().replace_dataset(schema));

        info!(
            rows = next.schema().map_or(0, DatasetSchema::samples),
            columns = next.schema().map_or(0, |s| s.columns().len()),
            label = ?next.schema().and_then(DatasetSchema::target),
            "Dataset replaced"
        );
        published_schema(&next)
    }

    /// Start over with a user-declared, empty table.
    ///
    /// # Errors
    ///
    /// Returns `Validation(NoColumns)` if no usable column name is given, or
    /// a storage error.
    pub async fn create_empty<I, T>(&self, columns: I) -> Result<Arc<DatasetSchema>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let schema = DatasetSchema::empty(columns)?;

        let gate = self.state.writer().await;
        self.store.delete_all().await?;
        let next = self.state.store(&gate, self.state.load().replace_dataset(schema));

        info!(columns = ?next.schema().map(DatasetSchema::columns), "Empty dataset created");
        published_schema(&next)
    }

    // Schema

    /// Current schema.
    ///
    /// With no schema loaded but records in the store, a schema is inferred
    /// from up to `schema_sample_limit` records and installed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound(Dataset)` when there is no schema and no record.
    pub async fn schema(&self) -> Result<Arc<DatasetSchema>> {
        if let Some(schema) = self.state.load().schema_arc() {
            return Ok(schema);
        }

        let gate = self.state.writer().await;
        let current = self.state.load();
        if let Some(schema) = current.schema_arc() {
            return Ok(schema);
        }

        let mut records = self.store.find_all().await?;
        if records.is_empty() {
            return Err(Resource::Dataset.into());
        }
        records.truncate(self.config.schema_sample_limit);
        let schema = infer_from_records(&records);
        debug!(sampled = records.len(), "Schema inferred from stored records");

        let next = self.state.store(&gate, current.with_schema(schema));
        published_schema(&next)
    }

    /// Append a column and add it, as null, to every record.
    ///
    /// # Errors
    ///
    /// Returns `Validation(EmptyName)` for a blank name,
    /// `Validation(NoSchema)` with no schema loaded, or a storage error.
    /// Propagation to the store is not atomic.
    pub async fn add_column(&self, name: &str) -> Result<ColumnAdded> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let gate = self.state.writer().await;
        let current = self.state.load();
        let schema = current.schema_arc().ok_or(ValidationError::NoSchema)?;

        let next = match schema.add_column(name)? {
            AddColumn::AlreadyExists => {
                debug!(column = name, "Column already exists");
                return Ok(ColumnAdded::AlreadyExists(schema));
            }
            AddColumn::Added(next) => next,
        };

        for record in self.store.find_all().await? {
            self.store.set_field(record.id(), name, Value::Null).await?;
        }
        let published = self.state.store(&gate, current.with_schema(next));

        info!(column = name, label = ?published.schema().and_then(DatasetSchema::target), "Column added");
        published_schema(&published).map(ColumnAdded::Added)
    }

    /// Remove a column from the schema and from every record.
    ///
    /// Trained models are kept even if they used the column.
    ///
    /// # Errors
    ///
    /// Returns `Validation(NoSchema)` with no schema loaded,
    /// `NotFound(Column)` for an unknown name, or a storage error.
    pub async fn delete_column(&self, name: &str) -> Result<Arc<DatasetSchema>> {
        let gate = self.state.writer().await;
        let current = self.state.load();
        let schema = current.schema().ok_or(ValidationError::NoSchema)?;
        let next = schema.delete_column(name)?;

        for record in self.store.find_all().await? {
            self.store.unset_field(record.id(), name).await?;
        }
        let published = self.state.store(&gate, current.with_schema(next));

        if !published.models().is_empty() {
            warn!(column = name, "Column removed while models are trained; retrain to refresh them");
        }
        info!(column = name, "Column deleted");
        published_schema(&published)
    }

    // Records

    /// Every record in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn list_records(&self) -> Result<Vec<Record>> {
        self.store.find_all().await
    }

    /// One record by its textual id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` or `NotFound(Record)`.
    pub async fn get_record(&self, id: &str) -> Result<Record> {
        let id = RecordId::parse(id)?;
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| Resource::Record.into())
    }

    /// Store a new record.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn create_record(&self, data: Fields) -> Result<Record> {
        let record = Record::new(data);
        self.store.insert_one(record.clone()).await?;
        debug!(id = %record.id(), "Record created");
        Ok(record)
    }

    /// Merge `patch` into an existing record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` or `NotFound(Record)`.
    pub async fn update_record(&self, id: &str, patch: Fields) -> Result<Record> {
        let id = RecordId::parse(id)?;
        let record = self
            .store
            .update_by_id(id, patch)
            .await?
            .ok_or(Resource::Record)?;
        debug!(%id, "Record updated");
        Ok(record)
    }

    /// Delete one record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` or `NotFound(Record)`.
    pub async fn delete_record(&self, id: &str) -> Result<()> {
        let id = RecordId::parse(id)?;
        if !self.store.delete_by_id(id).await? {
            return Err(Resource::Record.into());
        }
        debug!(%id, "Record deleted");
        Ok(())
    }

    /// Render the stored dataset as CSV.
    ///
    /// Schema columns come first, then any other field in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound(Data)` when the store is empty.
    pub async fn export_csv(&self) -> Result<Vec<u8>> {
        let records = self.store.find_all().await?;
        if records.is_empty() {
            return Err(Resource::Data.into());
        }
        let snapshot = self.state.load();
        let preferred = snapshot.schema().map(DatasetSchema::columns).unwrap_or_default();
        write_csv(&export_columns(preferred, &records), &records)
    }

    // Models

    /// Train every algorithm on the stored records and install the models.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's `Validation` errors, or `DatasetReplaced` if
    /// the dataset was replaced while the models were fitting.
    pub async fn train(&self) -> Result<TrainingReport> {
        let started = self.state.load();
        let records = self.store.find_all().await?;
        let schema = started.schema_arc();
        let pipeline = TrainingPipeline::new(self.config.training.clone());

        info!(records = records.len(), "Training started");
        let outcome = tokio::task::spawn_blocking(move || pipeline.train(schema.as_deref(), &records))
            .await
            .map_err(|e| Error::Other(format!("Training task failed: {e}")))??;

        let gate = self.state.writer().await;
        let current = self.state.load();
        if current.dataset_epoch() != started.dataset_epoch() {
            warn!(
                started = started.dataset_epoch(),
                current = current.dataset_epoch(),
                "Dataset replaced during training, discarding models"
            );
            return Err(Error::DatasetReplaced);
        }
        let registry = current.models().with_models(outcome.models);
        self.state.store(&gate, current.with_models(registry));

        info!(samples = outcome.report.samples, "Training finished");
        Ok(outcome.report)
    }

    /// Predict with one trained model.
    ///
    /// # Errors
    ///
    /// See [`predict::predict`](crate::predict::predict).
    pub async fn predict(&self, algorithm_id: &str, values: &HashMap<String, f64>) -> Result<Prediction> {
        let snapshot = self.state.load();
        crate::predict::predict(snapshot.schema(), snapshot.models(), algorithm_id, values)
    }
}

fn published_schema(snapshot: &Snapshot) -> Result<Arc<DatasetSchema>> {
    snapshot
        .schema_arc()
        .ok_or_else(|| Error::Other("published snapshot has no schema".to_string()))
}
