//! Snapshot state
//!
//! The schema and the model registry are published together as one immutable
//! [`Snapshot`]. Readers clone the `Arc` and keep a consistent view for the
//! whole call; writers serialize on [`SnapshotCell::writer`], build the next
//! snapshot and swap it in.
//!
//! `dataset_epoch` only moves when the dataset is replaced wholesale. A
//! training run compares it before installing its models.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::{Mutex, MutexGuard};

use crate::registry::ModelRegistry;
use crate::schema::DatasetSchema;

/// Consistent view of schema and models.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    generation: u64,
    dataset_epoch: u64,
    schema: Option<Arc<DatasetSchema>>,
    models: Arc<ModelRegistry>,
}

impl Snapshot {
    /// Increments on every swap.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Increments on every wholesale dataset replacement.
    #[must_use]
    pub const fn dataset_epoch(&self) -> u64 {
        self.dataset_epoch
    }

    /// Current schema, if any.
    #[must_use]
    pub fn schema(&self) -> Option<&DatasetSchema> {
        self.schema.as_deref()
    }

    /// Shared handle to the current schema.
    #[must_use]
    pub fn schema_arc(&self) -> Option<Arc<DatasetSchema>> {
        self.schema.clone()
    }

    /// Current models.
    #[must_use]
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Next snapshot for a new dataset: new schema, no models.
    #[must_use]
    pub fn replace_dataset(&self, schema: DatasetSchema) -> Self {
        Self {
            generation: self.generation + 1,
            dataset_epoch: self.dataset_epoch + 1,
            schema: Some(Arc::new(schema)),
            models: Arc::new(ModelRegistry::new()),
        }
    }

    /// Next snapshot with a structurally edited schema; models are kept.
    #[must_use]
    pub fn with_schema(&self, schema: DatasetSchema) -> Self {
        Self {
            generation: self.generation + 1,
            dataset_epoch: self.dataset_epoch,
            schema: Some(Arc::new(schema)),
            models: Arc::clone(&self.models),
        }
    }

    /// Next snapshot with `models` replacing the registry.
    #[must_use]
    pub fn with_models(&self, models: ModelRegistry) -> Self {
        Self {
            generation: self.generation + 1,
            dataset_epoch: self.dataset_epoch,
            schema: self.schema.clone(),
            models: Arc::new(models),
        }
    }
}

/// Holder of the current snapshot.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    current: RwLock<Arc<Snapshot>>,
    writer: Mutex<()>,
}

impl SnapshotCell {
    /// Cell holding an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot.
    ///
    /// The lock only guards an `Arc` swap, so a poisoned lock still holds a
    /// complete snapshot and is read through.
    #[must_use]
    pub fn load(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Acquire the single-writer gate.
    pub async fn writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    /// Publish `next`. Callers must hold the writer gate.
    pub fn store(&self, _gate: &MutexGuard<'_, ()>, next: Snapshot) -> Arc<Snapshot> {
        let next = Arc::new(next);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::clone(&next);
        next
    }
}
