//! Document store for dataset records
//!
//! The engine never owns records directly: it talks to a [`DocumentStore`],
//! a collection of heterogeneous key/value documents. Column add/delete is
//! propagated by looping [`DocumentStore::set_field`] /
//! [`DocumentStore::unset_field`] over every record; that loop is not atomic.
//!
//! # Example
//!
//! ```rust
//! use trueno_grid::record::{Fields, Record, Value};
//! use trueno_grid::store::{DocumentStore, MemoryDocumentStore};
//!
//! # async fn example() -> trueno_grid::Result<()> {
//! let store = MemoryDocumentStore::new();
//!
//! let record = Record::new(Fields::from([("temp".to_string(), Value::Number(20.5))]));
//! let id = record.id();
//! store.insert_one(record).await?;
//!
//! assert!(store.find_by_id(id).await?.is_some());
//! assert!(store.delete_by_id(id).await?);
//! # Ok(())
//! # }
//! ```

mod memory;

pub use memory::MemoryDocumentStore;

use crate::record::{Fields, Record, RecordId, Value};
use crate::Result;
use std::future::Future;

/// Record storage collaborator.
pub trait DocumentStore: Send + Sync {
    /// Remove every record.
    fn delete_all(&self) -> impl Future<Output = Result<()>> + Send;

    /// Insert many records, keeping their order.
    fn insert_many(&self, records: Vec<Record>) -> impl Future<Output = Result<()>> + Send;

    /// Insert one record.
    fn insert_one(&self, record: Record) -> impl Future<Output = Result<()>> + Send;

    /// All records in insertion order.
    fn find_all(&self) -> impl Future<Output = Result<Vec<Record>>> + Send;

    /// Look up one record.
    fn find_by_id(&self, id: RecordId) -> impl Future<Output = Result<Option<Record>>> + Send;

    /// Merge `patch` into a record.
    ///
    /// Returns the updated record, or `None` if the id is unknown.
    fn update_by_id(
        &self,
        id: RecordId,
        patch: Fields,
    ) -> impl Future<Output = Result<Option<Record>>> + Send;

    /// Delete a record. Returns whether it existed.
    fn delete_by_id(&self, id: RecordId) -> impl Future<Output = Result<bool>> + Send;

    /// Set one field on one record. No-op for unknown ids.
    fn set_field(
        &self,
        id: RecordId,
        name: &str,
        value: Value,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove one field from one record. No-op for unknown ids.
    fn unset_field(&self, id: RecordId, name: &str) -> impl Future<Output = Result<()>> + Send;

    /// Number of records.
    fn count(&self) -> impl Future<Output = Result<usize>> + Send {
        async move { Ok(self.find_all().await?.len()) }
    }
}
