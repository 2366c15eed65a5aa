//! In-memory document store using `DashMap`.
//!
//! Data is lost on process restart. Each record carries an insertion
//! sequence number so `find_all` returns a stable order, which keeps seeded
//! training runs reproducible.

use super::DocumentStore;
use crate::record::{Fields, Record, RecordId, Value};
use crate::Result;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
struct Entry {
    seq: u64,
    record: Record,
}

/// In-memory record store on a lock-free concurrent hashmap.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    records: DashMap<RecordId, Entry>,
    next_seq: AtomicU64,
}

impl MemoryDocumentStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn insert(&self, record: Record) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.records.insert(record.id(), Entry { seq, record });
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn delete_all(&self) -> Result<()> {
        self.records.clear();
        Ok(())
    }

    async fn insert_many(&self, records: Vec<Record>) -> Result<()> {
        for record in records {
            self.insert(record);
        }
        Ok(())
    }

    async fn insert_one(&self, record: Record) -> Result<()> {
        self.insert(record);
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Record>> {
        let mut entries: Vec<(u64, Record)> = self
            .records
            .iter()
            .map(|e| (e.seq, e.record.clone()))
            .collect();
        entries.sort_unstable_by_key(|(seq, _)| *seq);
        Ok(entries.into_iter().map(|(_, record)| record).collect())
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<Record>> {
        Ok(self.records.get(&id).map(|e| e.record.clone()))
    }

    async fn update_by_id(&self, id: RecordId, patch: Fields) -> Result<Option<Record>> {
        Ok(self.records.get_mut(&id).map(|mut e| {
            e.record.merge(patch);
            e.record.clone()
        }))
    }

    async fn delete_by_id(&self, id: RecordId) -> Result<bool> {
        Ok(self.records.remove(&id).is_some())
    }

    async fn set_field(&self, id: RecordId, name: &str, value: Value) -> Result<()> {
        if let Some(mut e) = self.records.get_mut(&id) {
            e.record.set(name, value);
        }
        Ok(())
    }

    async fn unset_field(&self, id: RecordId, name: &str) -> Result<()> {
        if let Some(mut e) = self.records.get_mut(&id) {
            e.record.unset(name);
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.len())
    }
}
