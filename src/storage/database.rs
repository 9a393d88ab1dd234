//! Thread-safe database container.
//!
//! Collections live in a sharded concurrent map, `name →
//! Arc<RwLock<Collection>>`: resolving a collection by name never takes a
//! global lock, and each collection serializes its own readers and writers
//! independently. Operations on one collection are atomic and linearizable
//! with respect to that collection; nothing spans two collections.

use crate::config::MAX_DIMENSION;
use crate::distance::Distance;
use crate::error::{Error, Result};
use crate::mmr;
use crate::record::{Metadata, Record};
use crate::search;
use crate::storage::collection::Collection;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Handle to a set of named collections. Cheap to clone and share.
#[derive(Default)]
pub struct Database {
    collections: DashMap<String, Arc<RwLock<Collection>>>,
}

impl Database {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    fn collection(&self, name: &str) -> Result<Arc<RwLock<Collection>>> {
        self.collections
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    /// Creates a collection.
    ///
    /// `metric` accepts the spellings of [`Distance::parse`]. `keep_raw =
    /// false` only takes effect for the binary metric; other metrics retain
    /// raw vectors unconditionally.
    pub fn create_collection(
        &self,
        name: &str,
        dim: usize,
        metric: &str,
        keep_raw: bool,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "collection name must be non-empty".into(),
            ));
        }
        if dim == 0 {
            return Err(Error::InvalidArgument("dimension must be at least 1".into()));
        }
        if dim > MAX_DIMENSION {
            return Err(Error::InvalidArgument(format!(
                "dimension {dim} exceeds the maximum of {MAX_DIMENSION}"
            )));
        }
        let metric = Distance::parse(metric)?;

        match self.collections.entry(name.to_string()) {
            Entry::Occupied(_) => Err(Error::CollectionExists(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(RwLock::new(Collection::new(dim, metric, keep_raw))));
                debug!(collection = name, dim, metric = %metric, "collection created");
                Ok(())
            }
        }
    }

    /// Drops a collection and everything in it.
    pub fn delete_collection(&self, name: &str) -> Result<()> {
        match self.collections.remove(name) {
            Some(_) => {
                debug!(collection = name, "collection deleted");
                Ok(())
            }
            None => Err(Error::CollectionNotFound(name.to_string())),
        }
    }

    /// Names of all collections, in no particular order.
    pub fn list_collections(&self) -> Vec<String> {
        self.collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of live records in a collection.
    pub fn count(&self, collection: &str) -> Result<usize> {
        Ok(self.collection(collection)?.read().len())
    }

    /// Inserts one record.
    pub fn insert(
        &self,
        collection: &str,
        value: String,
        vector: Vec<f32>,
        metadata: Option<Metadata>,
    ) -> Result<()> {
        if value.is_empty() {
            return Err(Error::InvalidArgument("value must be non-empty".into()));
        }
        if let Some(bad) = vector.iter().find(|x| !x.is_finite()) {
            return Err(Error::InvalidArgument(format!(
                "vector contains a non-finite component: {bad}"
            )));
        }
        let arc = self.collection(collection)?;
        let mut guard = arc.write();
        guard.insert(value, vector, metadata)?;
        Ok(())
    }

    /// Inserts a batch of records under one write lock.
    ///
    /// Records are inserted in order until the first failure; rows inserted
    /// before the failing one stay committed, matching single-insert
    /// semantics applied sequentially. On success returns the inserted
    /// values in order.
    pub fn batch_insert(
        &self,
        collection: &str,
        records: Vec<(String, Vec<f32>, Option<Metadata>)>,
    ) -> Result<Vec<String>> {
        let arc = self.collection(collection)?;
        let mut guard = arc.write();
        let mut inserted = Vec::with_capacity(records.len());
        for (value, vector, metadata) in records {
            if value.is_empty() {
                return Err(Error::InvalidArgument("value must be non-empty".into()));
            }
            if let Some(bad) = vector.iter().find(|x| !x.is_finite()) {
                return Err(Error::InvalidArgument(format!(
                    "vector contains a non-finite component: {bad}"
                )));
            }
            guard.insert(value.clone(), vector, metadata)?;
            inserted.push(value);
        }
        Ok(inserted)
    }

    /// Fetches a record by value key.
    pub fn get_by_value(&self, collection: &str, value: &str) -> Result<Record> {
        let arc = self.collection(collection)?;
        let guard = arc.read();
        guard
            .get_by_value(value)
            .ok_or_else(|| Error::ValueNotFound(value.to_string()))
    }

    /// Fetches a record by vector (sign-signature match).
    pub fn get_by_vector(&self, collection: &str, vector: &[f32]) -> Result<Record> {
        let arc = self.collection(collection)?;
        let guard = arc.read();
        guard.get_by_vector(vector)
    }

    /// All live records of a collection.
    pub fn get_all(&self, collection: &str) -> Result<Vec<Record>> {
        let arc = self.collection(collection)?;
        let guard = arc.read();
        Ok(guard.get_all())
    }

    /// Deletes a record by value key. Deleting an already-deleted value
    /// reports [`Error::ValueNotFound`], not a no-op.
    pub fn delete(&self, collection: &str, value: &str) -> Result<()> {
        let arc = self.collection(collection)?;
        let mut guard = arc.write();
        guard.remove(value)
    }

    /// Top-k similarity search; see [`crate::search`] for the per-metric
    /// numeric and ordering.
    pub fn similarity_search(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
        filter: Option<&Metadata>,
    ) -> Result<Vec<(String, f32)>> {
        let arc = self.collection(collection)?;
        let guard = arc.read();
        search::similarity_search(&guard, query, k, filter)
    }

    /// Re-ranks a first-pass result list by MMR under the collection's
    /// metric. Candidates whose record is gone — or whose raw vector was
    /// discarded by a signature-only collection — are skipped.
    pub fn mmr_rerank(
        &self,
        collection: &str,
        initial: &[(String, f32)],
        alpha: f32,
        final_k: usize,
    ) -> Result<Vec<(String, f32)>> {
        let arc = self.collection(collection)?;
        let guard = arc.read();

        let mut vectors: HashMap<String, Vec<f32>> = HashMap::with_capacity(initial.len());
        for (value, _) in initial {
            if let Some(record) = guard.get_by_value(value) {
                if !record.vector.is_empty() {
                    vectors.insert(value.clone(), record.vector);
                }
            }
        }
        mmr::mmr_rerank(initial, &vectors, guard.metric(), alpha, final_k)
    }
}
