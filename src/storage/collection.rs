//! Columnar collection store.
//!
//! A collection owns its rows in flat arenas: one `Vec<f32>` for raw
//! vectors (stride `dim`), one `Vec<u64>` for sign signatures (stride
//! `ceil(dim / 64)`), and parallel columns for values and metadata. Two
//! maps index the rows — value → row and signature → row — and a free list
//! recycles slots released by deletion. Row ids are stable for the lifetime
//! of the slot.
//!
//! No reference escapes the owning lock: every read path copies a
//! [`Record`] out.

use crate::config::SIGNATURE_WORD_BITS;
use crate::distance::Distance;
use crate::error::{Error, Result};
use crate::hnsw::{HnswConfig, HnswIndex};
use crate::record::{Metadata, Record};
use crate::simd;
use std::collections::HashMap;

/// A named bucket of embeddings with a fixed dimension and metric.
pub struct Collection {
    dim: usize,
    metric: Distance,
    /// Whether raw vectors are stored. Only a binary-metric collection may
    /// run signature-only; every other metric needs the floats for scoring.
    keep_raw: bool,
    sig_words: usize,

    /// Raw vector arena, stride `dim`. Stays empty when `keep_raw` is off.
    vectors: Vec<f32>,
    /// Signature arena, stride `sig_words`.
    signatures: Vec<u64>,
    values: Vec<Option<String>>,
    metadata: Vec<Option<Metadata>>,

    by_value: HashMap<String, usize>,
    by_signature: HashMap<Vec<u64>, usize>,

    free: Vec<usize>,
    hnsw: Option<HnswIndex>,
}

impl Collection {
    /// Creates an empty collection.
    ///
    /// `keep_raw = false` is honored only for the binary metric; all other
    /// metrics retain raw vectors unconditionally since scoring needs them.
    pub fn new(dim: usize, metric: Distance, keep_raw: bool) -> Self {
        Self {
            dim,
            metric,
            keep_raw: keep_raw || metric != Distance::Binary,
            sig_words: dim.div_ceil(SIGNATURE_WORD_BITS),
            vectors: Vec::new(),
            signatures: Vec::new(),
            values: Vec::new(),
            metadata: Vec::new(),
            by_value: HashMap::new(),
            by_signature: HashMap::new(),
            free: Vec::new(),
            hnsw: (metric == Distance::Hnsw)
                .then(|| HnswIndex::new(dim, HnswConfig::default())),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn metric(&self) -> Distance {
        self.metric
    }

    pub fn keep_raw(&self) -> bool {
        self.keep_raw
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.by_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_value.is_empty()
    }

    /// Number of allocated row slots, freed ones included.
    #[inline]
    pub(crate) fn row_count(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub(crate) fn value_at(&self, row: usize) -> Option<&String> {
        self.values[row].as_ref()
    }

    /// Raw vector slice for a row; empty in signature-only collections.
    #[inline]
    pub(crate) fn vector_at(&self, row: usize) -> &[f32] {
        if self.keep_raw {
            &self.vectors[row * self.dim..(row + 1) * self.dim]
        } else {
            &[]
        }
    }

    #[inline]
    pub(crate) fn signature_at(&self, row: usize) -> &[u64] {
        &self.signatures[row * self.sig_words..(row + 1) * self.sig_words]
    }

    #[inline]
    pub(crate) fn metadata_at(&self, row: usize) -> Option<&Metadata> {
        self.metadata[row].as_ref()
    }

    #[inline]
    pub(crate) fn hnsw(&self) -> Option<&HnswIndex> {
        self.hnsw.as_ref()
    }

    #[inline]
    pub(crate) fn is_value_live(&self, value: &str) -> bool {
        self.by_value.contains_key(value)
    }

    /// Pop a recycled slot or append a fresh one.
    fn alloc_row(&mut self) -> usize {
        if let Some(row) = self.free.pop() {
            return row;
        }
        let row = self.values.len();
        self.values.push(None);
        self.metadata.push(None);
        self.signatures.resize((row + 1) * self.sig_words, 0);
        if self.keep_raw {
            self.vectors.resize((row + 1) * self.dim, 0.0);
        }
        row
    }

    fn row_to_record(&self, row: usize) -> Record {
        let value = self.values[row]
            .as_ref()
            .expect("record requested for a freed row")
            .clone();
        Record {
            value,
            vector: self.vector_at(row).to_vec(),
            metadata: self.metadata[row].clone(),
        }
    }

    /// Insert a record. Returns the row id it landed in.
    ///
    /// Cosine collections store the unit-normalized vector; the signature is
    /// computed after normalization (signs are unaffected). Two vectors with
    /// the same sign pattern are treated as duplicates.
    pub fn insert(
        &mut self,
        value: String,
        mut vector: Vec<f32>,
        metadata: Option<Metadata>,
    ) -> Result<usize> {
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        if self.metric == Distance::Cosine {
            vector = simd::normalize(&vector);
        }
        let signature = simd::compress(&vector);

        if self.by_value.contains_key(&value) {
            return Err(Error::DuplicateValue(value));
        }
        if self.by_signature.contains_key(&signature) {
            return Err(Error::DuplicateVector);
        }

        let row = self.alloc_row();
        if self.keep_raw {
            self.vectors[row * self.dim..(row + 1) * self.dim].copy_from_slice(&vector);
        }
        self.signatures[row * self.sig_words..(row + 1) * self.sig_words]
            .copy_from_slice(&signature);
        self.metadata[row] = metadata;
        self.values[row] = Some(value.clone());

        self.by_signature.insert(signature, row);
        self.by_value.insert(value.clone(), row);

        if let Some(index) = &mut self.hnsw {
            index.insert(&value, &vector);
        }
        Ok(row)
    }

    /// Look a record up by its value key.
    pub fn get_by_value(&self, value: &str) -> Option<Record> {
        let &row = self.by_value.get(value)?;
        Some(self.row_to_record(row))
    }

    /// Look a record up by vector, matching on the sign signature — the
    /// same approximate identity used for duplicate detection.
    pub fn get_by_vector(&self, vector: &[f32]) -> Result<Record> {
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        // Normalization preserves signs, so the probe signature matches the
        // stored one even for cosine collections.
        let probe = simd::compress(vector);
        match self.by_signature.get(&probe) {
            Some(&row) => Ok(self.row_to_record(row)),
            None => Err(Error::VectorNotFound),
        }
    }

    /// All live records in row order.
    pub fn get_all(&self) -> Vec<Record> {
        let mut out = Vec::with_capacity(self.len());
        for row in 0..self.row_count() {
            if self.values[row].is_some() {
                out.push(self.row_to_record(row));
            }
        }
        out
    }

    /// Delete a record and recycle its slot.
    ///
    /// The HNSW graph is not touched: the node becomes an orphan that
    /// search filters out by checking value liveness.
    pub fn remove(&mut self, value: &str) -> Result<()> {
        let row = *self
            .by_value
            .get(value)
            .ok_or_else(|| Error::ValueNotFound(value.to_string()))?;
        self.by_value.remove(value);
        let signature = self.signature_at(row).to_vec();
        self.by_signature.remove(&signature);
        self.values[row] = None;
        self.metadata[row] = None;
        self.free.push(row);
        Ok(())
    }
}
