//! HNSW graph storage and configuration.
//!
//! The graph uses a Struct-of-Arrays layout for cache-friendly access: all
//! vector floats live contiguously in one arena, with parallel arrays for
//! neighbor lists, layer assignments, and the record values the nodes stand
//! for. Nodes are append-only — deletion is handled by the owning collection
//! through a liveness predicate at search time, never by graph surgery.

use crate::config;
use crate::distance::Distance;
use crate::simd;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Tuning parameters for an HNSW index.
///
/// Controls the trade-off between build speed, search speed, and recall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Number of bidirectional links per node (except layer 0, which uses
    /// `m_max0`).
    pub m: usize,
    /// Maximum links per node at layer 0 (typically `2 * m`).
    pub m_max0: usize,
    /// Candidate list size during index construction.
    pub ef_construction: usize,
    /// Candidate list size during search; the effective beam is
    /// `max(k, ef_search)`.
    pub ef_search: usize,
    /// Maximum number of layers in the graph.
    pub max_layers: usize,
    /// Distance used inside the graph. Euclidean for collections created
    /// with the `hnsw` metric.
    pub metric: Distance,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: config::HNSW_DEFAULT_M,
            m_max0: config::HNSW_DEFAULT_M * 2,
            ef_construction: config::HNSW_DEFAULT_EF_CONSTRUCTION,
            ef_search: config::HNSW_DEFAULT_EF_SEARCH,
            max_layers: config::HNSW_DEFAULT_MAX_LAYERS,
            metric: Distance::Euclidean,
        }
    }
}

/// Raw graph distance for the given metric, lower is better.
///
/// Cosine assumes unit-normalized inputs (the collection normalizes at
/// insert). Binary-metric collections never build a graph; euclidean is the
/// fallback there.
#[inline]
pub(crate) fn raw_distance(metric: Distance, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        Distance::Euclidean | Distance::Hnsw | Distance::Binary => simd::l2_distance(a, b),
        Distance::Cosine => 1.0 - simd::dot_product(a, b),
        Distance::Dot => -simd::dot_product(a, b),
    }
}

/// Append-only HNSW index over raw f32 vectors.
///
/// Each node carries the record value it was inserted under; the collection
/// resolves values back to live rows after a search. Level assignment draws
/// from an index-owned RNG so a seeded index builds the same graph for the
/// same insertion sequence.
#[derive(Debug)]
pub struct HnswIndex {
    pub(crate) config: HnswConfig,
    dimension: usize,
    /// Vector arena, stride `dimension`.
    vectors: Vec<f32>,
    /// `neighbors[node][layer]` holds the node ids linked at that layer.
    pub(crate) neighbors: Vec<Vec<Vec<u32>>>,
    layers: Vec<u8>,
    /// Node id → record value the node was inserted under.
    values: Vec<String>,
    pub(crate) entry_point: Option<u32>,
    pub(crate) max_layer: usize,
    rng: SmallRng,
}

impl HnswIndex {
    /// Creates an empty index with an OS-entropy-seeded level generator.
    pub fn new(dimension: usize, config: HnswConfig) -> Self {
        Self::with_rng(dimension, config, SmallRng::from_os_rng())
    }

    /// Creates an empty index with a fixed seed, for reproducible builds.
    pub fn with_seed(dimension: usize, config: HnswConfig, seed: u64) -> Self {
        Self::with_rng(dimension, config, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(dimension: usize, config: HnswConfig, rng: SmallRng) -> Self {
        Self {
            config,
            dimension,
            vectors: Vec::new(),
            neighbors: Vec::new(),
            layers: Vec::new(),
            values: Vec::new(),
            entry_point: None,
            max_layer: 0,
            rng,
        }
    }

    /// Number of nodes in the graph, orphans included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    /// Draw a geometric level: `floor(-ln(U) / ln(M))`, capped at
    /// `max_layers - 1`.
    pub(crate) fn random_level(&mut self) -> usize {
        let ml = 1.0 / (self.config.m as f64).ln();
        let r: f64 = self.rng.random();
        let level = (-r.ln() * ml).floor() as usize;
        level.min(self.config.max_layers - 1)
    }

    /// The record value node `id` was inserted under.
    #[inline]
    pub(crate) fn value(&self, id: u32) -> &str {
        &self.values[id as usize]
    }

    /// O(1) slice into the contiguous vector arena.
    #[inline]
    pub(crate) fn vector(&self, id: u32) -> &[f32] {
        let start = id as usize * self.dimension;
        &self.vectors[start..start + self.dimension]
    }

    #[inline]
    pub(crate) fn layer_of(&self, id: u32) -> usize {
        self.layers[id as usize] as usize
    }

    /// Distance from a query to a stored node under the graph metric.
    #[inline]
    pub(crate) fn distance_to(&self, query: &[f32], id: u32) -> f32 {
        raw_distance(self.config.metric, query, self.vector(id))
    }

    /// Append a node's storage (vector, value, layer, empty neighbor lists)
    /// and return its id. Linking is the caller's job.
    pub(crate) fn push_node(&mut self, value: &str, vector: &[f32], level: usize) -> u32 {
        debug_assert_eq!(vector.len(), self.dimension, "graph vector dimension");
        let id = self.values.len() as u32;
        self.vectors.extend_from_slice(vector);
        self.values.push(value.to_string());
        self.layers.push(level as u8);
        self.neighbors.push(vec![Vec::new(); level + 1]);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_index() {
        let idx = HnswIndex::with_seed(8, HnswConfig::default(), 1);
        assert!(idx.is_empty());
        assert_eq!(idx.len(), 0);
        assert!(idx.entry_point.is_none());
    }

    #[test]
    fn test_push_node_arena_layout() {
        let mut idx = HnswIndex::with_seed(3, HnswConfig::default(), 1);
        let a = idx.push_node("a", &[1.0, 2.0, 3.0], 0);
        let b = idx.push_node("b", &[4.0, 5.0, 6.0], 2);
        assert_eq!(idx.vector(a), &[1.0, 2.0, 3.0]);
        assert_eq!(idx.vector(b), &[4.0, 5.0, 6.0]);
        assert_eq!(idx.value(b), "b");
        assert_eq!(idx.layer_of(b), 2);
        assert_eq!(idx.neighbors[b as usize].len(), 3);
    }

    #[test]
    fn test_random_level_capped() {
        let mut idx = HnswIndex::with_seed(4, HnswConfig::default(), 42);
        for _ in 0..1000 {
            assert!(idx.random_level() < idx.config.max_layers);
        }
    }

    #[test]
    fn test_random_level_mostly_zero() {
        // The geometric distribution puts roughly 15/16 of the mass on
        // level 0; a run of 1000 draws should stay heavily bottom-weighted.
        let mut idx = HnswIndex::with_seed(4, HnswConfig::default(), 7);
        let zeros = (0..1000).filter(|_| idx.random_level() == 0).count();
        assert!(zeros > 500, "expected most levels at 0, got {zeros}/1000");
    }

    #[test]
    fn test_seeded_levels_reproducible() {
        let mut a = HnswIndex::with_seed(4, HnswConfig::default(), 9);
        let mut b = HnswIndex::with_seed(4, HnswConfig::default(), 9);
        let la: Vec<usize> = (0..100).map(|_| a.random_level()).collect();
        let lb: Vec<usize> = (0..100).map(|_| b.random_level()).collect();
        assert_eq!(la, lb);
    }

    #[test]
    fn test_raw_distance_per_metric() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert!((raw_distance(Distance::Euclidean, &a, &b) - 2f32.sqrt()).abs() < 1e-6);
        assert!((raw_distance(Distance::Cosine, &a, &b) - 1.0).abs() < 1e-6);
        assert!((raw_distance(Distance::Dot, &a, &a) - -1.0).abs() < 1e-6);
    }
}
