//! Hierarchical Navigable Small World (HNSW) approximate nearest neighbor
//! index.
//!
//! Collections created with the `hnsw` metric build this graph lazily
//! alongside inserts and query it instead of scanning. The index is
//! insert-only: record deletion leaves orphan nodes behind, and search
//! filters them out through a liveness predicate supplied by the owning
//! collection.

/// Graph storage, configuration, and level assignment.
pub mod graph;
/// Insertion with heuristic neighbor selection and bidirectional linking.
pub mod insert;
/// Single-layer beam search and multi-layer KNN.
pub mod search;
/// Generation-stamped visited set for graph traversal.
pub mod visited;

pub use graph::{HnswConfig, HnswIndex};
