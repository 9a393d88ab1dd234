//! Global configuration constants for vicinity.
//!
//! All tuning parameters and input validation limits are defined here.
//! These are compile-time defaults; per-index HNSW parameters can be
//! overridden through [`HnswConfig`](crate::hnsw::HnswConfig).

/// Default number of bidirectional links per HNSW node.
///
/// Higher values improve recall but increase memory and build time.
/// Typical range: 8–64. Default: 16.
pub const HNSW_DEFAULT_M: usize = 16;

/// Default ef parameter during HNSW index construction.
///
/// Controls the size of the dynamic candidate list during insertion.
/// Higher values produce a better graph but slow down build time.
pub const HNSW_DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Default ef parameter during HNSW search.
///
/// The effective beam width at query time is `max(k, ef_search)`.
/// Higher values improve recall at the cost of latency.
pub const HNSW_DEFAULT_EF_SEARCH: usize = 50;

/// Maximum number of layers in the HNSW graph.
pub const HNSW_DEFAULT_MAX_LAYERS: usize = 16;

/// Live-row count above which the brute-force scan keeps its top-k in a
/// bounded heap instead of sorting the full score list.
pub const TOPK_HEAP_THRESHOLD: usize = 1024;

/// Live-row count above which the brute-force scan is partitioned across
/// the rayon thread pool, each worker reducing a partial top-k heap.
pub const PARALLEL_SCAN_THRESHOLD: usize = 10_000;

/// Maximum allowed embedding dimension for a collection.
pub const MAX_DIMENSION: usize = 4096;

/// Number of signature bits packed into one storage word.
pub const SIGNATURE_WORD_BITS: usize = 64;
