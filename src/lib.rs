//! # vicinity
//!
//! Embeddable in-memory vector database. Fixed-dimension embeddings are
//! grouped into named collections and served nearest-neighbor queries under
//! one of five metrics: euclidean, cosine, dot product, hamming over sign
//! signatures (`binary`), or euclidean through an HNSW graph (`hnsw`).
//!
//! The crate is engine-only: no persistence, no server, no bindings. State
//! lives in process heap behind a thread-safe [`Database`] handle.
//!
//! ## Example
//!
//! ```
//! use vicinity::Database;
//!
//! # fn main() -> vicinity::Result<()> {
//! let db = Database::new();
//! db.create_collection("docs", 3, "cosine", true)?;
//! db.insert("docs", "first".into(), vec![1.0, 0.0, 0.0], None)?;
//! db.insert("docs", "second".into(), vec![0.0, 1.0, 0.0], None)?;
//!
//! let hits = db.similarity_search("docs", &[1.0, 0.0, 0.0], 2, None)?;
//! assert_eq!(hits[0].0, "first");
//! # Ok(())
//! # }
//! ```

/// Compile-time tuning constants and input limits.
pub mod config;
/// Distance metrics, metric parsing, and score normalization.
pub mod distance;
/// Error enum and result alias.
pub mod error;
/// HNSW approximate nearest neighbor index.
pub mod hnsw;
/// Maximal Marginal Relevance re-ranking.
pub mod mmr;
/// Record and metadata types.
pub mod record;
/// Similarity search dispatch: HNSW or SIMD brute force.
pub mod search;

/// SIMD kernels: L2, dot product, normalization, sign compression, hamming.
pub mod simd;

/// Storage layer: collections and the database container.
pub mod storage;

pub use distance::{cosine, dot, euclidean, hamming, score, Distance};
pub use error::{Error, Result};
pub use hnsw::{HnswConfig, HnswIndex};
pub use mmr::mmr_rerank;
pub use record::{Metadata, Record};
pub use simd::compress;
pub use storage::{Collection, Database};
