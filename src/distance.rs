//! Distance metrics and score normalization.
//!
//! [`Distance`] is the typed form of the metric tag: text spellings are
//! parsed once at the database boundary and all inner code matches on the
//! enum. [`score`] maps every metric onto a single "larger is better" scale
//! used by the MMR re-ranker; the raw per-metric numerics that
//! `similarity_search` reports to callers live in [`crate::search`].

use crate::error::{Error, Result};
use crate::simd;
use serde::{Deserialize, Serialize};

/// Distance metric of a collection.
///
/// `Hnsw` is a search accelerator rather than a distinct geometry: the graph
/// is built and queried under euclidean distance, and scores are normalized
/// the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    /// Euclidean (L2) distance. Smaller is more similar.
    Euclidean,
    /// Cosine similarity over unit-normalized vectors.
    Cosine,
    /// Raw inner product.
    Dot,
    /// Euclidean distance served through an HNSW graph index.
    Hnsw,
    /// Hamming distance over sign signatures.
    Binary,
}

impl Distance {
    /// Parses a metric identifier. Accepted spellings are case-insensitive:
    /// `euclidean`/`l2`, `cosine`, `dot`/`dotproduct`, `hnsw`,
    /// `binary`/`hamming`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Ok(Distance::Euclidean),
            "cosine" => Ok(Distance::Cosine),
            "dot" | "dotproduct" => Ok(Distance::Dot),
            "hnsw" => Ok(Distance::Hnsw),
            "binary" | "hamming" => Ok(Distance::Binary),
            _ => Err(Error::InvalidMetric(s.to_string())),
        }
    }

    /// Canonical lowercase name of the metric.
    pub fn as_str(&self) -> &'static str {
        match self {
            Distance::Euclidean => "euclidean",
            Distance::Cosine => "cosine",
            Distance::Dot => "dot",
            Distance::Hnsw => "hnsw",
            Distance::Binary => "binary",
        }
    }
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[inline]
pub(crate) fn clamp_unit(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Normalized similarity score, larger is better.
///
/// Euclidean (and hnsw), cosine, and binary scores land in `[0, 1]`; dot is
/// reported raw and unclamped. `bits` must carry the stored record's sign
/// signature for the binary metric (the stored vector may be empty there);
/// other metrics ignore it.
///
/// | metric    | formula                                  |
/// |-----------|------------------------------------------|
/// | euclidean | `1 / (1 + l2(q, v))`                     |
/// | cosine    | `(dot(q̂, v) + 1) / 2` (v pre-normalized) |
/// | dot       | `dot(q, v)`                              |
/// | hnsw      | euclidean score                          |
/// | binary    | `1 - hamming(compress(q), bits) / dim`   |
pub fn score(query: &[f32], vector: &[f32], bits: Option<&[u64]>, metric: Distance) -> f32 {
    match metric {
        Distance::Euclidean | Distance::Hnsw => {
            clamp_unit(1.0 / (1.0 + simd::l2_distance(query, vector)))
        }
        Distance::Cosine => {
            clamp_unit((simd::dot_product(&simd::normalize(query), vector) + 1.0) / 2.0)
        }
        Distance::Dot => simd::dot_product(query, vector),
        Distance::Binary => {
            let qbits = simd::compress(query);
            let stored = bits.expect("binary score requires a stored signature");
            let frac = simd::hamming(&qbits, stored) as f32 / query.len() as f32;
            1.0 - clamp_unit(frac)
        }
    }
}

#[inline]
fn check_len(left: usize, right: usize) -> Result<()> {
    if left == right {
        Ok(())
    } else {
        Err(Error::LengthMismatch { left, right })
    }
}

/// Normalized euclidean score `1 / (1 + l2(a, b))` for two equal-length
/// vectors.
pub fn euclidean(a: &[f32], b: &[f32]) -> Result<f32> {
    check_len(a.len(), b.len())?;
    Ok(clamp_unit(1.0 / (1.0 + simd::l2_distance(a, b))))
}

/// Cosine similarity of two equal-length vectors, mapped to `[0, 1]`.
/// Both inputs are normalized internally.
pub fn cosine(a: &[f32], b: &[f32]) -> Result<f32> {
    check_len(a.len(), b.len())?;
    let sim = (simd::dot_product(&simd::normalize(a), &simd::normalize(b)) + 1.0) / 2.0;
    Ok(clamp_unit(sim))
}

/// Raw inner product of two equal-length vectors.
pub fn dot(a: &[f32], b: &[f32]) -> Result<f32> {
    check_len(a.len(), b.len())?;
    Ok(simd::dot_product(a, b))
}

/// Hamming distance between two equal-length bit arrays (as produced by
/// [`compress`](crate::simd::compress)).
pub fn hamming(a: &[u64], b: &[u64]) -> Result<u32> {
    check_len(a.len(), b.len())?;
    Ok(simd::hamming(a, b))
}
