//! Similarity search over a collection.
//!
//! Dispatches to the HNSW graph when the collection carries one, otherwise
//! runs a SIMD brute-force scan with optional verbatim metadata filtering.
//! The reported numeric keeps each metric's native units: raw distance
//! (ascending) for euclidean and binary, similarity (descending) for
//! cosine, dot, and hnsw. The normalized [`score`](crate::distance::score)
//! scale is only used internally by the MMR re-ranker.

mod filter;
mod topk;

use crate::config::{PARALLEL_SCAN_THRESHOLD, TOPK_HEAP_THRESHOLD};
use crate::distance::{clamp_unit, Distance};
use crate::error::{Error, Result};
use crate::record::Metadata;
use crate::simd;
use crate::storage::Collection;
use filter::matches_filter;
use rayon::prelude::*;
use topk::{Order, TopK};

/// Top-k most similar records to `query`.
///
/// See the module docs for the per-metric numeric and ordering. Filtered
/// search is brute-force only; combining a filter with an hnsw collection
/// is an error rather than a silent degradation.
pub(crate) fn similarity_search(
    collection: &Collection,
    query: &[f32],
    k: usize,
    filter: Option<&Metadata>,
) -> Result<Vec<(String, f32)>> {
    if k == 0 {
        return Err(Error::InvalidArgument("k must be at least 1".into()));
    }
    if query.len() != collection.dim() {
        return Err(Error::DimensionMismatch {
            expected: collection.dim(),
            actual: query.len(),
        });
    }

    if let Some(index) = collection.hnsw() {
        if filter.is_some() {
            return Err(Error::InvalidArgument(
                "metadata filters are not supported for hnsw collections".into(),
            ));
        }
        let hits = index.search(query, k, |value| collection.is_value_live(value));
        return Ok(hits
            .into_iter()
            .map(|(value, dist)| (value, clamp_unit(1.0 / (1.0 + dist))))
            .collect());
    }

    brute_force(collection, query, k, filter)
}

fn brute_force(
    collection: &Collection,
    query: &[f32],
    k: usize,
    filter: Option<&Metadata>,
) -> Result<Vec<(String, f32)>> {
    let metric = collection.metric();
    let order = match metric {
        Distance::Euclidean | Distance::Binary => Order::Ascending,
        Distance::Cosine | Distance::Dot => Order::Descending,
        Distance::Hnsw => unreachable!("hnsw collections never reach the brute-force path"),
    };

    // Per-query preprocessing happens once, not per row.
    let query_normed = (metric == Distance::Cosine).then(|| simd::normalize(query));
    let query_bits = (metric == Distance::Binary).then(|| simd::compress(query));

    let numeric = |row: usize| -> Option<f32> {
        collection.value_at(row)?;
        if let Some(f) = filter {
            if !matches_filter(collection.metadata_at(row), f) {
                return None;
            }
        }
        Some(match metric {
            Distance::Euclidean => simd::l2_distance(query, collection.vector_at(row)),
            Distance::Cosine => {
                let dp = simd::dot_product(
                    query_normed.as_deref().expect("normalized query"),
                    collection.vector_at(row),
                );
                clamp_unit((dp + 1.0) / 2.0)
            }
            Distance::Dot => simd::dot_product(query, collection.vector_at(row)),
            Distance::Binary => simd::hamming(
                query_bits.as_deref().expect("compressed query"),
                collection.signature_at(row),
            ) as f32,
            Distance::Hnsw => unreachable!(),
        })
    };

    let rows = collection.row_count();
    let live = collection.len();

    let ranked: Vec<(usize, f32)> = if live > PARALLEL_SCAN_THRESHOLD {
        (0..rows)
            .into_par_iter()
            .fold(
                || TopK::new(k, order),
                |mut acc, row| {
                    if let Some(n) = numeric(row) {
                        acc.push(row, n);
                    }
                    acc
                },
            )
            .reduce(|| TopK::new(k, order), TopK::merge)
            .into_sorted()
    } else if live > TOPK_HEAP_THRESHOLD {
        let mut acc = TopK::new(k, order);
        for row in 0..rows {
            if let Some(n) = numeric(row) {
                acc.push(row, n);
            }
        }
        acc.into_sorted()
    } else {
        let mut scored: Vec<(usize, f32)> = (0..rows).filter_map(|r| Some((r, numeric(r)?))).collect();
        scored.sort_by(|a, b| {
            let ord = a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal);
            match order {
                Order::Ascending => ord,
                Order::Descending => ord.reverse(),
            }
        });
        scored.truncate(k);
        scored
    };

    Ok(ranked
        .into_iter()
        .map(|(row, numeric)| {
            let value = collection
                .value_at(row)
                .expect("ranked row is live")
                .clone();
            (value, numeric)
        })
        .collect())
}
