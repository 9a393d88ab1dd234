//! Maximal Marginal Relevance re-ranking.
//!
//! Greedy diversification of a ranked candidate list: each step picks the
//! candidate maximizing `alpha * relevance - (1 - alpha) * redundancy`,
//! where redundancy is the highest similarity to anything already picked.
//! The algorithm is database-free — callers supply the vectors — so it
//! works both on collection search results and on externally produced
//! candidate lists.

use crate::distance::{score, Distance};
use crate::error::{Error, Result};
use crate::simd;
use std::collections::HashMap;

/// Re-rank `initial` by greedy MMR and return up to `final_k`
/// `(value, mmr score)` pairs.
///
/// * `initial` — `(value, relevance)` pairs from a first-pass search, best
///   first. Relevance is used as-is; pre-normalize upstream if mixing
///   scales.
/// * `vectors` — value → embedding for the candidates. Candidates without a
///   vector (or with an empty one) are skipped.
/// * `metric` — similarity used for the redundancy term, via the normalized
///   [`score`] scale.
/// * `alpha` — `1.0` is pure relevance order, `0.0` pure diversity.
///
/// When `final_k` covers the whole candidate set the full set comes back,
/// reordered by MMR. Ties pick the earliest candidate.
pub fn mmr_rerank(
    initial: &[(String, f32)],
    vectors: &HashMap<String, Vec<f32>>,
    metric: Distance,
    alpha: f32,
    final_k: usize,
) -> Result<Vec<(String, f32)>> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(Error::InvalidArgument(format!(
            "alpha must be within [0, 1], got {alpha}"
        )));
    }
    if final_k == 0 {
        return Err(Error::InvalidArgument("final_k must be at least 1".into()));
    }

    // Working set: candidates whose vector resolves.
    let mut working: Vec<(&str, f32, &[f32])> = initial
        .iter()
        .filter_map(|(value, relevance)| {
            let vector = vectors.get(value)?;
            if vector.is_empty() {
                return None;
            }
            Some((value.as_str(), *relevance, vector.as_slice()))
        })
        .collect();

    let mut selected: Vec<(String, f32)> = Vec::with_capacity(final_k.min(working.len()));
    let mut selected_vectors: Vec<&[f32]> = Vec::with_capacity(final_k.min(working.len()));

    while selected.len() < final_k && !working.is_empty() {
        let mut best_idx = 0;
        let mut best_mmr = f32::MIN;
        for (idx, &(_, relevance, vector)) in working.iter().enumerate() {
            let redundancy = selected_vectors
                .iter()
                .map(|picked| pair_similarity(vector, picked, metric))
                .fold(0.0f32, f32::max);
            let mmr = alpha * relevance - (1.0 - alpha) * redundancy;
            if mmr > best_mmr {
                best_mmr = mmr;
                best_idx = idx;
            }
        }
        let (value, _, vector) = working.remove(best_idx);
        selected.push((value.to_string(), best_mmr));
        selected_vectors.push(vector);
    }
    Ok(selected)
}

/// Similarity of two raw vectors on the normalized score scale. The binary
/// metric scores against the sign signature of the second vector.
fn pair_similarity(a: &[f32], b: &[f32], metric: Distance) -> f32 {
    match metric {
        Distance::Binary => {
            let bits = simd::compress(b);
            score(a, b, Some(&bits), metric)
        }
        _ => score(a, b, None, metric),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors(entries: &[(&str, &[f32])]) -> HashMap<String, Vec<f32>> {
        entries
            .iter()
            .map(|(v, x)| (v.to_string(), x.to_vec()))
            .collect()
    }

    #[test]
    fn test_alpha_one_is_pure_relevance_order() {
        let initial = vec![
            ("a".to_string(), 0.9),
            ("b".to_string(), 0.8),
            ("c".to_string(), 0.7),
        ];
        let vecs = vectors(&[
            ("a", &[1.0, 0.0]),
            ("b", &[0.0, 1.0]),
            ("c", &[1.0, 1.0]),
        ]);
        let out = mmr_rerank(&initial, &vecs, Distance::Dot, 1.0, 2).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].0, "a");
        assert_eq!(out[1].0, "b");
        assert!((out[0].1 - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_zero_diversifies() {
        // First pick is the top candidate (redundancy 0 everywhere); the
        // second pick must avoid the near-duplicate of the first.
        let initial = vec![
            ("a".to_string(), 0.9),
            ("a_twin".to_string(), 0.89),
            ("far".to_string(), 0.1),
        ];
        let vecs = vectors(&[
            ("a", &[1.0, 0.0]),
            ("a_twin", &[0.999, 0.01]),
            ("far", &[-1.0, 0.0]),
        ]);
        let out = mmr_rerank(&initial, &vecs, Distance::Cosine, 0.0, 2).unwrap();
        assert_eq!(out[0].0, "a");
        assert_eq!(out[1].0, "far");
    }

    #[test]
    fn test_unresolvable_candidates_skipped() {
        let initial = vec![
            ("known".to_string(), 0.5),
            ("missing".to_string(), 0.9),
            ("empty".to_string(), 0.8),
        ];
        let mut vecs = vectors(&[("known", &[1.0, 0.0])]);
        vecs.insert("empty".to_string(), Vec::new());
        let out = mmr_rerank(&initial, &vecs, Distance::Cosine, 1.0, 10).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, "known");
    }

    #[test]
    fn test_no_duplicates_and_bounded_size() {
        let initial: Vec<(String, f32)> = (0..5)
            .map(|i| (format!("c{i}"), 1.0 - i as f32 * 0.1))
            .collect();
        let entries: Vec<(String, Vec<f32>)> = (0..5)
            .map(|i| (format!("c{i}"), vec![i as f32, 1.0]))
            .collect();
        let vecs: HashMap<String, Vec<f32>> = entries.into_iter().collect();
        let out = mmr_rerank(&initial, &vecs, Distance::Euclidean, 0.5, 3).unwrap();
        assert_eq!(out.len(), 3);
        let mut names: Vec<&str> = out.iter().map(|(v, _)| v.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 3, "duplicate values in MMR output");
    }

    #[test]
    fn test_final_k_larger_than_candidates_returns_all() {
        let initial = vec![("a".to_string(), 0.9), ("b".to_string(), 0.2)];
        let vecs = vectors(&[("a", &[1.0, 0.0]), ("b", &[0.0, 1.0])]);
        let out = mmr_rerank(&initial, &vecs, Distance::Cosine, 0.7, 50).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_binary_metric_redundancy() {
        let initial = vec![
            ("first".to_string(), 0.9),
            ("same_signs".to_string(), 0.85),
            ("opposite".to_string(), 0.2),
        ];
        let vecs = vectors(&[
            ("first", &[1.0, 1.0, 1.0, 1.0]),
            ("same_signs", &[2.0, 3.0, 4.0, 5.0]),
            ("opposite", &[-1.0, -1.0, -1.0, -1.0]),
        ]);
        let out = mmr_rerank(&initial, &vecs, Distance::Binary, 0.0, 2).unwrap();
        assert_eq!(out[0].0, "first");
        assert_eq!(out[1].0, "opposite", "sign-identical twin is redundant");
    }

    #[test]
    fn test_invalid_parameters() {
        let initial = vec![("a".to_string(), 0.9)];
        let vecs = vectors(&[("a", &[1.0])]);
        assert!(matches!(
            mmr_rerank(&initial, &vecs, Distance::Cosine, 1.5, 2),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            mmr_rerank(&initial, &vecs, Distance::Cosine, -0.1, 2),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            mmr_rerank(&initial, &vecs, Distance::Cosine, 0.5, 0),
            Err(Error::InvalidArgument(_))
        ));
    }
}
