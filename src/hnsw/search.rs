//! HNSW search: single-layer beam search and multi-layer KNN.
//!
//! Search takes a liveness predicate from the owning collection. Orphan
//! nodes (left behind by record deletion) still participate in navigation —
//! removing them would tear holes in the graph — but are excluded from
//! results.

use crate::hnsw::graph::HnswIndex;
use crate::hnsw::visited::VisitedSet;
use ordered_float::OrderedFloat;
use std::collections::BinaryHeap;
use std::collections::HashSet;

/// Expansion frontier entry: max-heap on negated distance = closest first.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    neg_distance: OrderedFloat<f32>,
    id: u32,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.neg_distance.cmp(&other.neg_distance)
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Result entry: max-heap on distance so the worst hit is cheap to evict.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResultEntry {
    distance: OrderedFloat<f32>,
    id: u32,
}

impl Ord for ResultEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance.cmp(&other.distance)
    }
}

impl PartialOrd for ResultEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Beam search within a single layer.
///
/// Returns up to `ef` nodes passing `keep`, ascending by distance. Nodes
/// failing `keep` still expand the frontier. `visited` is reset here and
/// must already cover the index's node ids.
pub(crate) fn search_layer<F: Fn(u32) -> bool>(
    index: &HnswIndex,
    query: &[f32],
    entry_points: &[u32],
    ef: usize,
    layer: usize,
    visited: &mut VisitedSet,
    keep: &F,
) -> Vec<(f32, u32)> {
    visited.reset();
    let mut frontier: BinaryHeap<Candidate> = BinaryHeap::with_capacity(ef * 2);
    let mut results: BinaryHeap<ResultEntry> = BinaryHeap::with_capacity(ef + 1);
    let mut worst = f32::MAX;

    for &ep in entry_points {
        if !visited.mark(ep) {
            continue;
        }
        let dist = index.distance_to(query, ep);
        frontier.push(Candidate {
            neg_distance: OrderedFloat(-dist),
            id: ep,
        });
        if keep(ep) {
            results.push(ResultEntry {
                distance: OrderedFloat(dist),
                id: ep,
            });
            if results.len() >= ef {
                worst = results.peek().map_or(f32::MAX, |r| r.distance.0);
            }
        }
    }

    while let Some(candidate) = frontier.pop() {
        let c_dist = -candidate.neg_distance.0;
        if results.len() >= ef && c_dist > worst {
            break;
        }

        let node = candidate.id as usize;
        if layer >= index.neighbors[node].len() {
            continue;
        }
        for &neighbor in &index.neighbors[node][layer] {
            if !visited.mark(neighbor) {
                continue;
            }
            let dist = index.distance_to(query, neighbor);
            if results.len() < ef || dist < worst {
                frontier.push(Candidate {
                    neg_distance: OrderedFloat(-dist),
                    id: neighbor,
                });
                if keep(neighbor) {
                    results.push(ResultEntry {
                        distance: OrderedFloat(dist),
                        id: neighbor,
                    });
                    if results.len() > ef {
                        results.pop();
                    }
                    worst = results.peek().map_or(f32::MAX, |r| r.distance.0);
                }
            }
        }
    }

    results
        .into_sorted_vec()
        .into_iter()
        .map(|r| (r.distance.0, r.id))
        .collect()
}

impl HnswIndex {
    /// K-nearest search under the graph metric.
    ///
    /// Greedy single-best descent through the upper layers, then a beam of
    /// `max(k, ef_search)` at layer 0. `is_live` filters deleted records out
    /// of the results; when a value was deleted and re-inserted the stale
    /// node is shadowed by value deduplication (closest occurrence wins).
    /// Returns `(value, raw distance)` ascending.
    pub fn search<F: Fn(&str) -> bool>(
        &self,
        query: &[f32],
        k: usize,
        is_live: F,
    ) -> Vec<(String, f32)> {
        let Some(entry_point) = self.entry_point else {
            return Vec::new();
        };

        let mut visited = VisitedSet::with_capacity(self.len());
        let mut current = entry_point;
        let everything = |_: u32| true;
        for layer in (1..=self.max_layer).rev() {
            let best = search_layer(
                self,
                query,
                std::slice::from_ref(&current),
                1,
                layer,
                &mut visited,
                &everything,
            );
            if let Some(&(_, nearest)) = best.first() {
                current = nearest;
            }
        }

        let ef = self.config.ef_search.max(k);
        let live_node = |id: u32| is_live(self.value(id));
        let hits = search_layer(
            self,
            query,
            std::slice::from_ref(&current),
            ef,
            0,
            &mut visited,
            &live_node,
        );

        let mut seen: HashSet<&str> = HashSet::with_capacity(k);
        let mut out = Vec::with_capacity(k);
        for (dist, id) in hits {
            let value = self.value(id);
            if seen.insert(value) {
                out.push((value.to_string(), dist));
                if out.len() == k {
                    break;
                }
            }
        }
        out
    }
}
