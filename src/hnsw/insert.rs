//! HNSW insertion: greedy descent, per-layer beam search, heuristic
//! neighbor selection, and bidirectional linking with re-pruning.

use crate::hnsw::graph::{raw_distance, HnswIndex};
use crate::hnsw::search::search_layer;
use crate::hnsw::visited::VisitedSet;
use std::cell::RefCell;

thread_local! {
    /// Reusable visited set for insert traversals; avoids a per-insert
    /// allocation proportional to the node count.
    static INSERT_VISITED: RefCell<VisitedSet> = RefCell::new(VisitedSet::default());
}

impl HnswIndex {
    /// Insert a vector under a record value.
    ///
    /// The caller (the collection) has already validated the dimension and
    /// uniqueness of the value among live rows. Inserting the same value
    /// again after a deletion is allowed; the old node becomes an orphan
    /// that search shadows by value.
    pub fn insert(&mut self, value: &str, vector: &[f32]) {
        let level = self.random_level();

        // First node: nothing to link against.
        if self.entry_point.is_none() {
            let id = self.push_node(value, vector, level);
            self.entry_point = Some(id);
            self.max_layer = level;
            return;
        }
        let entry_point = self.entry_point.expect("entry point set for non-empty graph");
        let top = level.min(self.max_layer);

        let node_neighbors = INSERT_VISITED.with(|cell| {
            let mut visited = cell.borrow_mut();
            visited.grow_to(self.len());
            let everything = |_: u32| true;

            // Phase 1: greedy single-best descent to the node's level + 1.
            let mut current = entry_point;
            for layer in (level + 1..=self.max_layer).rev() {
                let best = search_layer(
                    self,
                    vector,
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

            // Phase 2: beam search each layer, select diverse neighbors.
            let mut node_neighbors: Vec<Vec<u32>> = vec![Vec::new(); level + 1];
            let mut layer_eps = vec![current];
            for layer in (0..=top).rev() {
                let candidates = search_layer(
                    self,
                    vector,
                    &layer_eps,
                    self.config.ef_construction,
                    layer,
                    &mut visited,
                    &everything,
                );
                let m_max = if layer == 0 {
                    self.config.m_max0
                } else {
                    self.config.m
                };
                let selected = select_neighbors_heuristic(self, &candidates, m_max);
                node_neighbors[layer] = selected.into_iter().map(|(_, id)| id).collect();

                layer_eps.clear();
                layer_eps.extend(candidates.iter().map(|&(_, id)| id));
                if layer_eps.is_empty() {
                    layer_eps.push(entry_point);
                }
            }
            node_neighbors
        });

        let id = self.push_node(value, vector, level);
        self.neighbors[id as usize] = node_neighbors;

        // Phase 3: link back and re-prune neighbors that grew past their cap.
        let metric = self.config.metric;
        for layer in 0..=top {
            let m_max = if layer == 0 {
                self.config.m_max0
            } else {
                self.config.m
            };
            let links = self.neighbors[id as usize][layer].clone();
            for neighbor in links {
                let nid = neighbor as usize;
                while self.neighbors[nid].len() <= layer {
                    self.neighbors[nid].push(Vec::new());
                }
                self.neighbors[nid][layer].push(id);

                if self.neighbors[nid][layer].len() > m_max {
                    let candidates: Vec<(f32, u32)> = self.neighbors[nid][layer]
                        .iter()
                        .map(|&cid| {
                            (
                                raw_distance(metric, self.vector(neighbor), self.vector(cid)),
                                cid,
                            )
                        })
                        .collect();
                    let pruned = select_neighbors_heuristic(self, &candidates, m_max);
                    self.neighbors[nid][layer] = pruned.into_iter().map(|(_, cid)| cid).collect();
                }
            }
        }

        if level > self.max_layer {
            self.max_layer = level;
            self.entry_point = Some(id);
        }
    }
}

/// Heuristic neighbor selection (Algorithm 4 of the HNSW paper).
///
/// A candidate is kept only if it is closer to the base point than to every
/// already-selected neighbor; this spreads links across directions instead
/// of clustering them. Remaining slots are filled with the closest unused
/// candidates so sparse neighborhoods still get their full degree.
fn select_neighbors_heuristic(
    index: &HnswIndex,
    candidates: &[(f32, u32)],
    m: usize,
) -> Vec<(f32, u32)> {
    let mut sorted = candidates.to_vec();
    sorted.sort_unstable_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let metric = index.config.metric;
    let mut selected: Vec<(f32, u32)> = Vec::with_capacity(m);
    for &(dist_to_base, cid) in &sorted {
        if selected.len() >= m {
            break;
        }
        let diverse = selected.iter().all(|&(_, sid)| {
            dist_to_base <= raw_distance(metric, index.vector(cid), index.vector(sid))
        });
        if diverse {
            selected.push((dist_to_base, cid));
        }
    }

    if selected.len() < m {
        for &(dist, cid) in &sorted {
            if selected.len() >= m {
                break;
            }
            if !selected.iter().any(|&(_, sid)| sid == cid) {
                selected.push((dist, cid));
            }
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hnsw::graph::HnswConfig;

    fn grid_index(n: usize, seed: u64) -> HnswIndex {
        let mut idx = HnswIndex::with_seed(2, HnswConfig::default(), seed);
        for i in 0..n {
            let x = (i % 10) as f32;
            let y = (i / 10) as f32;
            idx.insert(&format!("p{i}"), &[x, y]);
        }
        idx
    }

    #[test]
    fn test_first_insert_becomes_entry_point() {
        let mut idx = HnswIndex::with_seed(2, HnswConfig::default(), 1);
        idx.insert("a", &[1.0, 2.0]);
        assert_eq!(idx.entry_point, Some(0));
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn test_layer_caps_respected() {
        let idx = grid_index(200, 21);
        for (node, layers) in idx.neighbors.iter().enumerate() {
            for (layer, links) in layers.iter().enumerate() {
                let cap = if layer == 0 {
                    idx.config.m_max0
                } else {
                    idx.config.m
                };
                assert!(
                    links.len() <= cap,
                    "node {node} layer {layer} has {} links (cap {cap})",
                    links.len()
                );
            }
        }
    }

    #[test]
    fn test_links_are_bidirectional_enough_for_navigation() {
        // Every node must be reachable from the entry point at layer 0,
        // otherwise deletion-free search could strand records.
        let idx = grid_index(100, 33);
        let mut seen = vec![false; idx.len()];
        let mut stack = vec![idx.entry_point.unwrap()];
        seen[stack[0] as usize] = true;
        while let Some(node) = stack.pop() {
            for &nb in &idx.neighbors[node as usize][0] {
                if !seen[nb as usize] {
                    seen[nb as usize] = true;
                    stack.push(nb);
                }
            }
        }
        let reached = seen.iter().filter(|&&s| s).count();
        assert_eq!(reached, idx.len(), "layer-0 graph is disconnected");
    }

    #[test]
    fn test_entry_point_promotion() {
        let mut idx = HnswIndex::with_seed(2, HnswConfig::default(), 4);
        let mut promoted = false;
        for i in 0..500 {
            idx.insert(&format!("p{i}"), &[i as f32, 0.0]);
            if let Some(ep) = idx.entry_point {
                if idx.layer_of(ep) > 0 {
                    promoted = true;
                }
            }
        }
        // With 500 geometric draws a level ≥ 1 node is all but certain.
        assert!(promoted, "entry point never promoted above layer 0");
        let ep = idx.entry_point.unwrap();
        assert_eq!(idx.layer_of(ep), idx.max_layer);
    }

    #[test]
    fn test_heuristic_prefers_spread_neighbors() {
        let mut idx = HnswIndex::with_seed(2, HnswConfig::default(), 9);
        // Base at origin, a tight cluster to the right, one point above.
        idx.insert("right1", &[1.0, 0.0]);
        idx.insert("right2", &[1.05, 0.0]);
        idx.insert("right3", &[1.1, 0.0]);
        idx.insert("up", &[0.0, 1.2]);
        let candidates: Vec<(f32, u32)> = (0..4u32)
            .map(|id| {
                (
                    raw_distance(idx.config.metric, &[0.0, 0.0], idx.vector(id)),
                    id,
                )
            })
            .collect();
        let selected = select_neighbors_heuristic(&idx, &candidates, 2);
        let ids: Vec<u32> = selected.iter().map(|&(_, id)| id).collect();
        // Nearest cluster member first, then the point in a fresh direction
        // beats the redundant cluster members.
        assert_eq!(ids[0], 0);
        assert!(ids.contains(&3), "diverse neighbor not selected: {ids:?}");
    }
}
