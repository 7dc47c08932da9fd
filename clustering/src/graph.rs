//! The similarity graph and its connected-component extraction.

use std::collections::{HashMap, HashSet, VecDeque};

use ordered_float::OrderedFloat;
use uuid::Uuid;

/// A connected component of the similarity graph.
#[derive(Debug, Clone)]
pub struct Component {
    /// Member point ids, in visit order.
    pub members: Vec<Uuid>,

    /// Sum of the members' aggregate neighbor scores.
    pub score: f32,
}

impl Component {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Adjacency structure built from per-anchor neighbor queries.
///
/// Edges are stored exactly as returned, which may be asymmetric: anchor
/// A can list B as a neighbor without B listing A. Traversal treats any
/// recorded edge as connecting both endpoints (the undirected closure),
/// the most inclusive reading of the neighbor relation.
#[derive(Debug, Default)]
pub struct SimilarityGraph {
    /// Every node in first-seen order, for deterministic traversal.
    order: Vec<Uuid>,

    /// Outgoing edges as returned by the neighbor queries.
    edges: HashMap<Uuid, Vec<(Uuid, f32)>>,

    /// Reverse adjacency, maintained for the undirected closure.
    reverse: HashMap<Uuid, Vec<Uuid>>,

    /// Per-anchor aggregate score: the sum of its neighbor scores.
    scores: HashMap<Uuid, f32>,
}

impl SimilarityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one anchor's neighbor list.
    pub fn record(&mut self, anchor: Uuid, neighbors: &[(Uuid, f32)]) {
        self.see(anchor);
        let aggregate: f32 = neighbors.iter().map(|(_, score)| score).sum();
        *self.scores.entry(anchor).or_insert(0.0) += aggregate;

        let out = self.edges.entry(anchor).or_default();
        for (neighbor, score) in neighbors {
            out.push((*neighbor, *score));
        }
        for (neighbor, _) in neighbors {
            self.see(*neighbor);
            self.reverse.entry(*neighbor).or_default().push(anchor);
        }
    }

    /// Number of distinct nodes seen so far.
    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    fn see(&mut self, node: Uuid) {
        if !self.order.contains(&node) {
            self.order.push(node);
        }
    }

    /// Extract connected components, singletons discarded, ranked by
    /// total score descending with discovery order breaking ties.
    pub fn components(&self) -> Vec<Component> {
        let mut visited: HashSet<Uuid> = HashSet::new();
        let mut components = Vec::new();

        for seed in &self.order {
            if visited.contains(seed) {
                continue;
            }
            let component = self.traverse(*seed, &mut visited);
            if component.len() >= 2 {
                components.push(component);
            }
        }

        // Stable sort keeps discovery order for equal scores.
        components.sort_by_key(|c| std::cmp::Reverse(OrderedFloat(c.score)));
        components
    }

    fn traverse(&self, seed: Uuid, visited: &mut HashSet<Uuid>) -> Component {
        let mut members = Vec::new();
        let mut score = 0.0;
        let mut queue = VecDeque::new();

        visited.insert(seed);
        queue.push_back(seed);

        while let Some(node) = queue.pop_front() {
            members.push(node);
            score += self.scores.get(&node).copied().unwrap_or(0.0);

            if let Some(out) = self.edges.get(&node) {
                for (neighbor, _) in out {
                    if visited.insert(*neighbor) {
                        queue.push_back(*neighbor);
                    }
                }
            }
            if let Some(incoming) = self.reverse.get(&node) {
                for neighbor in incoming {
                    if visited.insert(*neighbor) {
                        queue.push_back(*neighbor);
                    }
                }
            }
        }

        Component { members, score }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_mutual_triple_forms_one_component() {
        // Messages 0, 1, 2 return each other; 3 and 4 are isolated.
        let m = ids(5);
        let mut graph = SimilarityGraph::new();
        graph.record(m[0], &[(m[1], 0.9), (m[2], 0.8)]);
        graph.record(m[1], &[(m[0], 0.9), (m[2], 0.7)]);
        graph.record(m[2], &[(m[0], 0.8), (m[1], 0.7)]);
        graph.record(m[3], &[]);
        graph.record(m[4], &[]);

        let components = graph.components();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].members, vec![m[0], m[1], m[2]]);
        for isolated in &m[3..] {
            assert!(!components[0].members.contains(isolated));
        }
    }

    #[test]
    fn test_asymmetric_edge_still_connects() {
        // Only A lists B; the undirected closure connects them anyway.
        let m = ids(2);
        let mut graph = SimilarityGraph::new();
        graph.record(m[0], &[(m[1], 0.6)]);
        graph.record(m[1], &[]);

        let components = graph.components();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), 2);
    }

    #[test]
    fn test_singletons_discarded() {
        let m = ids(3);
        let mut graph = SimilarityGraph::new();
        graph.record(m[0], &[]);
        graph.record(m[1], &[(m[2], 0.9)]);
        graph.record(m[2], &[(m[1], 0.9)]);

        let components = graph.components();
        assert_eq!(components.len(), 1);
        assert!(!components[0].members.contains(&m[0]));
    }

    #[test]
    fn test_component_score_sums_member_aggregates() {
        let m = ids(4);
        let mut graph = SimilarityGraph::new();
        graph.record(m[0], &[(m[1], 0.5)]);
        graph.record(m[1], &[(m[0], 0.5)]);
        graph.record(m[2], &[(m[3], 0.9)]);
        graph.record(m[3], &[(m[2], 0.9)]);

        let components = graph.components();
        assert_eq!(components.len(), 2);
        // Higher-scoring pair first.
        assert!((components[0].score - 1.8).abs() < 1e-6);
        assert!((components[1].score - 1.0).abs() < 1e-6);
        assert_eq!(components[0].members, vec![m[2], m[3]]);
    }

    #[test]
    fn test_equal_scores_keep_discovery_order() {
        let m = ids(4);
        let mut graph = SimilarityGraph::new();
        graph.record(m[0], &[(m[1], 0.5)]);
        graph.record(m[1], &[(m[0], 0.5)]);
        graph.record(m[2], &[(m[3], 0.5)]);
        graph.record(m[3], &[(m[2], 0.5)]);

        for _ in 0..10 {
            let components = graph.components();
            assert_eq!(components.len(), 2);
            assert_eq!(components[0].members, vec![m[0], m[1]]);
            assert_eq!(components[1].members, vec![m[2], m[3]]);
        }
    }

    #[test]
    fn test_components_are_disjoint() {
        let m = ids(6);
        let mut graph = SimilarityGraph::new();
        graph.record(m[0], &[(m[1], 0.9), (m[2], 0.4)]);
        graph.record(m[1], &[(m[2], 0.8)]);
        graph.record(m[3], &[(m[4], 0.7)]);
        graph.record(m[4], &[(m[5], 0.6)]);

        let components = graph.components();
        let mut seen = HashSet::new();
        for component in &components {
            for member in &component.members {
                assert!(seen.insert(*member), "member appears in two components");
            }
        }
    }
}
