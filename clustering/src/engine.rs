//! The anchor-query loop that drives graph construction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::graph::{Component, SimilarityGraph};

/// Source of nearest-neighbor lookups, usually backed by the vector
/// store's recommend-by-point query.
#[async_trait]
pub trait NeighborSource: Send + Sync {
    /// Return up to `top_k` neighbors of `anchor` scoring at or above
    /// `score_threshold`, as `(point_id, score)` pairs. The anchor
    /// itself may appear in the result; callers filter it out.
    async fn neighbors(
        &self,
        anchor: Uuid,
        top_k: usize,
        score_threshold: f32,
    ) -> anyhow::Result<Vec<(Uuid, f32)>>;
}

/// Tuning knobs for the clustering pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Neighbors requested per anchor.
    pub top_k: usize,

    /// Minimum similarity for an edge to count.
    pub score_threshold: f32,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            score_threshold: 0.5,
        }
    }
}

/// Runs one clustering pass over a set of anchor points.
pub struct ClusteringEngine<S> {
    source: S,
    config: ClusteringConfig,
}

impl<S: NeighborSource> ClusteringEngine<S> {
    pub fn new(source: S, config: ClusteringConfig) -> Self {
        Self { source, config }
    }

    /// Query every anchor, build the similarity graph, and extract its
    /// ranked components.
    ///
    /// A failed neighbor query isolates that anchor (logged, skipped);
    /// it does not abort the pass. The anchor can still join a cluster
    /// through edges recorded by other anchors.
    pub async fn cluster(&self, anchors: &[Uuid]) -> Vec<Component> {
        let mut graph = SimilarityGraph::new();
        for anchor in anchors {
            let neighbors = match self
                .source
                .neighbors(*anchor, self.config.top_k, self.config.score_threshold)
                .await
            {
                Ok(neighbors) => neighbors,
                Err(error) => {
                    warn!("Neighbor query for {anchor} failed, skipping: {error:#}");
                    continue;
                }
            };
            let edges: Vec<(Uuid, f32)> = neighbors
                .into_iter()
                .filter(|(id, _)| id != anchor)
                .collect();
            debug!("Anchor {anchor}: {} neighbors", edges.len());
            graph.record(*anchor, &edges);
        }
        graph.components()
    }
}
