//! Validated cluster structures persisted after a grouping pass.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::vocab::Category;

/// Validation failures raised at construction time.
#[derive(Error, Debug)]
pub enum InvalidClusterSet {
    /// A cluster must connect at least two messages.
    #[error("cluster has {size} member(s), minimum is 2")]
    SingletonCluster { size: usize },

    /// A point id appeared in more than one cluster of the same set.
    #[error("point {point_id} appears in more than one cluster")]
    OverlappingClusters { point_id: Uuid },
}

/// A rehydrated cluster member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMember {
    /// Platform-assigned message id.
    pub message_id: String,

    /// Conversation the message belongs to.
    pub conversation_id: String,

    /// Original message text.
    pub content: String,
}

/// A group of mutually similar messages discovered in one clustering pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Point ids of every member.
    pub point_ids: Vec<Uuid>,

    /// Sum of the members' aggregate neighbor scores.
    pub score: f32,

    /// Rehydrated member content, in point-id order.
    pub members: Vec<ClusterMember>,

    /// AI-generated one-line overview, filled during enrichment.
    pub overview: Option<String>,

    /// Coarse topic category, filled during enrichment.
    pub category: Option<Category>,
}

impl Cluster {
    /// Create an unenriched cluster. Fails on singleton input.
    pub fn new(point_ids: Vec<Uuid>, score: f32) -> Result<Self, InvalidClusterSet> {
        if point_ids.len() < 2 {
            return Err(InvalidClusterSet::SingletonCluster {
                size: point_ids.len(),
            });
        }
        Ok(Self {
            point_ids,
            score,
            members: Vec::new(),
            overview: None,
            category: None,
        })
    }

    /// Number of member points.
    pub fn len(&self) -> usize {
        self.point_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point_ids.is_empty()
    }

    /// Member contents joined for prompt construction.
    pub fn joined_contents(&self) -> String {
        self.members
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The persisted result of one clustering and enrichment pass.
///
/// A set is replaced wholesale on resync; it is never merged with a prior
/// set for the same agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupedMessageSet {
    /// Agent the set belongs to.
    pub agent_id: String,

    /// Clusters ordered by descending aggregate score.
    pub clusters: Vec<Cluster>,

    /// When the pass completed.
    pub created_at: DateTime<Utc>,
}

impl GroupedMessageSet {
    /// Create a set, enforcing the no-singleton and disjointness
    /// invariants across the provided clusters.
    pub fn new(
        agent_id: impl Into<String>,
        clusters: Vec<Cluster>,
    ) -> Result<Self, InvalidClusterSet> {
        let mut seen: HashSet<Uuid> = HashSet::new();
        for cluster in &clusters {
            if cluster.len() < 2 {
                return Err(InvalidClusterSet::SingletonCluster {
                    size: cluster.len(),
                });
            }
            for point_id in &cluster.point_ids {
                if !seen.insert(*point_id) {
                    return Err(InvalidClusterSet::OverlappingClusters {
                        point_id: *point_id,
                    });
                }
            }
        }
        Ok(Self {
            agent_id: agent_id.into(),
            clusters,
            created_at: Utc::now(),
        })
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
    fn test_singleton_cluster_rejected() {
        let result = Cluster::new(ids(1), 1.0);
        assert!(matches!(
            result,
            Err(InvalidClusterSet::SingletonCluster { size: 1 })
        ));
    }

    #[test]
    fn test_pair_cluster_accepted() {
        let cluster = Cluster::new(ids(2), 1.5).unwrap();
        assert_eq!(cluster.len(), 2);
        assert!(cluster.overview.is_none());
    }

    #[test]
    fn test_overlapping_clusters_rejected() {
        let shared = Uuid::new_v4();
        let a = Cluster::new(vec![shared, Uuid::new_v4()], 2.0).unwrap();
        let b = Cluster::new(vec![Uuid::new_v4(), shared], 1.0).unwrap();
        let result = GroupedMessageSet::new("agent-1", vec![a, b]);
        assert!(matches!(
            result,
            Err(InvalidClusterSet::OverlappingClusters { point_id }) if point_id == shared
        ));
    }

    #[test]
    fn test_disjoint_set_accepted() {
        let a = Cluster::new(ids(3), 3.0).unwrap();
        let b = Cluster::new(ids(2), 1.0).unwrap();
        let set = GroupedMessageSet::new("agent-1", vec![a, b]).unwrap();
        assert_eq!(set.clusters.len(), 2);
        assert_eq!(set.agent_id, "agent-1");
    }

    #[test]
    fn test_joined_contents() {
        let mut cluster = Cluster::new(ids(2), 1.0).unwrap();
        cluster.members = vec![
            ClusterMember {
                message_id: "m1".into(),
                conversation_id: "c1".into(),
                content: "reset my password".into(),
            },
            ClusterMember {
                message_id: "m2".into(),
                conversation_id: "c2".into(),
                content: "forgot password".into(),
            },
        ];
        assert_eq!(cluster.joined_contents(), "reset my password, forgot password");
    }
}
