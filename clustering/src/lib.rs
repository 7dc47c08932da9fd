//! # Similarity Graph Clustering
//!
//! Discovers groups of mutually similar messages with no predefined
//! cluster count.
//!
//! ## Algorithm
//!
//! 1. For each anchor point, fetch its top-K nearest neighbors through
//!    the [`NeighborSource`] port.
//! 2. Record the returned edges (possibly asymmetric) in a
//!    [`SimilarityGraph`], accumulating a per-anchor aggregate score.
//! 3. Extract connected components by breadth-first traversal over the
//!    undirected closure of the recorded edges.
//! 4. Discard singleton components: a message with no close neighbor is
//!    a one-off, not a recurring topic.
//! 5. Rank surviving components by total score, descending; ties keep
//!    discovery order.
//!
//! The graph is a plain data structure, unit-testable without any
//! network calls; the engine only adds the anchor-query loop on top.

pub mod engine;
pub mod graph;

pub use engine::{ClusteringConfig, ClusteringEngine, NeighborSource};
pub use graph::{Component, SimilarityGraph};
