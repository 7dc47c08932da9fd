//! # Protocol
//!
//! Shared data model for the chatlens topic-grouping core.
//!
//! The types here flow between the embedding pipeline, the vector-store
//! client, the clustering engine, and the grouping orchestrator:
//!
//! - [`Message`]: an ingested transcript message (the core owns only its
//!   `embedded` flag).
//! - [`Point`]: a vector-store record keyed by the message's embedding id.
//! - [`Cluster`] / [`GroupedMessageSet`]: the validated output of one
//!   clustering and enrichment pass.
//! - [`Category`] / [`Sentiment`] / [`Emotion`]: closed vocabularies
//!   produced by the AI analysis operations.

pub mod audit;
pub mod cluster;
pub mod message;
pub mod point;
pub mod vocab;

pub use audit::{
    AuditEntry, AuditId, AuditOutcome, AuditRecord, AuditSink, AuditStatus, InMemoryAuditSink,
};
pub use cluster::{Cluster, ClusterMember, GroupedMessageSet, InvalidClusterSet};
pub use message::{Message, SenderRole};
pub use point::{Point, PointPayload};
pub use vocab::{Category, Emotion, Sentiment};

/// A dense embedding vector.
pub type Embedding = Vec<f32>;
