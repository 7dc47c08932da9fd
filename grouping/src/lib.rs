//! # Grouping Orchestration
//!
//! Ties the other crates together into the per-agent lifecycle: embed
//! pending messages, cluster the stored points, enrich the clusters, and
//! serve similarity search.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Grouper                                │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  MessageStore ──► EmbeddingPipeline ──► VectorStoreClient        │
//! │        │                                      │                  │
//! │        │          ClusteringEngine ◄── NeighborSource            │
//! │        ▼                │                                        │
//! │  GroupedStore ◄── Gateway (cluster enrichment)                   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`MessageStore`] and [`GroupedStore`] ports abstract the backing
//! persistence; [`InMemoryMessageStore`] and [`InMemoryGroupedStore`]
//! serve tests and embedded use.

pub mod error;
pub mod neighbors;
pub mod ports;
pub mod service;

pub use error::{GroupingError, Result};
pub use neighbors::StoreNeighborSource;
pub use ports::{GroupedStore, InMemoryGroupedStore, InMemoryMessageStore, MessageStore};
pub use service::{AgentBatch, EmbedReport, Grouper, RegroupOutcome, SearchHit};
