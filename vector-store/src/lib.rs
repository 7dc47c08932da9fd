//! # Vector Store Client
//!
//! HTTP client for the remote vector store, managing one collection per
//! agent.
//!
//! ## Features
//!
//! - **Namespacing**: collections are keyed `<prefix>_<agent_id>` to
//!   avoid tenant collisions
//! - **Idempotent upserts**: point ids are message embedding ids, so
//!   retries overwrite instead of duplicating
//! - **Audited calls**: every request goes through one logging wrapper
//!   recording method, endpoint, payload, and response
//! - **Error values**: non-2xx responses come back as error results so
//!   batch callers decide per-item handling

pub mod client;
pub mod error;
pub mod types;

pub use client::{StoreConfig, VectorStoreClient};
pub use error::{Result, StoreError};
pub use types::{DistanceMetric, QueryTarget, Record, ScoredPoint};
