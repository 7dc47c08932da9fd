//! # Embedding Pipeline
//!
//! Turns transcript messages into vector-store points via the AI
//! gateway's embedding operation.
//!
//! Each point carries a provenance payload (content, sender role,
//! conversation id, message id) so search hits can be rehydrated without
//! a database round trip. Messages whose embedding call fails are
//! skipped and logged; the batch never aborts and emits no placeholder
//! for a skipped message.

pub mod pipeline;

pub use pipeline::{EmbeddedBatch, EmbeddingPipeline, EmbedFailure};
