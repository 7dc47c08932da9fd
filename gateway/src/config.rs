//! Configuration for the AI provider gateway.

use serde::{Deserialize, Serialize};

/// Configuration shared by all provider adapters.
///
/// Calls are routed through a single AI service base URL; the engine name
/// and the provider-specific path are appended per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the AI service.
    pub base_url: String,

    /// Bearer token for the AI service.
    pub token: String,

    /// Chat model used for completion-backed analysis.
    pub completion_model: String,

    /// Embedding model.
    pub embedding_model: String,

    /// Output dimensions requested from the embedding model.
    pub embedding_dimensions: usize,

    /// Claude model name.
    pub claude_model: String,

    /// Maximum tokens for Claude completions.
    pub claude_max_tokens: u32,

    /// Replicate model version hash.
    pub replicate_version: String,
}

impl GatewayConfig {
    /// Create a configuration with default model choices.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            completion_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-large".to_string(),
            embedding_dimensions: 3072,
            claude_model: "claude-sonnet-4-20250514".to_string(),
            claude_max_tokens: 1024,
            replicate_version: String::new(),
        }
    }

    /// Set the completion model.
    pub fn with_completion_model(mut self, model: impl Into<String>) -> Self {
        self.completion_model = model.into();
        self
    }

    /// Set the embedding model and output dimensions.
    pub fn with_embedding_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.embedding_model = model.into();
        self.embedding_dimensions = dimensions;
        self
    }

    /// Set the Replicate model version.
    pub fn with_replicate_version(mut self, version: impl Into<String>) -> Self {
        self.replicate_version = version.into();
        self
    }
}
