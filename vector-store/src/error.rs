//! Error types for the vector-store client.

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while talking to the vector store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The request never produced an HTTP response.
    #[error("transport failure calling {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// The store answered with a non-2xx status.
    #[error("HTTP {status} from {endpoint}: {body}")]
    Http {
        status: u16,
        endpoint: String,
        body: String,
    },

    /// The store accepted the request but did not acknowledge the write.
    #[error("upsert not acknowledged, status was {status:?}")]
    NotAcknowledged { status: Option<String> },

    /// The response is missing expected attributes.
    #[error("malformed store response: {0}")]
    Format(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
