//! Error types for the AI provider gateway.

use thiserror::Error;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur while invoking a provider.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The request never produced an HTTP response.
    #[error("transport failure calling {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// The provider answered with a non-2xx status.
    #[error("HTTP {status} from {endpoint}: {body}")]
    Http {
        status: u16,
        endpoint: String,
        body: String,
    },

    /// The provider response is missing expected attributes.
    #[error("malformed provider response: {0}")]
    Format(String),

    /// The selected engine does not serve this operation.
    #[error("engine {engine} does not support {operation}")]
    Unsupported {
        engine: &'static str,
        operation: &'static str,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
