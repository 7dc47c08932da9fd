//! The message-to-point embedding pipeline.

use std::sync::Arc;

use tracing::{debug, warn};

use chatlens_gateway::{Gateway, GatewayError};
use chatlens_protocol::{Embedding, Message, Point};

/// One message that could not be embedded.
#[derive(Debug)]
pub struct EmbedFailure {
    /// Platform-assigned message id.
    pub message_id: String,

    /// Why the embedding call failed.
    pub error: GatewayError,
}

/// The outcome of embedding one batch of messages.
///
/// `points` may be shorter than the input: failed messages are skipped,
/// never padded with placeholders.
#[derive(Debug, Default)]
pub struct EmbeddedBatch {
    /// Points for every message that embedded successfully.
    pub points: Vec<Point>,

    /// Messages that were skipped, with their errors.
    pub failures: Vec<EmbedFailure>,
}

impl EmbeddedBatch {
    /// Message ids that produced a point.
    pub fn succeeded_ids(&self) -> Vec<&str> {
        self.points
            .iter()
            .map(|p| p.payload.message_id.as_str())
            .collect()
    }
}

/// Embeds messages through the gateway, one call per message.
pub struct EmbeddingPipeline {
    gateway: Arc<Gateway>,
}

impl EmbeddingPipeline {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Embed a batch of messages into points.
    ///
    /// Per-message failures are logged and recorded but do not abort the
    /// batch.
    pub async fn embed(&self, messages: &[Message]) -> EmbeddedBatch {
        let mut batch = EmbeddedBatch::default();
        for message in messages {
            match self.gateway.embed_text(&message.content).await {
                Ok(vector) => {
                    debug!("Embedded message {} ({} dims)", message.id, vector.len());
                    batch.points.push(Point::from_message(message, vector));
                }
                Err(error) => {
                    warn!("Skipping message {}: {error}", message.id);
                    batch.failures.push(EmbedFailure {
                        message_id: message.id.clone(),
                        error,
                    });
                }
            }
        }
        batch
    }

    /// Embed an ad hoc query string, reusing the same call path.
    pub async fn embed_query(&self, text: &str) -> Result<Embedding, GatewayError> {
        self.gateway.embed_text(text).await
    }
}
