//! Vector-store points and their provenance payloads.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::{Message, SenderRole};
use crate::Embedding;

/// Provenance payload stored alongside each vector.
///
/// Carries enough context to rehydrate a search hit without a database
/// round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    /// Original message text.
    pub content: String,

    /// Author of the message.
    pub sender_role: SenderRole,

    /// Conversation the message belongs to.
    pub conversation_id: String,

    /// Platform-assigned message id.
    pub message_id: String,
}

impl PointPayload {
    /// Build a payload from a message.
    pub fn from_message(message: &Message) -> Self {
        Self {
            content: message.content.clone(),
            sender_role: message.sender_role,
            conversation_id: message.conversation_id.clone(),
            message_id: message.id.clone(),
        }
    }
}

/// A vector-store record.
///
/// The id is the owning message's embedding id, so re-upserting after a
/// retry overwrites rather than duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    /// Point id, equal to the message's embedding id.
    pub id: Uuid,

    /// The embedding vector.
    pub vector: Embedding,

    /// Provenance payload.
    pub payload: PointPayload,
}

impl Point {
    /// Build a point from a message and its embedding vector.
    pub fn from_message(message: &Message, vector: Embedding) -> Self {
        Self {
            id: message.embedding_id,
            vector,
            payload: PointPayload::from_message(message),
        }
    }
}
