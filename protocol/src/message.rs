//! Transcript messages as delivered by the ingestion collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderRole {
    /// The human participant.
    User,
    /// The chat agent.
    Assistant,
}

impl SenderRole {
    /// Wire representation used in store payloads and filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderRole::User => "user",
            SenderRole::Assistant => "assistant",
        }
    }
}

/// A single transcript message.
///
/// Created by the ingestion collaborator; this core reads every field but
/// owns only the `embedded` flag, which is flipped exclusively after the
/// message's point has been acknowledged by the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Platform-assigned message id.
    pub id: String,

    /// Raw message text.
    pub content: String,

    /// Author of the message.
    pub sender_role: SenderRole,

    /// Conversation the message belongs to.
    pub conversation_id: String,

    /// Agent that owns the conversation.
    pub agent_id: String,

    /// Stable id used as the vector-store point id.
    pub embedding_id: Uuid,

    /// Whether the message's point has been durably stored.
    pub embedded: bool,

    /// When the message was created on the platform.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create an unembedded message with a fresh embedding id.
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        sender_role: SenderRole,
        conversation_id: impl Into<String>,
        agent_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            sender_role,
            conversation_id: conversation_id.into(),
            agent_id: agent_id.into(),
            embedding_id: Uuid::new_v4(),
            embedded: false,
            created_at,
        }
    }
}
