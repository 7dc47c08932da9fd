//! Closed vocabularies produced by the AI analysis operations.

use serde::{Deserialize, Serialize};

/// Coarse topic category assigned to a cluster.
///
/// Providers return free text; anything outside the recognized set is
/// coerced to [`Category::Other`] so that persisted data stays within a
/// closed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// The user is asking the agent to do something.
    Action,
    /// Conversational small talk.
    Chat,
    /// Everything else, including unrecognized provider output.
    Other,
}

impl Category {
    /// Coerce free-form provider output into the recognized set.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "action" => Category::Action,
            "chat" => Category::Chat,
            _ => Category::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Action => "action",
            Category::Chat => "chat",
            Category::Other => "other",
        }
    }
}

/// Emotion detected across a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Happy,
    Sad,
    Surprised,
    Neutral,
}

impl Emotion {
    /// Every recognized emotion, in prompt order.
    pub const ALL: [Emotion; 5] = [
        Emotion::Angry,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprised,
        Emotion::Neutral,
    ];

    /// Parse the provider's wire value. Returns `None` for anything
    /// outside the vocabulary so the caller can surface a format error.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "angry" => Some(Emotion::Angry),
            "happy" => Some(Emotion::Happy),
            "sad" => Some(Emotion::Sad),
            "surprised" => Some(Emotion::Surprised),
            "neutral" => Some(Emotion::Neutral),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprised => "surprised",
            Emotion::Neutral => "neutral",
        }
    }
}

/// Sentiment grade for a conversation's user messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    SuperPositive,
    Positive,
    Neutral,
    Negative,
    SuperNegative,
}

impl Sentiment {
    /// Parse the provider's wire value. Returns `None` for anything
    /// outside the vocabulary so the caller can surface a format error.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SUPER_POSITIVE" => Some(Sentiment::SuperPositive),
            "POSITIVE" => Some(Sentiment::Positive),
            "NEUTRAL" => Some(Sentiment::Neutral),
            "NEGATIVE" => Some(Sentiment::Negative),
            "SUPER_NEGATIVE" => Some(Sentiment::SuperNegative),
            _ => None,
        }
    }
}
