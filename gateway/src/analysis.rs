//! Higher-level analysis operations built on the gateway.
//!
//! Each operation prompts with a fixed instruction template and parses a
//! structured JSON result out of the generated text. Missing attributes
//! fail with [`GatewayError::Format`] instead of returning partial data.

use serde::{Deserialize, Serialize};

use chatlens_protocol::vocab::{Category, Emotion, Sentiment};

use crate::error::{GatewayError, Result};
use crate::provider::Gateway;

/// Sentiment of a conversation's user messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub sentiment: Sentiment,
    pub details: String,
}

/// Label assigned to a conversation from a caller-supplied vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelAnalysis {
    pub label: String,
    pub details: String,
}

/// Dominant emotion detected in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalAnalysis {
    pub emotion: Emotion,
    pub details: String,
}

/// Generated conversation title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleAnalysis {
    pub title: String,
    pub details: String,
}

/// Overview and coarse category for one message cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedAnalysis {
    pub overview: String,
    pub category: Category,
    pub details: Option<String>,
}

/// One detected topic shift within a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextShift {
    pub from_topic: String,
    pub to_topic: String,
    pub reason: String,
}

/// Context-change analysis of a whole conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextChangeAnalysis {
    pub overall_context: String,
    pub topics: Vec<String>,
    pub context_changes: Vec<ContextShift>,
}

/// Pull the JSON object out of generated text.
///
/// Providers wrap results in prose or markdown fences often enough that
/// we scan for the outermost braces instead of parsing the text whole.
fn extract_json(text: &str) -> Result<serde_json::Value> {
    let start = text.find('{');
    let end = text.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str(&text[start..=end]).map_err(|err| {
                GatewayError::Format(format!("generated text is not valid JSON: {err}"))
            })
        }
        _ => Err(GatewayError::Format(
            "no JSON object in generated text".to_string(),
        )),
    }
}

fn require_str(value: &serde_json::Value, key: &str) -> Result<String> {
    value[key]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| GatewayError::Format(format!("missing \"{key}\" attribute")))
}

impl Gateway {
    /// Analyze the sentiment of the user's messages in a conversation.
    pub async fn sentiment_analysis(&self, conversation: &str) -> Result<SentimentAnalysis> {
        let prompt = format!(
            "Here is a conversation between an AI assistant and a user.\n\
             Analyze the sentiment of the user's messages and provide a summary of their emotional state.\n\
             Focus only on the user's messages.\n\
             {conversation}\n\
             Provide the sentiment analysis in the following format:\n\
             {{\n\
                 \"sentiment\": \"<SUPER_POSITIVE/POSITIVE/NEUTRAL/NEGATIVE/SUPER_NEGATIVE>\",\n\
                 \"details\": \"<brief explanation of the sentiment>\"\n\
             }}"
        );
        let text = self.generate_text(&prompt).await?;
        let value = extract_json(&text)?;
        let raw_sentiment = require_str(&value, "sentiment")?;
        let sentiment = Sentiment::parse(&raw_sentiment).ok_or_else(|| {
            GatewayError::Format(format!("unrecognized sentiment \"{raw_sentiment}\""))
        })?;
        Ok(SentimentAnalysis {
            sentiment,
            details: require_str(&value, "details")?,
        })
    }

    /// Assign the most appropriate label from the given options.
    pub async fn label_analysis(&self, conversation: &str, labels: &[String]) -> Result<LabelAnalysis> {
        let prompt = format!(
            "Here is a conversation between an AI assistant and a user.\n\
             Analyze the conversation and assign the most appropriate label from the following options:\n\
             {labels}\n\
             {conversation}\n\
             Provide the label analysis in the following format:\n\
             {{\n\
                 \"label\": \"<assigned_label>\",\n\
                 \"details\": \"<brief explanation of the label>\"\n\
             }}",
            labels = labels.join(", "),
        );
        let text = self.generate_text(&prompt).await?;
        let value = extract_json(&text)?;
        Ok(LabelAnalysis {
            label: require_str(&value, "label")?,
            details: require_str(&value, "details")?,
        })
    }

    /// Detect the dominant emotion in a conversation.
    ///
    /// Runs label analysis over the closed emotion vocabulary; a label
    /// outside that vocabulary fails as a format error rather than being
    /// coerced.
    pub async fn emotional_analysis(&self, conversation: &str) -> Result<EmotionalAnalysis> {
        let labels: Vec<String> = Emotion::ALL
            .iter()
            .map(|e| e.as_str().to_string())
            .collect();
        let analysis = self.label_analysis(conversation, &labels).await?;
        let emotion = Emotion::parse(&analysis.label).ok_or_else(|| {
            GatewayError::Format(format!("unrecognized emotion \"{}\"", analysis.label))
        })?;
        Ok(EmotionalAnalysis {
            emotion,
            details: analysis.details,
        })
    }

    /// Create a concise title for a conversation, in the user's language.
    pub async fn conversation_title(&self, conversation: &str) -> Result<TitleAnalysis> {
        let prompt = format!(
            "Here is a conversation between a user and an AI assistant.\n\
             Focus only on the user's messages and create a concise, descriptive title that summarizes the main topic or purpose of the conversation.\n\
             Detect the language of the user's messages and generate the title in the same language.\n\
             Conversation:\n{conversation}\n\
             Provide the title in the following format:\n\
             {{\n\
                 \"title\": \"<concise and descriptive title in the language of the messages up to 25 characters>\",\n\
                 \"details\": \"<brief explanation of the title>\"\n\
             }}"
        );
        let text = self.generate_text(&prompt).await?;
        let value = extract_json(&text)?;
        Ok(TitleAnalysis {
            title: require_str(&value, "title")?,
            details: require_str(&value, "details")?,
        })
    }

    /// Summarize one cluster of similar messages and categorize it.
    ///
    /// Unrecognized categories are coerced to `other`, so persisted data
    /// stays within the closed vocabulary.
    pub async fn grouped_messages_analysis(&self, contents: &str) -> Result<GroupedAnalysis> {
        let prompt = format!(
            "Here is a group of semantically similar messages sent to a chat agent by its users:\n\
             {contents}\n\
             Summarize what these messages have in common and classify the group.\n\
             Provide the analysis in the following format:\n\
             {{\n\
                 \"overview\": \"<one-sentence summary of the recurring topic>\",\n\
                 \"type\": \"<action if the users ask the agent to do something, chat if it is small talk, other otherwise>\",\n\
                 \"details\": \"<brief explanation of the classification>\"\n\
             }}"
        );
        let text = self.generate_text(&prompt).await?;
        let value = extract_json(&text)?;
        let overview = require_str(&value, "overview")?;
        let category = Category::coerce(&require_str(&value, "type")?);
        Ok(GroupedAnalysis {
            overview,
            category,
            details: value["details"].as_str().map(str::to_string),
        })
    }

    /// Detect topic shifts across an ordered conversation transcript.
    pub async fn context_change_analysis(&self, transcript: &str) -> Result<ContextChangeAnalysis> {
        let prompt = format!(
            "Here is a conversation between an AI assistant and a user, one message per line prefixed with the sender.\n\
             Identify the overall context, the distinct topics discussed, and every point where the user changes the subject.\n\
             {transcript}\n\
             Provide the analysis in the following format:\n\
             {{\n\
                 \"overall_context\": \"<one-sentence description of the conversation>\",\n\
                 \"topics\": [\"<topic>\", ...],\n\
                 \"context_changes\": [{{\"from_topic\": \"<topic>\", \"to_topic\": \"<topic>\", \"reason\": \"<brief explanation>\"}}, ...]\n\
             }}"
        );
        let text = self.generate_text(&prompt).await?;
        let value = extract_json(&text)?;
        // Re-parse through the typed struct so missing attributes surface
        // as format errors rather than silent defaults.
        let overall_context = require_str(&value, "overall_context")?;
        let topics = value["topics"]
            .as_array()
            .ok_or_else(|| GatewayError::Format("missing \"topics\" attribute".into()))?
            .iter()
            .filter_map(|t| t.as_str().map(str::to_string))
            .collect();
        let context_changes = match value.get("context_changes") {
            Some(changes) => serde_json::from_value(changes.clone()).map_err(|err| {
                GatewayError::Format(format!("malformed \"context_changes\": {err}"))
            })?,
            None => Vec::new(),
        };
        Ok(ContextChangeAnalysis {
            overall_context,
            topics,
            context_changes,
        })
    }
}
