//! Canonical chat-completion shaped response

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::agent::Role;

/// Object tag written on normalized responses
pub const CHAT_COMPLETION_OBJECT: &str = "chat.completion";

/// The only response shape handed to callers
///
/// Always carries at least one choice; `usage.total_tokens` equals the sum of
/// its two parts and `citations`, when present, is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    /// Response id
    #[serde(default)]
    pub id: String,
    /// Object tag
    #[serde(default)]
    pub object: String,
    /// Creation time (unix seconds)
    #[serde(default)]
    pub created: i64,
    /// Model that produced the response
    #[serde(default)]
    pub model: String,
    /// Exactly one assistant choice after normalization
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Token accounting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ChatUsage>,
    /// Cited URLs in document order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<String>>,
    /// Fields this crate does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatResponse {
    /// Text of the first choice, empty when there is none
    #[must_use]
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .map_or("", |c| c.message.content.as_str())
    }

    /// Cited URLs, empty when none were returned
    #[must_use]
    pub fn citations(&self) -> &[String] {
        self.citations.as_deref().unwrap_or_default()
    }
}

/// One generated alternative
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    /// Position in `choices`
    #[serde(default)]
    pub index: u32,
    /// Generated message
    pub message: AssistantMessage,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Generated message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantMessage {
    /// Always `assistant` for normalized output
    pub role: Role,
    /// Generated text (null upstream content becomes empty)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

/// Chat-style token accounting
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatUsage {
    /// Prompt tokens
    pub prompt_tokens: u64,
    /// Generated tokens
    pub completion_tokens: u64,
    /// `prompt_tokens + completion_tokens`
    pub total_tokens: u64,
}

impl ChatUsage {
    /// Usage whose total is derived from its parts
    #[must_use]
    pub const fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

fn null_as_empty<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}
