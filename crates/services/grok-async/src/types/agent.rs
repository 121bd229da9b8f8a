//! Wire types for `POST /responses`
//!
//! Response types are deliberately lenient: unknown fields are kept in
//! `extra` maps, unknown or untyped output items deserialize to
//! [`OutputItem::Unrecognized`] and fields of the wrong shape fall back to
//! their defaults. Strictness lives in [`crate::validation`].

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Message author role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction
    System,
    /// End-user input
    User,
    /// Model output
    Assistant,
}

/// One input message sent upstream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Author role
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// User message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// System message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Tag carried by [`SearchToolDirective`]; serialized as `x_search`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchToolKind {
    /// Live X (Twitter) search
    #[default]
    XSearch,
}

/// Server-side X search directive attached to a request
///
/// Dates serialize as `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchToolDirective {
    /// Always `x_search`
    #[serde(rename = "type")]
    pub kind: SearchToolKind,
    /// Only search posts from these handles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_x_handles: Option<Vec<String>>,
    /// Never search posts from these handles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_x_handles: Option<Vec<String>>,
    /// Earliest post date (inclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<NaiveDate>,
    /// Latest post date (inclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<NaiveDate>,
    /// Let the search tool look at attached images
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_image_understanding: Option<bool>,
}

impl SearchToolDirective {
    /// Directive without any constraints
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Directive bounded to `[from, to]`
    #[must_use]
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from_date: Some(from),
            to_date: Some(to),
            ..Self::default()
        }
    }
}

/// Request body for `POST /responses`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRequest {
    /// Model name
    pub model: String,
    /// Ordered, non-empty input messages
    pub input: Vec<ChatMessage>,
    /// Search directives; absent (not empty) when search is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<SearchToolDirective>>,
    /// Sampling temperature in `[0, 2]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Upper bound on generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl AgentRequest {
    /// Request with a single user message
    #[must_use]
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: vec![ChatMessage::user(prompt)],
            tools: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Attach one search directive
    #[must_use]
    pub fn with_search(mut self, directive: SearchToolDirective) -> Self {
        self.tools = Some(vec![directive]);
        self
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the token cap
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// True when at least one search directive is attached
    #[must_use]
    pub fn uses_search(&self) -> bool {
        self.tools.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// Response body from `POST /responses`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentResponse {
    /// Response id
    #[serde(default, deserialize_with = "or_default")]
    pub id: String,
    /// Object tag, `response` for this endpoint
    #[serde(default, deserialize_with = "or_default")]
    pub object: String,
    /// Creation time (unix seconds)
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Completion time (unix seconds)
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    /// Model that produced the response
    #[serde(default, deserialize_with = "or_default")]
    pub model: String,
    /// Ordered output items
    #[serde(default, deserialize_with = "or_default")]
    pub output: Vec<OutputItem>,
    /// Token accounting
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub usage: Option<AgentUsage>,
    /// Response status (`completed`, `incomplete`, ...)
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Inline error object, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    /// Fields this crate does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of [`AgentResponse::output`]
///
/// Deserialization never fails: an item without a string `type`, with an
/// unknown `type`, or whose payload does not fit becomes
/// [`OutputItem::Unrecognized`].
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// Assistant message carrying text and citations
    Message(MessageItem),
    /// Tool invocation issued by the model
    ToolUse(ToolItem),
    /// Result of a tool invocation
    ToolResult(ToolItem),
    /// Server-side custom tool call (e.g., X search)
    CustomToolCall(ToolItem),
    /// Item type this crate does not know
    Unrecognized,
}

impl OutputItem {
    fn from_value(mut value: Value) -> Self {
        let Some(Value::String(kind)) = value.as_object_mut().and_then(|o| o.remove("type")) else {
            return Self::Unrecognized;
        };
        let parsed = match kind.as_str() {
            "message" => serde_json::from_value(value).map(Self::Message),
            "tool_use" => serde_json::from_value(value).map(Self::ToolUse),
            "tool_result" => serde_json::from_value(value).map(Self::ToolResult),
            "custom_tool_call" => serde_json::from_value(value).map(Self::CustomToolCall),
            _ => return Self::Unrecognized,
        };
        parsed.unwrap_or(Self::Unrecognized)
    }
}

impl<'de> Deserialize<'de> for OutputItem {
    fn deserialize<D>(de: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(de).map(Self::from_value)
    }
}

/// Payload of a `message` output item
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageItem {
    /// Item id
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Author role
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Text or content blocks
    #[serde(default)]
    pub content: MessageContent,
    /// Item status
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Payload of tool-related output items; kept verbatim
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolItem {
    /// All fields except `type`
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Message content: a bare string or ordered content blocks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text
    Text(String),
    /// Typed content blocks
    Blocks(Vec<ContentBlock>),
    /// Anything else (`null`, a number, malformed blocks); contributes no text
    Other(Value),
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Blocks(Vec::new())
    }
}

/// Block type carrying generated text
pub const OUTPUT_TEXT: &str = "output_text";
/// Annotation type carrying a citation URL
pub const URL_CITATION: &str = "url_citation";

/// One content block of a message
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContentBlock {
    /// Block type (`output_text`, ...)
    #[serde(rename = "type", default, deserialize_with = "or_default")]
    pub kind: String,
    /// Block text
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Citation-bearing annotations
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<Annotation>>,
    /// Fields this crate does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentBlock {
    /// `output_text` block
    #[must_use]
    pub fn output_text(text: impl Into<String>) -> Self {
        Self {
            kind: OUTPUT_TEXT.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Append an annotation
    #[must_use]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.get_or_insert_with(Vec::new).push(annotation);
        self
    }
}

/// Annotation attached to a content block
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    /// Annotation type (`url_citation`, ...)
    #[serde(rename = "type", default, deserialize_with = "or_default")]
    pub kind: String,
    /// Cited URL
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Title of the cited page
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Start offset of the cited span
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u64>,
    /// End offset of the cited span
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub end_index: Option<u64>,
    /// Fields this crate does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Annotation {
    /// `url_citation` annotation
    #[must_use]
    pub fn url_citation(url: impl Into<String>) -> Self {
        Self {
            kind: URL_CITATION.into(),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// URL when this annotation is a citation
    #[must_use]
    pub fn citation_url(&self) -> Option<&str> {
        if self.kind == URL_CITATION {
            self.url.as_deref()
        } else {
            None
        }
    }
}

/// Upstream token accounting
///
/// Counters that are missing, `null` or not a non-negative integer read as
/// `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentUsage {
    /// Prompt tokens
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    /// Generated tokens
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    /// Total as reported upstream
    #[serde(default, deserialize_with = "or_none", skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    /// Detail breakdowns this crate does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AgentUsage {
    /// Usage with all three counters set
    #[must_use]
    pub fn new(input_tokens: u64, output_tokens: u64, total_tokens: u64) -> Self {
        Self {
            input_tokens: Some(input_tokens),
            output_tokens: Some(output_tokens),
            total_tokens: Some(total_tokens),
            extra: Map::new(),
        }
    }
}

// A value of the wrong shape reads as absent
fn or_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(serde_json::from_value(Value::deserialize(de)?).ok())
}

fn or_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(serde_json::from_value(Value::deserialize(de)?).unwrap_or_default())
}
