//! Tool inputs and the envelopes returned to tool callers.

use grok_async::GrokError;
use grok_async::operations::{ChatParams, SearchParams, TopicParams, TrendParams};
use grok_async::types::{AnalysisType, ChatResponse, ChatUsage, TimeWindow};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Inputs
// ============================================================================

/// Input for the `grok_search_posts` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchPostsInput {
    /// Search query: keywords, hashtags, cashtags or @handles
    pub query: String,
    /// How far back to look: 15min, 1hr, 4hr (default), 24hr or 7d
    #[serde(default)]
    pub time_window: TimeWindow,
    /// What to extract: sentiment, themes or both (default)
    #[serde(default)]
    pub analysis_type: AnalysisType,
    /// Maximum posts to analyze (server default when omitted)
    #[serde(default)]
    pub limit: Option<u32>,
}

impl From<SearchPostsInput> for SearchParams {
    fn from(input: SearchPostsInput) -> Self {
        Self {
            query: input.query,
            time_window: input.time_window,
            analysis_type: input.analysis_type,
            limit: input.limit,
        }
    }
}

/// Input for the `grok_analyze_topic` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AnalyzeTopicInput {
    /// Topic to analyze
    pub topic: String,
    /// Aspects to cover (default: sentiment, key_voices, themes, controversies)
    #[serde(default)]
    pub aspects: Option<Vec<String>>,
    /// How far back to look: 15min, 1hr, 4hr (default), 24hr or 7d
    #[serde(default)]
    pub time_window: TimeWindow,
}

impl From<AnalyzeTopicInput> for TopicParams {
    fn from(input: AnalyzeTopicInput) -> Self {
        Self {
            topic: input.topic,
            aspects: input.aspects.unwrap_or_default(),
            time_window: input.time_window,
        }
    }
}

/// Input for the `grok_detect_trends` tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct DetectTrendsInput {
    /// Restrict trends to a category (e.g. technology, sports, politics)
    #[serde(default)]
    pub category: Option<String>,
    /// Number of trends to return (server default when omitted)
    #[serde(default)]
    pub limit: Option<u32>,
}

impl From<DetectTrendsInput> for TrendParams {
    fn from(input: DetectTrendsInput) -> Self {
        Self {
            category: input.category,
            limit: input.limit,
        }
    }
}

/// Input for the `grok_chat` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ChatInput {
    /// Prompt sent to Grok
    pub prompt: String,
    /// Ground the answer in live X search (default: false)
    #[serde(default)]
    pub search: bool,
    /// Sampling temperature between 0 and 2 (default: 0.7)
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Maximum tokens to generate
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl From<ChatInput> for ChatParams {
    fn from(input: ChatInput) -> Self {
        Self {
            prompt: input.prompt,
            search: input.search,
            temperature: input.temperature,
            max_tokens: input.max_tokens,
        }
    }
}

// ============================================================================
// Outputs
// ============================================================================

/// Successful tool result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolOutput {
    /// Generated text (usually the JSON document the prompt asked for)
    pub content: String,
    /// Source URLs in citation order
    #[serde(default)]
    pub citations: Vec<String>,
    /// Call metadata
    pub metadata: ToolMetadata,
}

/// Metadata attached to every [`ToolOutput`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolMetadata {
    /// Tool that produced the result
    pub tool: String,
    /// Model that answered
    pub model: String,
    /// Token usage, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ChatUsage>,
    /// Whether live X search was attached to the request
    pub search_enabled: bool,
    /// Why generation stopped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    /// Upstream response id
    pub response_id: String,
}

impl ToolOutput {
    /// Wraps a normalized response
    pub fn from_response(tool: &str, resp: ChatResponse, search_enabled: bool) -> Self {
        let finish_reason = resp.choices.first().and_then(|c| c.finish_reason.clone());
        let content = resp.content().to_string();
        Self {
            content,
            citations: resp.citations.unwrap_or_default(),
            metadata: ToolMetadata {
                tool: tool.to_string(),
                model: resp.model,
                usage: resp.usage,
                search_enabled,
                finish_reason,
                response_id: resp.id,
            },
        }
    }
}

/// Failure category reported to tool callers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing or unusable credentials
    Configuration,
    /// Upstream rejected the key (401/403)
    Authentication,
    /// Upstream returned an HTTP error
    Upstream,
    /// No HTTP response was received
    Network,
    /// Response body could not be decoded
    Decode,
    /// Request or response broke a structural rule
    Validation,
    /// Tool arguments did not match the input schema
    InvalidArguments,
    /// No tool with that name
    UnknownTool,
}

/// Error payload returned by a failed tool call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, thiserror::Error)]
#[error("{tool} failed ({status}): {message}")]
pub struct ToolFailure {
    /// Tool that failed
    pub tool: String,
    /// Failure category
    pub kind: FailureKind,
    /// Human-readable message
    pub message: String,
    /// HTTP status, 0 when no response was received
    pub status: u16,
    /// Whether retrying later may succeed
    pub retryable: bool,
    /// Raw upstream error payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ToolFailure {
    /// Classifies a client error
    pub fn from_error(tool: &str, err: &GrokError) -> Self {
        let kind = match err {
            GrokError::Config(_) => FailureKind::Configuration,
            GrokError::Api(_) if err.is_auth() => FailureKind::Authentication,
            GrokError::Api(_) => FailureKind::Upstream,
            GrokError::Reqwest(_) => FailureKind::Network,
            GrokError::Serde(_) => FailureKind::Decode,
            GrokError::Validation(_) => FailureKind::Validation,
        };
        let payload = err.to_payload();
        Self {
            tool: tool.to_string(),
            kind,
            message: payload.message,
            status: payload.status,
            retryable: err.is_retryable(),
            details: payload.response,
        }
    }

    /// Arguments that failed to deserialize
    pub fn invalid_arguments(tool: &str, err: &serde_json::Error) -> Self {
        Self {
            tool: tool.to_string(),
            kind: FailureKind::InvalidArguments,
            message: format!("Invalid arguments: {err}"),
            status: 0,
            retryable: false,
            details: None,
        }
    }

    /// Call to a name no tool answers to
    pub fn unknown_tool(name: &str) -> Self {
        Self {
            tool: name.to_string(),
            kind: FailureKind::UnknownTool,
            message: format!("Unknown tool '{name}'"),
            status: 0,
            retryable: false,
            details: None,
        }
    }
}

/// Human-readable rendering: the answer followed by its sources
pub fn render_text(resp: &ChatResponse) -> String {
    let mut out = resp.content().to_string();
    let citations = resp.citations();
    if !citations.is_empty() {
        out.push_str("\n\nSources:");
        for url in citations {
            out.push_str("\n- ");
            out.push_str(url);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use grok_async::ApiErrorObject;
    use grok_async::types::{AssistantMessage, Choice, Role};
    use serde_json::json;

    fn response(citations: Option<Vec<String>>) -> ChatResponse {
        ChatResponse {
            id: "resp_1".into(),
            object: "chat.completion".into(),
            created: 0,
            model: "grok-4-fast".into(),
            choices: vec![Choice {
                index: 0,
                message: AssistantMessage {
                    role: Role::Assistant,
                    content: "EVs are popular".into(),
                },
                finish_reason: Some("stop".into()),
            }],
            usage: Some(ChatUsage::new(10, 5)),
            citations,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn search_input_defaults() {
        let input: SearchPostsInput = serde_json::from_value(json!({"query": "rust"})).unwrap();
        let params = SearchParams::from(input);
        assert_eq!(params.time_window, TimeWindow::FourHours);
        assert_eq!(params.analysis_type, AnalysisType::Both);
        assert!(params.limit.is_none());
    }

    #[test]
    fn search_input_rejects_unknown_window() {
        let res = serde_json::from_value::<SearchPostsInput>(json!({
            "query": "rust",
            "time_window": "2hr"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn output_envelope_carries_metadata() {
        let out = ToolOutput::from_response(
            "grok_search_posts",
            response(Some(vec!["https://x.com/a/status/1".into()])),
            true,
        );
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["content"], "EVs are popular");
        assert_eq!(v["citations"][0], "https://x.com/a/status/1");
        assert_eq!(v["metadata"]["model"], "grok-4-fast");
        assert_eq!(v["metadata"]["usage"]["total_tokens"], 15);
        assert_eq!(v["metadata"]["search_enabled"], true);
        assert_eq!(v["metadata"]["finish_reason"], "stop");
    }

    #[test]
    fn failure_embeds_status_and_details() {
        let err = GrokError::Api(ApiErrorObject {
            status: 403,
            message: "forbidden".into(),
            error_type: None,
            code: None,
            raw: Some(json!({"error": {"message": "forbidden"}})),
        });
        let failure = ToolFailure::from_error("grok_chat", &err);
        assert_eq!(failure.kind, FailureKind::Authentication);
        assert_eq!(failure.status, 403);
        assert!(!failure.retryable);
        assert_eq!(failure.details.unwrap()["error"]["message"], "forbidden");
    }

    #[test]
    fn text_rendering_lists_sources() {
        assert_eq!(render_text(&response(None)), "EVs are popular");
        let text = render_text(&response(Some(vec![
            "https://x.com/a/status/1".into(),
            "https://x.com/b/status/2".into(),
        ])));
        assert_eq!(
            text,
            "EVs are popular\n\nSources:\n- https://x.com/a/status/1\n- https://x.com/b/status/2"
        );
    }
}
