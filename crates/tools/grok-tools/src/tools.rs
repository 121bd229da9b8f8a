//! The four Grok tools and name-based dispatch.
//!
//! Each tool delegates to the matching operation on [`grok_async::Client`] and
//! wraps the result in a [`ToolOutput`] or [`ToolFailure`].

use std::sync::Arc;

use grok_async::operations::{ChatParams, SearchParams, TopicParams, TrendParams};
use grok_async::{Client, GrokError};
use schemars::{JsonSchema, Schema, schema_for};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::{
    AnalyzeTopicInput, ChatInput, DetectTrendsInput, SearchPostsInput, ToolFailure, ToolOutput,
};

/// Name of the X post search tool
pub const SEARCH_POSTS: &str = "grok_search_posts";
/// Name of the topic analysis tool
pub const ANALYZE_TOPIC: &str = "grok_analyze_topic";
/// Name of the trend detection tool
pub const DETECT_TRENDS: &str = "grok_detect_trends";
/// Name of the open chat tool
pub const CHAT: &str = "grok_chat";

/// Static description of one tool
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    /// Tool name
    pub name: &'static str,
    /// Description shown to the caller
    pub description: &'static str,
    input_schema: fn() -> Schema,
}

impl ToolSpec {
    /// JSON schema of the tool's arguments
    pub fn input_schema(&self) -> Schema {
        (self.input_schema)()
    }
}

fn schema_of<T: JsonSchema>() -> Schema {
    schema_for!(T)
}

/// Every tool, in listing order
pub const TOOL_SPECS: [ToolSpec; 4] = [
    ToolSpec {
        name: SEARCH_POSTS,
        description: "Search recent X posts about a query and analyze their sentiment and/or themes. \
                      Returns a JSON summary with post count, themes, sentiment and notable points, \
                      plus citations to the posts used.",
        input_schema: schema_of::<SearchPostsInput>,
    },
    ToolSpec {
        name: ANALYZE_TOPIC,
        description: "Analyze how a topic is being discussed on X along specific aspects \
                      (e.g. sentiment, key_voices, themes, controversies).",
        input_schema: schema_of::<AnalyzeTopicInput>,
    },
    ToolSpec {
        name: DETECT_TRENDS,
        description: "List what is trending on X today, optionally within a category, with volume, \
                      sentiment and key themes per trend.",
        input_schema: schema_of::<DetectTrendsInput>,
    },
    ToolSpec {
        name: CHAT,
        description: "Ask Grok a free-form question. Set search=true to ground the answer in live X posts.",
        input_schema: schema_of::<ChatInput>,
    },
];

/// Entry point for the Grok tools; cheap to clone.
#[derive(Clone)]
pub struct GrokTools {
    client: Arc<Client>,
}

impl GrokTools {
    /// Wraps a constructed client
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Shares an existing client
    pub const fn from_shared(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Searches X posts and analyzes sentiment/themes
    pub async fn search_posts(&self, input: SearchPostsInput) -> Result<ToolOutput, ToolFailure> {
        let params = SearchParams::from(input);
        let resp = self
            .client
            .search_posts(params)
            .await
            .map_err(|e| fail(SEARCH_POSTS, &e))?;
        Ok(ToolOutput::from_response(SEARCH_POSTS, resp, true))
    }

    /// Analyzes a topic along the requested aspects
    pub async fn analyze_topic(&self, input: AnalyzeTopicInput) -> Result<ToolOutput, ToolFailure> {
        let params = TopicParams::from(input);
        let resp = self
            .client
            .analyze_topic(params)
            .await
            .map_err(|e| fail(ANALYZE_TOPIC, &e))?;
        Ok(ToolOutput::from_response(ANALYZE_TOPIC, resp, true))
    }

    /// Lists today's trends
    pub async fn detect_trends(&self, input: DetectTrendsInput) -> Result<ToolOutput, ToolFailure> {
        let params = TrendParams::from(input);
        let resp = self
            .client
            .detect_trends(params)
            .await
            .map_err(|e| fail(DETECT_TRENDS, &e))?;
        Ok(ToolOutput::from_response(DETECT_TRENDS, resp, true))
    }

    /// Free-form chat, optionally search-grounded
    pub async fn chat(&self, input: ChatInput) -> Result<ToolOutput, ToolFailure> {
        let params = ChatParams::from(input);
        let search = params.search;
        let resp = self
            .client
            .chat(params)
            .await
            .map_err(|e| fail(CHAT, &e))?;
        Ok(ToolOutput::from_response(CHAT, resp, search))
    }

    /// Runs the tool called `name` with JSON arguments
    pub async fn dispatch(&self, name: &str, args: Value) -> Result<ToolOutput, ToolFailure> {
        tracing::debug!(tool = name, "dispatching tool call");
        match name {
            SEARCH_POSTS => self.search_posts(parse_args(name, args)?).await,
            ANALYZE_TOPIC => self.analyze_topic(parse_args(name, args)?).await,
            DETECT_TRENDS => self.detect_trends(parse_args(name, args)?).await,
            CHAT => self.chat(parse_args(name, args)?).await,
            other => Err(ToolFailure::unknown_tool(other)),
        }
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, ToolFailure> {
    // Tools without required fields accept a missing arguments object
    let args = if args.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| ToolFailure::invalid_arguments(tool, &e))
}

fn fail(tool: &str, err: &GrokError) -> ToolFailure {
    tracing::warn!(tool, status = err.status(), "tool call failed: {err}");
    ToolFailure::from_error(tool, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FailureKind;
    use grok_async::GrokConfig;
    use serde_json::json;

    fn offline_tools() -> GrokTools {
        let config = GrokConfig::new()
            .with_api_base("http://127.0.0.1:1")
            .with_api_key("xai-test");
        GrokTools::new(Client::new(config).unwrap())
    }

    #[test]
    fn specs_are_unique_and_schemas_are_objects() {
        let mut names: Vec<_> = TOOL_SPECS.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 4);

        for spec in TOOL_SPECS {
            let schema = serde_json::to_value(spec.input_schema()).unwrap();
            assert_eq!(schema["type"], "object", "{} schema", spec.name);
        }
    }

    #[test]
    fn search_schema_requires_query() {
        let schema = serde_json::to_value(TOOL_SPECS[0].input_schema()).unwrap();
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "query"));
        assert!(schema["properties"].get("time_window").is_some());
    }

    #[tokio::test]
    async fn unknown_tool_is_reported() {
        let err = offline_tools()
            .dispatch("grok_weather", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::UnknownTool);
        assert_eq!(err.status, 0);
    }

    #[tokio::test]
    async fn bad_arguments_never_reach_the_client() {
        let err = offline_tools()
            .dispatch(SEARCH_POSTS, json!({"query": 42}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidArguments);
        assert!(err.message.starts_with("Invalid arguments"));
    }

    #[tokio::test]
    async fn blank_prompt_is_a_validation_failure() {
        let err = offline_tools()
            .dispatch(CHAT, json!({"prompt": "  "}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Validation);
        assert_eq!(err.tool, CHAT);
    }
}
