//! MCP server exposing the Grok tools over rmcp.

use std::sync::Arc;

use rmcp::model as m;
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};
use serde_json::Value;

use crate::tools::{GrokTools, TOOL_SPECS};
use crate::types::ToolFailure;

const SERVER_INSTRUCTIONS: &str = "Live X (Twitter) intelligence through xAI Grok. \
Use grok_search_posts for sentiment/themes about a query, grok_analyze_topic for a structured \
breakdown of a topic, grok_detect_trends for what is trending today, and grok_chat for \
free-form questions (set search=true for answers grounded in live posts).";

/// MCP server handler backed by [`GrokTools`].
pub struct GrokServer {
    tools: GrokTools,
    name: String,
    version: String,
}

impl GrokServer {
    /// Create a server around the given tools.
    pub fn new(tools: GrokTools) -> Self {
        Self {
            tools,
            name: "grok-tools".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the advertised server name and version.
    #[must_use]
    pub fn with_info(mut self, name: &str, version: &str) -> Self {
        self.name = name.to_string();
        self.version = version.to_string();
        self
    }

    /// Tool descriptors with JSON-schema inputs.
    pub fn tool_list(&self) -> Vec<m::Tool> {
        TOOL_SPECS
            .iter()
            .map(|spec| {
                let schema = serde_json::to_value(spec.input_schema())
                    .unwrap_or_else(|_| serde_json::json!({"type": "object"}));
                m::Tool {
                    name: spec.name.into(),
                    title: Some(spec.name.to_string()),
                    description: Some(spec.description.into()),
                    input_schema: Arc::new(schema.as_object().cloned().unwrap_or_default()),
                    annotations: None,
                    output_schema: None,
                    icons: None,
                    meta: None,
                }
            })
            .collect()
    }

    /// Runs one tool call; failures come back as error-flagged results.
    pub async fn call(&self, name: &str, arguments: Option<m::JsonObject>) -> m::CallToolResult {
        let args = arguments.map_or(Value::Null, Value::Object);
        match self.tools.dispatch(name, args).await {
            Ok(output) => match serde_json::to_string_pretty(&output) {
                Ok(text) => m::CallToolResult::success(vec![m::Content::text(text)]),
                Err(e) => error_result(&format!("Failed to serialize tool output: {e}")),
            },
            Err(failure) => failure_result(&failure),
        }
    }
}

fn failure_result(failure: &ToolFailure) -> m::CallToolResult {
    match serde_json::to_string_pretty(failure) {
        Ok(text) => error_result(&text),
        Err(_) => error_result(&failure.to_string()),
    }
}

fn error_result(text: &str) -> m::CallToolResult {
    m::CallToolResult::error(vec![m::Content::text(text.to_string())])
}

// Allow manual_async_fn because the trait signature uses `impl Future` return types
#[allow(clippy::manual_async_fn)]
impl ServerHandler for GrokServer {
    fn get_info(&self) -> m::ServerInfo {
        m::ServerInfo {
            server_info: m::Implementation {
                name: self.name.clone(),
                title: Some(self.name.clone()),
                version: self.version.clone(),
                website_url: None,
                icons: None,
            },
            capabilities: m::ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _req: Option<m::PaginatedRequestParam>,
        _ctx: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::ListToolsResult, m::ErrorData>> + Send + '_
    {
        async move {
            Ok(m::ListToolsResult {
                tools: self.tool_list(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        req: m::CallToolRequestParam,
        _ctx: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::CallToolResult, m::ErrorData>> + Send + '_
    {
        async move { Ok(self.call(&req.name, req.arguments).await) }
    }
}
