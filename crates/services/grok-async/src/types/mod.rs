//! Request and response types for the xAI responses API

/// Upstream agent request/response wire types
pub mod agent;
/// Canonical chat-style response returned to callers
pub mod chat;
/// Shared enums used by the prompt builders
pub mod common;

pub use agent::{
    AgentRequest, AgentResponse, AgentUsage, Annotation, ChatMessage, ContentBlock,
    MessageContent, MessageItem, OutputItem, Role, SearchToolDirective, SearchToolKind, ToolItem,
};
pub use chat::{AssistantMessage, ChatResponse, ChatUsage, Choice};
pub use common::{AnalysisType, TimeWindow};
