#![deny(warnings)]
#![deny(clippy::all)]
#![deny(missing_docs)]

//! Grok-backed X search tools, served over MCP or run from the command line.

/// Tracing initialisation with secret redaction
pub mod logging;
/// MCP server handler
pub mod mcp;
/// Tool implementations and dispatch
pub mod tools;
/// Tool inputs and result envelopes
pub mod types;

pub use mcp::GrokServer;
pub use tools::GrokTools;
pub use types::{ToolFailure, ToolOutput};
