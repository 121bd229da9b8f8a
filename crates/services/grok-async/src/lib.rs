#![deny(warnings)]
#![deny(clippy::all)]
#![deny(missing_docs)]

//! Async xAI Grok client: X-search prompt builders, response normalization,
//! fixed-step retries and a single typed error.

/// HTTP client implementation
pub mod client;
/// Configuration types for the client
pub mod config;
/// Error types
pub mod error;
/// Agent response to chat response conversion
pub mod normalize;
/// High-level search, topic, trend and chat operations
pub mod operations;
/// Request builders for the high-level operations
pub mod prompts;
/// API resource implementations
pub mod resources;
/// Retry logic utilities
pub mod retry;
/// Test support utilities (for use in tests)
#[doc(hidden)]
pub mod test_support;
/// Request and response types
pub mod types;
/// Structural checks for requests and responses
pub mod validation;

pub use crate::client::Client;
pub use crate::config::GrokConfig;
pub use crate::error::{ApiErrorObject, ErrorPayload, GrokError};
pub use crate::retry::RetryPolicy;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::operations::{ChatParams, SearchParams, TopicParams, TrendParams};
    pub use crate::types::*;
    pub use crate::{Client, GrokConfig, GrokError};
}
