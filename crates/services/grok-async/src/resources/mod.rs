//! API resource implementations for the Grok client

/// Agent responses API resource
pub mod responses;

pub use responses::Responses;
