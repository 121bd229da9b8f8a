//! High-level operations: X post search, topic analysis, trend detection and chat.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::config::Config;
use crate::error::GrokError;
use crate::prompts::{self, PromptDefaults};
use crate::types::{AnalysisType, ChatResponse, TimeWindow};
use crate::validation::ValidationErrors;

/// Parameters for [`Client::search_posts`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchParams {
    /// Search query
    pub query: String,
    /// Recency bound
    #[serde(default)]
    pub time_window: TimeWindow,
    /// What to extract
    #[serde(default)]
    pub analysis_type: AnalysisType,
    /// Posts to analyze; client default when absent
    #[serde(default)]
    pub limit: Option<u32>,
}

impl SearchParams {
    /// Params with default window (`4hr`) and analysis (`both`)
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Set the time window
    #[must_use]
    pub const fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = window;
        self
    }

    /// Set the analysis type
    #[must_use]
    pub const fn with_analysis(mut self, analysis: AnalysisType) -> Self {
        self.analysis_type = analysis;
        self
    }

    /// Set the post limit
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Parameters for [`Client::analyze_topic`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicParams {
    /// Topic to analyze
    pub topic: String,
    /// Aspect names; built-in defaults when empty
    #[serde(default)]
    pub aspects: Vec<String>,
    /// Recency bound
    #[serde(default)]
    pub time_window: TimeWindow,
}

impl TopicParams {
    /// Params with default aspects and window
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }
}

/// Parameters for [`Client::detect_trends`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendParams {
    /// Optional category filter
    #[serde(default)]
    pub category: Option<String>,
    /// Trends to list; client default when absent
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Parameters for [`Client::chat`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatParams {
    /// Free-text prompt
    pub prompt: String,
    /// Enable live X search
    #[serde(default)]
    pub search: bool,
    /// Temperature, 0.7 when absent
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Token cap
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl ChatParams {
    /// Params without search
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Toggle search
    #[must_use]
    pub const fn with_search(mut self, search: bool) -> Self {
        self.search = search;
        self
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

fn require_text(field: &str, value: &str) -> Result<(), GrokError> {
    if value.trim().is_empty() {
        return Err(ValidationErrors::single(field, "must not be blank").into());
    }
    Ok(())
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl<C: Config> Client<C> {
    fn prompt_defaults(&self) -> PromptDefaults<'_> {
        PromptDefaults {
            model: self.config().model(),
            limit: self.config().default_limit(),
        }
    }

    /// Searches recent X posts and analyzes sentiment and/or themes.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank query, or when the request fails after retries.
    pub async fn search_posts(&self, params: SearchParams) -> Result<ChatResponse, GrokError> {
        require_text("query", &params.query)?;
        let req = prompts::search_request(&params, &self.prompt_defaults(), today());
        tracing::debug!(
            query = %params.query,
            window = %params.time_window,
            analysis = %params.analysis_type,
            "search_posts"
        );
        self.responses().create(req).await
    }

    /// Analyzes X discussion of a topic along caller-chosen aspects.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank topic, or when the request fails after retries.
    pub async fn analyze_topic(&self, params: TopicParams) -> Result<ChatResponse, GrokError> {
        require_text("topic", &params.topic)?;
        let req = prompts::topic_request(&params, &self.prompt_defaults(), today());
        tracing::debug!(topic = %params.topic, aspects = params.aspects.len(), "analyze_topic");
        self.responses().create(req).await
    }

    /// Lists what is trending on X today.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails after retries.
    pub async fn detect_trends(&self, params: TrendParams) -> Result<ChatResponse, GrokError> {
        let req = prompts::trends_request(&params, &self.prompt_defaults(), today());
        tracing::debug!(category = ?params.category, "detect_trends");
        self.responses().create(req).await
    }

    /// Free-form chat, optionally grounded in live X search.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank prompt, an out-of-range temperature, or
    /// when the request fails after retries.
    pub async fn chat(&self, params: ChatParams) -> Result<ChatResponse, GrokError> {
        require_text("prompt", &params.prompt)?;
        let req = prompts::chat_request(&params, &self.prompt_defaults());
        tracing::debug!(search = params.search, "chat");
        self.responses().create(req).await
    }
}
