//! Pure request builders for the four high-level operations.
//!
//! Each builder turns caller parameters plus client defaults into one
//! [`AgentRequest`] with a single instruction message. `today` is passed in so
//! date ranges are deterministic under test.

use chrono::NaiveDate;

use crate::operations::{ChatParams, SearchParams, TopicParams, TrendParams};
use crate::types::{AgentRequest, AnalysisType, SearchToolDirective, TimeWindow};

/// Temperature for structured extraction (search, topic analysis)
pub const ANALYSIS_TEMPERATURE: f64 = 0.3;
/// Default temperature for open chat
pub const CHAT_TEMPERATURE: f64 = 0.7;
/// Aspects used when a topic analysis names none
pub const DEFAULT_ASPECTS: [&str; 4] = ["sentiment", "key_voices", "themes", "controversies"];

/// Client-level defaults consumed by the builders
#[derive(Debug, Clone, Copy)]
pub struct PromptDefaults<'a> {
    /// Model written into every request
    pub model: &'a str,
    /// Result limit used when the caller gives none
    pub limit: u32,
}

const SENTIMENT_TEMPLATE: &str = "\
Search X for posts about \"{query}\" from {window}. Analyze up to {limit} of the most relevant posts \
and focus on sentiment: how people feel, how strongly, and why.

Respond with JSON only, using this shape:
{
  \"summary\": string,
  \"post_count\": number,
  \"themes\": [],
  \"sentiment\": {\"overall\": \"positive\"|\"negative\"|\"neutral\"|\"mixed\", \"score\": number between -1 and 1, \"breakdown\": {\"positive\": number, \"neutral\": number, \"negative\": number}},
  \"notable_points\": [string],
  \"time_window\": \"{window_tag}\",
  \"data_freshness\": string
}";

const THEMES_TEMPLATE: &str = "\
Search X for posts about \"{query}\" from {window}. Analyze up to {limit} of the most relevant posts \
and focus on themes: the recurring topics, arguments and narratives.

Respond with JSON only, using this shape:
{
  \"summary\": string,
  \"post_count\": number,
  \"themes\": [{\"name\": string, \"description\": string, \"prevalence\": \"high\"|\"medium\"|\"low\"}],
  \"sentiment\": null,
  \"notable_points\": [string],
  \"time_window\": \"{window_tag}\",
  \"data_freshness\": string
}";

const COMBINED_TEMPLATE: &str = "\
Search X for posts about \"{query}\" from {window}. Analyze up to {limit} of the most relevant posts \
for both sentiment and themes.

Respond with JSON only, using this shape:
{
  \"summary\": string,
  \"post_count\": number,
  \"themes\": [{\"name\": string, \"description\": string, \"prevalence\": \"high\"|\"medium\"|\"low\"}],
  \"sentiment\": {\"overall\": \"positive\"|\"negative\"|\"neutral\"|\"mixed\", \"score\": number between -1 and 1, \"breakdown\": {\"positive\": number, \"neutral\": number, \"negative\": number}},
  \"notable_points\": [string],
  \"time_window\": \"{window_tag}\",
  \"data_freshness\": string
}";

const TOPIC_TEMPLATE: &str = "\
Search X for discussion of \"{topic}\" from {window} and analyze it along these aspects: {aspects}.

Respond with JSON only, using this shape:
{
  \"topic\": \"{topic}\",
  \"summary\": string,
  \"aspects\": {\"<aspect name>\": {\"findings\": string, \"evidence\": [string], \"confidence\": \"high\"|\"medium\"|\"low\"}},
  \"post_count\": number,
  \"time_window\": \"{window_tag}\",
  \"data_freshness\": string
}";

const TRENDS_TEMPLATE: &str = "\
Search X for what is trending right now{category}. Identify the top {limit} trending topics.

Respond with JSON only, using this shape:
{
  \"trends\": [{\"topic\": string, \"description\": string, \"volume\": \"high\"|\"medium\"|\"low\", \"sentiment\": \"positive\"|\"negative\"|\"neutral\"|\"mixed\", \"key_themes\": [string]}],
  \"as_of\": \"{today}\"
}";

/// Replaces each `{key}` of `template` in one pass.
///
/// Substituted values are never rescanned, so caller text containing
/// `{limit}` or similar reaches the model verbatim. Braces that do not form
/// a known placeholder are copied as-is.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let hit = vars.iter().find_map(|(key, value)| {
            let after = tail.strip_prefix('{')?.strip_prefix(*key)?.strip_prefix('}')?;
            Some((*value, after))
        });
        match hit {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Directive whose range is derived from `window`
#[must_use]
pub fn windowed_search(window: TimeWindow, today: NaiveDate) -> SearchToolDirective {
    let (from, to) = window.date_range(today);
    SearchToolDirective::between(from, to)
}

/// Builds the X post search request
#[must_use]
pub fn search_request(
    params: &SearchParams,
    defaults: &PromptDefaults<'_>,
    today: NaiveDate,
) -> AgentRequest {
    let template = match params.analysis_type {
        AnalysisType::Sentiment => SENTIMENT_TEMPLATE,
        AnalysisType::Themes => THEMES_TEMPLATE,
        AnalysisType::Both => COMBINED_TEMPLATE,
    };
    let limit = params.limit.unwrap_or(defaults.limit);
    let limit = limit.to_string();
    let instruction = fill(
        template,
        &[
            ("query", params.query.trim()),
            ("window", params.time_window.describe()),
            ("window_tag", params.time_window.as_str()),
            ("limit", limit.as_str()),
        ],
    );

    AgentRequest::new(defaults.model, instruction)
        .with_search(windowed_search(params.time_window, today))
        .with_temperature(ANALYSIS_TEMPERATURE)
}

/// Builds the per-aspect topic analysis request
#[must_use]
pub fn topic_request(
    params: &TopicParams,
    defaults: &PromptDefaults<'_>,
    today: NaiveDate,
) -> AgentRequest {
    let aspects: Vec<&str> = params
        .aspects
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();
    let aspects = if aspects.is_empty() {
        DEFAULT_ASPECTS.join(", ")
    } else {
        aspects.join(", ")
    };

    let instruction = fill(
        TOPIC_TEMPLATE,
        &[
            ("topic", params.topic.trim()),
            ("window", params.time_window.describe()),
            ("window_tag", params.time_window.as_str()),
            ("aspects", aspects.as_str()),
        ],
    );

    AgentRequest::new(defaults.model, instruction)
        .with_search(windowed_search(params.time_window, today))
        .with_temperature(ANALYSIS_TEMPERATURE)
}

/// Builds the trend listing request; always bounded to `today`
#[must_use]
pub fn trends_request(
    params: &TrendParams,
    defaults: &PromptDefaults<'_>,
    today: NaiveDate,
) -> AgentRequest {
    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| format!(" in the {c} category"))
        .unwrap_or_default();
    let limit = params.limit.unwrap_or(defaults.limit);

    let limit = limit.to_string();
    let today_str = today.format("%Y-%m-%d").to_string();
    let instruction = fill(
        TRENDS_TEMPLATE,
        &[("category", category.as_str()), ("limit", limit.as_str()), ("today", today_str.as_str())],
    );

    AgentRequest::new(defaults.model, instruction)
        .with_search(SearchToolDirective::between(today, today))
}

/// Builds an open chat request; `tools` is absent when search is off
#[must_use]
pub fn chat_request(params: &ChatParams, defaults: &PromptDefaults<'_>) -> AgentRequest {
    let mut req = AgentRequest::new(defaults.model, params.prompt.clone())
        .with_temperature(params.temperature.unwrap_or(CHAT_TEMPERATURE));
    if params.search {
        req = req.with_search(SearchToolDirective::unbounded());
    }
    req.max_tokens = params.max_tokens;
    req
}
