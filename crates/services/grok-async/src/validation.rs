//! Structural checks for requests and responses crossing the API boundary.
//!
//! Serde handles field presence and primitive shapes; [`Validate`] adds the
//! rules serde cannot express (non-empty sequences, numeric ranges, tags).

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{
    AgentRequest, AgentResponse, ChatResponse, MessageContent, OutputItem, Role,
};

/// Object tag expected on agent responses
pub const RESPONSE_OBJECT: &str = "response";

/// One violated constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// JSON-path-like location (`output[2].content`)
    pub path: String,
    /// What the value failed to satisfy
    pub constraint: String,
}

/// Non-empty set of violated constraints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    /// Issues in discovery order
    pub issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    /// Single-issue error
    #[must_use]
    pub fn single(path: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            issues: vec![ValidationIssue {
                path: path.into(),
                constraint: constraint.into(),
            }],
        }
    }

    /// True when some issue sits at `path`
    #[must_use]
    pub fn has_path(&self, path: &str) -> bool {
        self.issues.iter().any(|i| i.path == path)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", issue.path, issue.constraint)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Types with rules beyond their serde shape
pub trait Validate {
    /// Checks every rule and reports all violations at once.
    ///
    /// # Errors
    ///
    /// Returns the collected issues when any rule fails.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

#[derive(Default)]
struct Collector {
    issues: Vec<ValidationIssue>,
}

impl Collector {
    fn require(&mut self, ok: bool, path: impl Into<String>, constraint: &str) {
        if !ok {
            self.issues.push(ValidationIssue {
                path: path.into(),
                constraint: constraint.to_string(),
            });
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                issues: self.issues,
            })
        }
    }
}

impl Validate for AgentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut c = Collector::default();
        c.require(!self.model.trim().is_empty(), "model", "must not be blank");
        c.require(!self.input.is_empty(), "input", "must contain at least one message");

        if let Some(t) = self.temperature {
            c.require(
                t.is_finite() && (0.0..=2.0).contains(&t),
                "temperature",
                "must be within [0, 2]",
            );
        }
        if let Some(m) = self.max_tokens {
            c.require(m > 0, "max_tokens", "must be positive");
        }
        if let Some(tools) = &self.tools {
            c.require(!tools.is_empty(), "tools", "must be omitted rather than empty");
            for (i, tool) in tools.iter().enumerate() {
                if let (Some(from), Some(to)) = (tool.from_date, tool.to_date) {
                    c.require(
                        from <= to,
                        format!("tools[{i}].from_date"),
                        "must not be after to_date",
                    );
                }
            }
        }
        c.finish()
    }
}

impl Validate for AgentResponse {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut c = Collector::default();
        c.require(!self.id.is_empty(), "id", "must be present");
        c.require(
            self.object == RESPONSE_OBJECT,
            "object",
            "must be the literal \"response\"",
        );
        c.require(!self.model.is_empty(), "model", "must be present");
        c.require(!self.output.is_empty(), "output", "must contain at least one item");

        for (i, item) in self.output.iter().enumerate() {
            match item {
                OutputItem::Message(msg) => {
                    if let MessageContent::Blocks(blocks) = &msg.content {
                        for (j, block) in blocks.iter().enumerate() {
                            c.require(
                                !block.kind.is_empty(),
                                format!("output[{i}].content[{j}].type"),
                                "must be present",
                            );
                            for (k, ann) in block.annotations.iter().flatten().enumerate() {
                                c.require(
                                    !ann.kind.is_empty(),
                                    format!("output[{i}].content[{j}].annotations[{k}].type"),
                                    "must be present",
                                );
                            }
                        }
                    }
                    c.require(
                        !matches!(msg.content, MessageContent::Other(_)),
                        format!("output[{i}].content"),
                        "must be a string or an array of content blocks",
                    );
                }
                OutputItem::ToolUse(_) | OutputItem::ToolResult(_) | OutputItem::CustomToolCall(_) => {}
                OutputItem::Unrecognized => c.require(
                    false,
                    format!("output[{i}].type"),
                    "must be one of message, tool_use, tool_result, custom_tool_call",
                ),
            }
        }
        if let Some(usage) = &self.usage {
            for (name, counter) in [
                ("input_tokens", usage.input_tokens),
                ("output_tokens", usage.output_tokens),
                ("total_tokens", usage.total_tokens),
            ] {
                c.require(
                    counter.is_some(),
                    format!("usage.{name}"),
                    "must be a non-negative integer",
                );
            }
        }
        c.finish()
    }
}

impl Validate for ChatResponse {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut c = Collector::default();
        c.require(!self.choices.is_empty(), "choices", "must contain at least one choice");

        if let Some(first) = self.choices.first() {
            c.require(first.index == 0, "choices[0].index", "must be 0");
        }
        for (i, choice) in self.choices.iter().enumerate() {
            c.require(
                choice.message.role == Role::Assistant,
                format!("choices[{i}].message.role"),
                "must be assistant",
            );
        }
        if let Some(usage) = &self.usage {
            c.require(
                usage.total_tokens == usage.prompt_tokens.saturating_add(usage.completion_tokens),
                "usage.total_tokens",
                "must equal prompt_tokens + completion_tokens",
            );
        }
        if let Some(citations) = &self.citations {
            c.require(!citations.is_empty(), "citations", "must be omitted rather than empty");
            for (i, url) in citations.iter().enumerate() {
                c.require(!url.trim().is_empty(), format!("citations[{i}]"), "must not be blank");
            }
        }
        c.finish()
    }
}

/// Decodes an arbitrary JSON value as `T` and applies its [`Validate`] rules.
///
/// # Errors
///
/// Returns a shape error at path `$` when serde rejects the value, or the
/// rule violations otherwise.
pub fn check<T>(value: Value) -> Result<T, ValidationErrors>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T =
        serde_json::from_value(value).map_err(|e| ValidationErrors::single("$", e.to_string()))?;
    parsed.validate()?;
    Ok(parsed)
}
