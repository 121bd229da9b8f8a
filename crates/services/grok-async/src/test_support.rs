//! Helpers shared by unit and integration tests: scoped environment
//! overrides and canned upstream bodies.

use serde_json::{Value, json};

/// Restores an environment variable to its prior value on drop.
///
/// Pair with `#[serial(env)]`; the process environment is global.
pub struct EnvGuard {
    key: &'static str,
    prev: Option<String>,
}

impl EnvGuard {
    /// Sets `key` for the guard's lifetime.
    #[must_use]
    pub fn set(key: &'static str, val: &str) -> Self {
        let prev = std::env::var(key).ok();
        // SAFETY: callers serialize env access with #[serial(env)]
        unsafe { std::env::set_var(key, val) };
        Self { key, prev }
    }

    /// Unsets `key` for the guard's lifetime.
    #[must_use]
    pub fn remove(key: &'static str) -> Self {
        let prev = std::env::var(key).ok();
        // SAFETY: callers serialize env access with #[serial(env)]
        unsafe { std::env::remove_var(key) };
        Self { key, prev }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.prev {
            // SAFETY: same serialization as the constructor
            Some(v) => unsafe { std::env::set_var(self.key, v) },
            // SAFETY: same serialization as the constructor
            None => unsafe { std::env::remove_var(self.key) },
        }
    }
}

/// Agent-shaped success body: one assistant message carrying `text`, with a
/// `url_citation` annotation per entry of `citations`.
#[must_use]
pub fn agent_body(text: &str, citations: &[&str]) -> Value {
    let annotations: Vec<Value> = citations
        .iter()
        .map(|url| json!({"type": "url_citation", "url": url, "title": url}))
        .collect();
    json!({
        "id": "resp_test",
        "object": "response",
        "created_at": 1_735_689_600,
        "model": "grok-4-fast",
        "status": "completed",
        "output": [
            {"type": "custom_tool_call", "name": "x_search", "input": "{}"},
            {
                "type": "message",
                "id": "msg_test",
                "role": "assistant",
                "status": "completed",
                "content": [{"type": "output_text", "text": text, "annotations": annotations}]
            }
        ],
        "usage": {"input_tokens": 120, "output_tokens": 80, "total_tokens": 200}
    })
}

/// Upstream error envelope `{error:{message,type}}`
#[must_use]
pub fn error_body(message: &str, kind: &str) -> Value {
    json!({"error": {"message": message, "type": kind}})
}
