//! Converts upstream agent responses into [`ChatResponse`].
//!
//! [`normalize_at`] is total: any decodable [`AgentResponse`] yields a
//! response with exactly one choice, even when no text was produced.

use chrono::Utc;
use serde_json::{Map, Value};

use crate::error::{GrokError, map_deser};
use crate::types::chat::CHAT_COMPLETION_OBJECT;
use crate::types::{
    AgentResponse, AgentUsage, AssistantMessage, ChatResponse, ChatUsage, Choice, MessageContent,
    OutputItem, Role, agent::OUTPUT_TEXT,
};
use crate::validation::Validate;

/// Normalizes using the current time as the fallback `created` timestamp
#[must_use]
pub fn normalize(resp: AgentResponse) -> ChatResponse {
    normalize_at(resp, Utc::now().timestamp())
}

/// Normalizes with `now` as the fallback `created` timestamp
#[must_use]
pub fn normalize_at(resp: AgentResponse, now: i64) -> ChatResponse {
    let mut content = String::new();
    let mut citations: Vec<String> = Vec::new();

    for item in &resp.output {
        match item {
            OutputItem::Message(msg) => match &msg.content {
                MessageContent::Text(text) => content.push_str(text),
                MessageContent::Blocks(blocks) => {
                    for block in blocks {
                        if block.kind == OUTPUT_TEXT
                            && let Some(text) = &block.text
                        {
                            content.push_str(text);
                        }
                        citations.extend(
                            block
                                .annotations
                                .iter()
                                .flatten()
                                .filter_map(|a| a.citation_url())
                                .map(str::to_string),
                        );
                    }
                }
                MessageContent::Other(_) => {}
            },
            OutputItem::ToolUse(_)
            | OutputItem::ToolResult(_)
            | OutputItem::CustomToolCall(_)
            | OutputItem::Unrecognized => {}
        }
    }

    let finish_reason = match resp.status.as_deref() {
        Some("incomplete") => "length",
        _ => "stop",
    };

    ChatResponse {
        id: resp.id,
        object: CHAT_COMPLETION_OBJECT.to_string(),
        created: resp.created_at.unwrap_or(now),
        model: resp.model,
        choices: vec![Choice {
            index: 0,
            message: AssistantMessage {
                role: Role::Assistant,
                content,
            },
            finish_reason: Some(finish_reason.to_string()),
        }],
        usage: resp.usage.as_ref().map(remap_usage),
        citations: (!citations.is_empty()).then_some(citations),
        extra: Map::new(),
    }
}

fn remap_usage(usage: &AgentUsage) -> ChatUsage {
    let mapped = ChatUsage::new(
        usage.input_tokens.unwrap_or(0),
        usage.output_tokens.unwrap_or(0),
    );
    if let Some(upstream_total) = usage.total_tokens
        && upstream_total != mapped.total_tokens
    {
        tracing::debug!(
            upstream_total,
            derived_total = mapped.total_tokens,
            "upstream total_tokens differs from input + output; using the sum"
        );
    }
    mapped
}

/// Brings a chat-completion body from the legacy endpoint in line with
/// what [`normalize_at`] produces: derived usage total, absent rather than
/// empty citations, and a first choice at index 0.
#[must_use]
pub fn canonicalize_legacy(mut chat: ChatResponse) -> ChatResponse {
    if let Some(usage) = &mut chat.usage {
        *usage = ChatUsage::new(usage.prompt_tokens, usage.completion_tokens);
    }
    if chat.citations.as_ref().is_some_and(Vec::is_empty) {
        chat.citations = None;
    }
    if let Some(first) = chat.choices.first_mut() {
        first.index = 0;
    }
    chat
}

/// Decodes a successful upstream body into a validated [`ChatResponse`].
///
/// Agent-shaped bodies are checked leniently (violations are logged) and
/// normalized; fields of the wrong shape fall back to defaults instead of
/// failing the decode. Bodies already in chat-completion shape (legacy
/// endpoint) are canonicalized. Either way the result must pass strict
/// validation.
///
/// # Errors
///
/// Returns [`GrokError::Serde`] when the body is not JSON (or a legacy body
/// does not decode) and [`GrokError::Validation`] when the final response
/// breaks its invariants.
pub fn decode_upstream(body: &[u8]) -> Result<ChatResponse, GrokError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| map_deser(&e, body))?;

    let chat = if value.get("choices").is_some() {
        canonicalize_legacy(
            serde_json::from_value::<ChatResponse>(value).map_err(|e| map_deser(&e, body))?,
        )
    } else {
        let raw: AgentResponse =
            serde_json::from_value(value).map_err(|e| map_deser(&e, body))?;
        if let Err(issues) = raw.validate() {
            tracing::warn!(
                response_id = %raw.id,
                "Upstream response failed schema validation, normalizing anyway: {issues}"
            );
        }
        normalize(raw)
    };

    chat.validate().map_err(|issues| {
        tracing::error!("Normalized response failed validation: {issues}");
        GrokError::Validation(issues)
    })?;
    Ok(chat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Annotation, ContentBlock, MessageItem, ToolItem};
    use serde_json::json;

    fn message(blocks: Vec<ContentBlock>) -> OutputItem {
        OutputItem::Message(MessageItem {
            content: MessageContent::Blocks(blocks),
            ..MessageItem::default()
        })
    }

    #[test]
    fn concatenates_text_and_collects_citations_in_order() {
        let resp = AgentResponse {
            id: "resp_1".into(),
            object: "response".into(),
            created_at: Some(1_700_000_000),
            model: "grok-4".into(),
            output: vec![
                OutputItem::CustomToolCall(ToolItem::default()),
                message(vec![
                    ContentBlock::output_text("Hello ")
                        .with_annotation(Annotation::url_citation("https://x.com/a/status/1"))
                        .with_annotation(Annotation::url_citation("https://x.com/b/status/2")),
                    ContentBlock::output_text("world"),
                ]),
                message(vec![
                    ContentBlock::output_text("!")
                        .with_annotation(Annotation::url_citation("https://x.com/a/status/1")),
                ]),
            ],
            usage: Some(AgentUsage::new(10, 5, 15)),
            status: Some("completed".into()),
            ..AgentResponse::default()
        };

        let chat = normalize_at(resp, 42);
        assert_eq!(chat.content(), "Hello world!");
        assert_eq!(
            chat.citations(),
            [
                "https://x.com/a/status/1",
                "https://x.com/b/status/2",
                "https://x.com/a/status/1"
            ]
        );
        assert_eq!(chat.created, 1_700_000_000);
        assert_eq!(chat.object, "chat.completion");
        assert_eq!(chat.usage, Some(ChatUsage::new(10, 5)));
        assert_eq!(chat.choices[0].finish_reason.as_deref(), Some("stop"));
        assert!(chat.validate().is_ok());
    }

    #[test]
    fn non_text_blocks_and_foreign_annotations_are_skipped() {
        let mut refusal = ContentBlock::output_text("nope");
        refusal.kind = "refusal".into();
        let foreign = Annotation {
            kind: "file_citation".into(),
            url: Some("https://example.com/file".into()),
            ..Annotation::default()
        };
        let resp = AgentResponse {
            output: vec![message(vec![
                refusal,
                ContentBlock::output_text("kept").with_annotation(foreign),
            ])],
            ..AgentResponse::default()
        };

        let chat = normalize_at(resp, 7);
        assert_eq!(chat.content(), "kept");
        assert!(chat.citations.is_none());
    }

    #[test]
    fn plain_string_content_is_appended() {
        let resp = AgentResponse {
            output: vec![
                OutputItem::Message(MessageItem {
                    content: MessageContent::Text("first ".into()),
                    ..MessageItem::default()
                }),
                message(vec![ContentBlock::output_text("second")]),
            ],
            ..AgentResponse::default()
        };
        assert_eq!(normalize_at(resp, 0).content(), "first second");
    }

    #[test]
    fn tool_only_output_still_yields_one_choice() {
        let resp = AgentResponse {
            id: "r".into(),
            output: vec![
                OutputItem::ToolUse(ToolItem::default()),
                OutputItem::ToolResult(ToolItem::default()),
            ],
            status: Some("incomplete".into()),
            ..AgentResponse::default()
        };

        let chat = normalize_at(resp, 99);
        assert_eq!(chat.choices.len(), 1);
        assert_eq!(chat.content(), "");
        assert_eq!(chat.created, 99);
        assert!(chat.usage.is_none());
        assert!(chat.citations.is_none());
        assert_eq!(chat.choices[0].finish_reason.as_deref(), Some("length"));
        assert!(chat.validate().is_ok());
    }

    #[test]
    fn usage_total_is_derived_from_parts() {
        let resp = AgentResponse {
            usage: Some(AgentUsage::new(3, 4, 12)),
            ..AgentResponse::default()
        };
        let usage = normalize_at(resp, 0).usage.unwrap();
        assert_eq!(usage.total_tokens, 7);
    }

    #[test]
    fn decode_tolerates_schema_drift() {
        // Unknown item type and missing object tag: logged, not fatal
        let body = json!({
            "id": "resp_2",
            "model": "grok-4",
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "role": "assistant", "content": [
                    {"type": "output_text", "text": "fine", "annotations": null}
                ]}
            ]
        });
        let chat = decode_upstream(&serde_json::to_vec(&body).unwrap()).unwrap();
        assert_eq!(chat.content(), "fine");
    }

    #[test]
    fn decode_survives_null_and_malformed_fields() {
        let body = json!({
            "id": "resp_1",
            "object": "response",
            "model": "grok-4",
            "output": [
                {"type": "message", "content": null},
                {"role": "assistant", "content": "untyped"},
                {"type": "message", "content": [{"type": "output_text", "text": "hello"}]}
            ],
            "usage": {"input_tokens": 5, "output_tokens": null, "total_tokens": -1}
        });
        let chat = decode_upstream(&serde_json::to_vec(&body).unwrap()).unwrap();
        assert_eq!(chat.content(), "hello");
        assert_eq!(chat.usage, Some(ChatUsage::new(5, 0)));
    }

    #[test]
    fn decode_treats_null_output_as_empty() {
        let body = json!({"id": "resp_3", "object": "response", "model": "grok-4", "output": null, "usage": null});
        let chat = decode_upstream(&serde_json::to_vec(&body).unwrap()).unwrap();
        assert_eq!(chat.content(), "");
        assert!(chat.usage.is_none());
        assert_eq!(chat.choices.len(), 1);
    }

    #[test]
    fn decode_canonicalizes_legacy_usage_and_citations() {
        let body = json!({
            "id": "chatcmpl-10",
            "object": "chat.completion",
            "created": 5,
            "model": "grok-3",
            "choices": [{"index": 3, "message": {"role": "assistant", "content": "ok"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 40},
            "citations": []
        });
        let chat = decode_upstream(&serde_json::to_vec(&body).unwrap()).unwrap();
        assert_eq!(chat.usage, Some(ChatUsage::new(10, 5)));
        assert!(chat.citations.is_none());
        assert_eq!(chat.choices[0].index, 0);
    }

    #[test]
    fn decode_passes_legacy_chat_shape_through() {
        let body = json!({
            "id": "chatcmpl-9",
            "object": "chat.completion",
            "created": 5,
            "model": "grok-3",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "legacy"}, "finish_reason": "stop"}],
            "citations": ["https://x.com/c/status/3"]
        });
        let chat = decode_upstream(&serde_json::to_vec(&body).unwrap()).unwrap();
        assert_eq!(chat.content(), "legacy");
        assert_eq!(chat.citations(), ["https://x.com/c/status/3"]);
    }

    #[test]
    fn decode_rejects_invalid_legacy_shape() {
        let body = json!({"id": "x", "choices": []});
        let err = decode_upstream(&serde_json::to_vec(&body).unwrap()).unwrap_err();
        assert!(matches!(err, GrokError::Validation(_)));
        assert_eq!(err.status(), 0);
    }

    #[test]
    fn decode_rejects_non_json() {
        let err = decode_upstream(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, GrokError::Serde(_)));
    }
}
