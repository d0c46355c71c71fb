// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

//! Compactor (§4.F): summarises the older half of history once an estimated
//! size threshold is crossed.

use keelson_model::{ChatClient, ChatRequest, Message, Role};
use tracing::info;

/// Default trigger: `estimate(messages) >= threshold`.
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 100_000;

const SUMMARY_MAX_TOKENS: u32 = 2048;
const TOOL_RESULT_TRUNCATE_CHARS: usize = 500;

const SUMMARIZER_SYSTEM_PROMPT: &str = "You are a precise conversation summarizer.";

const SUMMARIZE_PROMPT_TEMPLATE: &str = "Summarize the following conversation concisely. Preserve all important facts, decisions, user preferences, file paths, variable names, and action outcomes. Be specific — do not generalize. Format as a bullet list.\n\nConversation to summarize:\n";

/// Coarse char-to-token proxy, deliberately independent of any tokeniser.
pub fn estimate(messages: &[Message]) -> usize {
    let encoded = serde_json::to_string(messages).unwrap_or_default();
    encoded.len() / 4
}

/// Where to split `messages` into an old half (to summarise) and a recent
/// tail (kept verbatim): the first user-role message at or after the
/// midpoint, falling back to a backward search, falling back to the
/// midpoint itself.
fn split_point(messages: &[Message]) -> usize {
    let mid = messages.len() / 2;
    for i in mid..messages.len() {
        if messages[i].role == Role::User {
            return i;
        }
    }
    for i in (0..mid).rev() {
        if messages[i].role == Role::User {
            return i;
        }
    }
    mid
}

/// Renders the old half to plain text per the fixed rendering rules.
fn render_for_summary(messages: &[Message]) -> String {
    let mut lines = Vec::new();
    for msg in messages {
        match msg.role {
            Role::Tool => {
                let id = msg.tool_call_id.as_deref().unwrap_or("");
                let content = msg.content.as_deref().unwrap_or("");
                let truncated: String = content.chars().take(TOOL_RESULT_TRUNCATE_CHARS).collect();
                lines.push(format!("[Tool result {id}]: {truncated}"));
            }
            Role::Assistant if msg.has_tool_calls() => {
                let names: Vec<&str> = msg.tool_calls.iter().map(|c| c.name()).collect();
                lines.push(format!("Assistant: [called tools: {}]", names.join(", ")));
                if let Some(content) = &msg.content {
                    if !content.is_empty() {
                        lines.push(format!("Assistant: {content}"));
                    }
                }
            }
            role => {
                let label = match role {
                    Role::System => "System",
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                    Role::Tool => unreachable!(),
                };
                lines.push(format!("{label}: {}", msg.content.as_deref().unwrap_or("")));
            }
        }
    }
    lines.join("\n")
}

/// Summarises `messages` if over `threshold`, else returns them unchanged.
/// Below threshold this is the identity function; above it, the returned
/// list always has length `1 + recent.len()` and `estimate` of the result
/// is lower than `estimate(messages)`.
pub async fn compact_session(
    client: &dyn ChatClient,
    model: &str,
    messages: Vec<Message>,
    threshold: usize,
) -> anyhow::Result<Vec<Message>> {
    if estimate(&messages) < threshold {
        return Ok(messages);
    }

    let split = split_point(&messages);
    let old = &messages[..split];
    let recent = &messages[split..];

    if old.is_empty() {
        return Ok(messages);
    }

    let rendered = render_for_summary(old);
    let prompt = format!("{SUMMARIZE_PROMPT_TEMPLATE}{rendered}");

    let request = ChatRequest {
        model: model.to_string(),
        messages: vec![Message::system(SUMMARIZER_SYSTEM_PROMPT), Message::user(prompt)],
        max_tokens: SUMMARY_MAX_TOKENS,
        tools: None,
    };
    let response = client.chat(request).await?;
    let summary = response
        .first_message()
        .and_then(|m| m.content.clone())
        .unwrap_or_else(|| "(empty summary)".to_string());

    let before = estimate(&messages);
    let summary_msg = Message::user(format!(
        "[Conversation summary of {} earlier messages]\n\n{}",
        old.len(),
        summary
    ));

    let mut result = Vec::with_capacity(1 + recent.len());
    result.push(summary_msg);
    result.extend_from_slice(recent);

    info!(before, after = estimate(&result), dropped = old.len(), "compacted session history");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keelson_model::{ChatChoice, ChatResponse, MockChatClient, ToolCall};

    fn stop(text: &str) -> ChatResponse {
        ChatResponse {
            choices: vec![ChatChoice { message: Message::assistant(text), finish_reason: "stop".into() }],
        }
    }

    #[test]
    fn split_point_prefers_first_user_at_or_after_midpoint() {
        let msgs = vec![
            Message::user("a"),
            Message::assistant("b"),
            Message::user("c"),
            Message::assistant("d"),
        ];
        // midpoint = 2, msgs[2] is user -> split at 2
        assert_eq!(split_point(&msgs), 2);
    }

    #[test]
    fn split_point_searches_backward_when_no_user_at_or_after_midpoint() {
        let msgs = vec![
            Message::user("a"),
            Message::assistant("b"),
            Message::assistant("c"),
            Message::assistant("d"),
        ];
        // midpoint = 2; no user at 2 or 3; backward search finds index 0
        assert_eq!(split_point(&msgs), 0);
    }

    #[test]
    fn render_formats_tool_result_with_truncation() {
        let long = "x".repeat(600);
        let msgs = vec![Message::tool_result("c1", long.clone())];
        let rendered = render_for_summary(&msgs);
        assert!(rendered.starts_with("[Tool result c1]: "));
        assert_eq!(rendered.len(), "[Tool result c1]: ".len() + TOOL_RESULT_TRUNCATE_CHARS);
    }

    #[test]
    fn render_formats_tool_call_only_assistant_message() {
        let msgs = vec![Message::assistant_tool_calls(vec![
            ToolCall::new("c1", "echo", "{}"),
            ToolCall::new("c2", "add", "{}"),
        ])];
        assert_eq!(render_for_summary(&msgs), "Assistant: [called tools: echo, add]");
    }

    #[tokio::test]
    async fn below_threshold_is_identity() {
        let client = MockChatClient::new(vec![stop("should not be used")]);
        let msgs = vec![Message::user("hi"), Message::assistant("hello")];
        let result = compact_session(&client, "gpt-4o", msgs.clone(), 1_000_000).await.unwrap();
        assert_eq!(result, msgs);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn above_threshold_preserves_recent_tail_verbatim() {
        let client = MockChatClient::new(vec![stop("- did a thing")]);
        let mut msgs = Vec::new();
        for i in 0..20 {
            msgs.push(Message::user(format!("message number {i} with some padding text")));
            msgs.push(Message::assistant("ok"));
        }
        let before = estimate(&msgs);
        let split = split_point(&msgs);
        let expected_recent = msgs[split..].to_vec();

        let result = compact_session(&client, "gpt-4o", msgs, 50).await.unwrap();
        assert_eq!(result[1..], expected_recent[..]);
        assert!(estimate(&result) < before);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn summary_message_has_user_role_and_count() {
        let client = MockChatClient::new(vec![stop("summary text")]);
        let mut msgs = Vec::new();
        for i in 0..20 {
            msgs.push(Message::user(format!("msg {i}")));
            msgs.push(Message::assistant("ok"));
        }
        let split = split_point(&msgs);
        let old_len = split;

        let result = compact_session(&client, "gpt-4o", msgs, 10).await.unwrap();
        assert_eq!(result[0].role, Role::User);
        assert!(result[0]
            .content
            .as_ref()
            .unwrap()
            .starts_with(&format!("[Conversation summary of {old_len} earlier messages]")));
    }
}
