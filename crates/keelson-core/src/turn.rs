// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

//! Turn Loop (§4.G): the core request/tool-execution/response cycle shared
//! by every channel and agent.

use keelson_model::{ChatClient, ChatRequest, Message};
use keelson_tools::{ToolCall as RegistryToolCall, ToolRegistry};
use serde_json::Value;
use tracing::warn;

use crate::compact::{compact_session, DEFAULT_COMPACTION_THRESHOLD};
use crate::sanitize::sanitize;
use crate::session_log::SessionLog;

/// Upper bound on tool round-trips within a single turn before giving up.
pub const DEFAULT_MAX_TURNS: u32 = 20;

/// Returned verbatim when `max_turns` is exhausted without a final answer.
/// Nothing from the exhausted round is persisted.
pub const MAX_TURNS_SENTINEL: &str = "(max tool turns reached)";

/// Notified once per executed tool call, after execution but before the
/// round is persisted. Errors from tools are already folded into `result`.
pub trait ToolUseObserver: Send + Sync {
    fn on_tool_use(&self, name: &str, result: &str);
}

fn tool_schemas_for_request(registry: &ToolRegistry) -> Vec<keelson_model::ToolSchema> {
    registry
        .schemas()
        .into_iter()
        .map(|s| keelson_model::ToolSchema { name: s.name, description: s.description, parameters: s.parameters })
        .collect()
}

/// Parses a tool call's raw JSON-text arguments. A malformed payload never
/// aborts the call — it is treated as an empty object.
fn parse_arguments(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({}))
}

/// Runs one turn: loads history, sanitises it, compacts it if oversized,
/// appends and persists `user_input`, then drives the tool-call cycle
/// against `client` until a plain-text answer arrives or `max_turns` is
/// exhausted.
#[allow(clippy::too_many_arguments)]
pub async fn run_turn(
    session_log: &SessionLog,
    session_key: &str,
    client: &dyn ChatClient,
    registry: &ToolRegistry,
    model: &str,
    system_prompt: &str,
    max_tokens: u32,
    user_input: &str,
    max_turns: u32,
    compaction_threshold: usize,
    observer: Option<&dyn ToolUseObserver>,
) -> anyhow::Result<String> {
    let loaded = session_log.load(session_key)?;
    let mut messages = sanitize(loaded);

    if crate::compact::estimate(&messages) >= compaction_threshold {
        messages = compact_session(client, model, messages, compaction_threshold).await?;
        session_log.overwrite(session_key, &messages)?;
    }

    let user_message = Message::user(user_input);
    messages.push(user_message.clone());
    session_log.append(session_key, &user_message)?;

    let tools = tool_schemas_for_request(registry);

    for _ in 0..max_turns {
        // The system prompt is prepended fresh on every call, not persisted
        // to the session log — changing an agent's soul never requires
        // migrating old sessions.
        let mut api_messages = Vec::with_capacity(messages.len() + 1);
        api_messages.push(Message::system(system_prompt));
        api_messages.extend(messages.clone());

        let request = ChatRequest {
            model: model.to_string(),
            messages: api_messages,
            max_tokens,
            tools: Some(tools.clone()),
        };
        let response = client.chat(request).await?;

        if !response.wants_tool_calls() {
            let answer = response.first_message().and_then(|m| m.content.clone()).unwrap_or_default();
            let assistant_message = Message::assistant(answer.clone());
            session_log.append(session_key, &assistant_message)?;
            return Ok(answer);
        }

        let assistant_message = response.first_message().cloned().unwrap_or_else(|| Message::assistant_tool_calls(vec![]));
        let mut round = vec![assistant_message.clone()];

        for call in &assistant_message.tool_calls {
            let args = parse_arguments(call.arguments());
            let registry_call = RegistryToolCall { id: call.id.clone(), name: call.name().to_string(), args };
            let result = registry.execute(&registry_call).await;
            if let Some(observer) = observer {
                observer.on_tool_use(call.name(), &result);
            }
            round.push(Message::tool_result(call.id.clone(), result));
        }

        session_log.append_many(session_key, &round)?;
        messages.extend(round);
    }

    warn!(session_key, max_turns, "turn loop exhausted without a final answer");
    Ok(MAX_TURNS_SENTINEL.to_string())
}
