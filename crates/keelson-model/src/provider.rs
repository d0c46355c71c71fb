// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::types::{Message, ToolSchema};

/// Both spellings providers use for "the model wants to call a tool".
/// The Open Question the reference system left unresolved: the spec
/// mandates accepting both rather than picking one.
pub const FINISH_REASON_TOOL_CALLS: &str = "tool_calls";
pub const FINISH_REASON_TOOL_USE: &str = "tool_use";

fn is_tool_requesting_finish_reason(reason: &str) -> bool {
    reason == FINISH_REASON_TOOL_CALLS || reason == FINISH_REASON_TOOL_USE
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub tools: Option<Vec<ToolSchema>>,
}

#[derive(Debug, Clone)]
pub struct ChatChoice {
    pub message: Message,
    pub finish_reason: String,
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

impl ChatResponse {
    /// The turn loop's tool-call detection: a tool-requesting finish reason
    /// AND a non-empty `tool_calls` list on the first choice.
    pub fn wants_tool_calls(&self) -> bool {
        match self.choices.first() {
            Some(choice) => {
                is_tool_requesting_finish_reason(&choice.finish_reason) && choice.message.has_tool_calls()
            }
            None => false,
        }
    }

    pub fn first_message(&self) -> Option<&Message> {
        self.choices.first().map(|c| &c.message)
    }
}

/// A single non-streaming `Chat(request) -> response` operation. Everything
/// upstream of this trait (HTTP transport, provider auth, retries) is out of
/// scope; implementors only need to satisfy this contract.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> anyhow::Result<ChatResponse>;
}
