// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

//! History Sanitiser (§4.E): repairs a loaded log left invalid by a crash
//! mid-turn.

use keelson_model::{Message, Role};

/// Drops assistant messages with unanswered tool calls from the tail,
/// repeatedly, until invariant 5 holds (a loaded session never ends with an
/// assistant message whose tool_calls are unanswered). Never mutates
/// storage — the caller decides whether and when to persist.
pub fn sanitize(mut messages: Vec<Message>) -> Vec<Message> {
    while let Some(last) = messages.last() {
        if last.role == Role::Assistant && last.has_tool_calls() {
            messages.pop();
        } else {
            break;
        }
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use keelson_model::ToolCall;

    #[test]
    fn empty_input_is_unchanged() {
        assert_eq!(sanitize(vec![]), vec![]);
    }

    #[test]
    fn valid_tail_is_unchanged() {
        let msgs = vec![Message::user("hi"), Message::assistant("hello")];
        assert_eq!(sanitize(msgs.clone()), msgs);
    }

    #[test]
    fn drops_single_orphan_tool_call_tail() {
        let msgs = vec![
            Message::user("run ls"),
            Message::assistant_tool_calls(vec![ToolCall::new("orphan", "shell", "{}")]),
        ];
        assert_eq!(sanitize(msgs), vec![Message::user("run ls")]);
    }

    #[test]
    fn properly_answered_tool_call_is_kept() {
        let msgs = vec![
            Message::user("run ls"),
            Message::assistant_tool_calls(vec![ToolCall::new("c1", "shell", "{}")]),
            Message::tool_result("c1", "ok"),
        ];
        assert_eq!(sanitize(msgs.clone()), msgs);
    }

    #[test]
    fn drops_multiple_trailing_orphan_messages() {
        let msgs = vec![
            Message::user("a"),
            Message::assistant_tool_calls(vec![ToolCall::new("c1", "t", "{}")]),
            Message::tool_result("c1", "ok"),
            Message::user("b"),
            Message::assistant_tool_calls(vec![ToolCall::new("c2", "t", "{}")]),
        ];
        let result = sanitize(msgs);
        assert_eq!(result.len(), 3);
        assert_eq!(result.last().unwrap().content.as_deref(), Some("ok"));
    }

    #[test]
    fn sanitise_is_idempotent() {
        let msgs = vec![
            Message::user("a"),
            Message::assistant_tool_calls(vec![ToolCall::new("orphan", "t", "{}")]),
        ];
        let once = sanitize(msgs);
        let twice = sanitize(once.clone());
        assert_eq!(once, twice);
    }
}
