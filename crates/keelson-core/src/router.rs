// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

//! Agent Registry & Router (§4.I): picks which configured agent handles an
//! incoming message and runs its turn in an isolated session.

use keelson_model::ChatClient;
use keelson_tools::ToolRegistry;

use crate::agent::Agent;
use crate::serializer::SessionSerializer;
use crate::session_log::SessionLog;
use crate::turn::{run_turn, ToolUseObserver};

const NO_QUERY_PLACEHOLDER: &str = "(no query provided)";

/// Ordered set of agents plus the one used when nothing matches. Resolution
/// is first-match-wins over registration order — callers control priority
/// purely by the order they pass agents in.
pub struct AgentRouter {
    agents: Vec<Agent>,
    default_index: usize,
    serializer: SessionSerializer,
}

impl AgentRouter {
    /// `default_name` must name one of `agents`; if it doesn't, the first
    /// agent becomes the default rather than panicking.
    pub fn new(agents: Vec<Agent>, default_name: &str) -> Self {
        let default_index = agents.iter().position(|a| a.name == default_name).unwrap_or(0);
        Self { agents, default_index, serializer: SessionSerializer::new() }
    }

    /// Matches `text` against every agent's prefix, case-insensitively,
    /// leading-match only, first registered match wins. An empty remainder
    /// after stripping the prefix becomes the placeholder rather than an
    /// empty query. No match routes to the default agent with `text`
    /// unchanged.
    pub fn resolve<'a>(&'a self, text: &str) -> (&'a Agent, String) {
        let lowered = text.to_lowercase();
        for agent in &self.agents {
            if agent.prefix.is_empty() {
                continue;
            }
            if lowered.starts_with(&agent.prefix.to_lowercase()) {
                let remainder = text[agent.prefix.len()..].trim();
                let query = if remainder.is_empty() { NO_QUERY_PLACEHOLDER.to_string() } else { remainder.to_string() };
                return (agent, query);
            }
        }
        (&self.agents[self.default_index], text.to_string())
    }

    /// Looks up a configured agent by name, e.g. for a heartbeat firing
    /// against a specific agent rather than prefix-resolved user text.
    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name == name)
    }

    /// Resolves `text` to an agent, derives its session key from
    /// `(agent.session_namespace, channel, user_id)`, and runs one turn. The
    /// agent's system prompt is passed straight through to the turn loop —
    /// it is never persisted to the session itself.
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        &self,
        session_log: &SessionLog,
        client: &dyn ChatClient,
        registry: &ToolRegistry,
        channel: &str,
        user_id: &str,
        text: &str,
        max_tokens: u32,
        max_turns: u32,
        compaction_threshold: usize,
        observer: Option<&dyn ToolUseObserver>,
    ) -> anyhow::Result<String> {
        let (agent, query) = self.resolve(text);
        let session_key = format!("{}:{}:{}", agent.session_namespace, channel, user_id);

        self.serializer
            .with_lock(&session_key, || async {
                run_turn(
                    session_log,
                    &session_key,
                    client,
                    registry,
                    &agent.model,
                    &agent.system_prompt,
                    max_tokens,
                    &query,
                    max_turns,
                    compaction_threshold,
                    observer,
                )
                .await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keelson_model::{ChatChoice, ChatResponse, Message, MockChatClient};

    fn agent(name: &str, prefix: &str, namespace: &str) -> Agent {
        Agent::new(name, "gpt-4o", "Be helpful.", prefix, namespace, "/ws", "2026-07-26")
    }

    fn stop(text: &str) -> ChatResponse {
        ChatResponse {
            choices: vec![ChatChoice { message: Message::assistant(text), finish_reason: "stop".into() }],
        }
    }

    #[test]
    fn resolve_matches_prefix_case_insensitively() {
        let router = AgentRouter::new(vec![agent("main", "", "agent:main"), agent("coder", "/code", "agent:coder")], "main");
        let (agent, query) = router.resolve("/CODE fix the bug");
        assert_eq!(agent.name, "coder");
        assert_eq!(query, "fix the bug");
    }

    #[test]
    fn resolve_falls_back_to_default_on_no_match() {
        let router = AgentRouter::new(vec![agent("main", "", "agent:main"), agent("coder", "/code", "agent:coder")], "main");
        let (agent, query) = router.resolve("just chatting");
        assert_eq!(agent.name, "main");
        assert_eq!(query, "just chatting");
    }

    #[test]
    fn resolve_uses_placeholder_when_remainder_is_empty() {
        let router = AgentRouter::new(vec![agent("main", "", "agent:main"), agent("coder", "/code", "agent:coder")], "main");
        let (agent, query) = router.resolve("/code");
        assert_eq!(agent.name, "coder");
        assert_eq!(query, "(no query provided)");
    }

    #[test]
    fn agent_looks_up_by_name() {
        let router = AgentRouter::new(vec![agent("main", "", "agent:main"), agent("coder", "/code", "agent:coder")], "main");
        assert_eq!(router.agent("coder").unwrap().name, "coder");
        assert!(router.agent("missing").is_none());
    }

    #[test]
    fn resolve_is_first_match_wins_in_registration_order() {
        let router = AgentRouter::new(
            vec![agent("a", "/x", "agent:a"), agent("b", "/x", "agent:b")],
            "a",
        );
        let (agent, _) = router.resolve("/x hi");
        assert_eq!(agent.name, "a");
    }

    #[tokio::test]
    async fn run_derives_session_key_from_namespace_channel_and_user() {
        let dir = tempfile::tempdir().unwrap();
        let session_log = SessionLog::new(dir.path());
        let router = AgentRouter::new(vec![agent("main", "", "agent:main")], "main");
        let client = MockChatClient::new(vec![stop("hi")]);
        let registry = ToolRegistry::new();

        router
            .run(&session_log, &client, &registry, "repl", "u1", "hello", 1024, 20, 100_000, None)
            .await
            .unwrap();

        assert!(session_log.exists("agent:main:repl:u1"));
    }

    #[tokio::test]
    async fn system_prompt_is_used_but_never_persisted_to_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let session_log = SessionLog::new(dir.path());
        let router = AgentRouter::new(vec![agent("main", "", "agent:main")], "main");
        let client = MockChatClient::new(vec![stop("hi")]);
        let registry = ToolRegistry::new();

        router
            .run(&session_log, &client, &registry, "repl", "u1", "hello", 1024, 20, 100_000, None)
            .await
            .unwrap();

        let messages = session_log.load("agent:main:repl:u1").unwrap();
        assert!(!messages.iter().any(|m| m.role == keelson_model::Role::System));
        assert_eq!(messages[0].role, keelson_model::Role::User);
    }

    #[tokio::test]
    async fn different_users_get_isolated_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let session_log = SessionLog::new(dir.path());
        let router = AgentRouter::new(vec![agent("main", "", "agent:main")], "main");
        let client = MockChatClient::new(vec![stop("hi")]);
        let registry = ToolRegistry::new();

        router.run(&session_log, &client, &registry, "repl", "u1", "hello", 1024, 20, 100_000, None).await.unwrap();
        router.run(&session_log, &client, &registry, "repl", "u2", "hello", 1024, 20, 100_000, None).await.unwrap();

        assert!(session_log.exists("agent:main:repl:u1"));
        assert!(session_log.exists("agent:main:repl:u2"));
    }
}
