// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

//! Bridges a fired heartbeat to the turn loop.

use async_trait::async_trait;
use keelson_core::{run_turn, AgentRouter, SessionLog, SessionSerializer};
use keelson_model::ChatClient;
use keelson_tools::ToolRegistry;
use std::sync::Arc;

/// What a scheduled heartbeat actually does when it fires.
#[async_trait]
pub trait HeartbeatRunner: Send + Sync {
    async fn run(&self, agent_name: &str, heartbeat_name: &str, prompt: &str) -> anyhow::Result<String>;
}

/// The production runner: looks the named agent up in the router, derives
/// the heartbeat's own session key (`{namespace}:heartbeat:{name}`, kept
/// isolated from interactive sessions), and runs one turn.
pub struct CoreHeartbeatRunner {
    pub router: Arc<AgentRouter>,
    pub session_log: Arc<SessionLog>,
    pub client: Arc<dyn ChatClient>,
    pub registry: Arc<ToolRegistry>,
    pub max_tokens: u32,
    pub max_turns: u32,
    pub compaction_threshold: usize,
    pub serializer: SessionSerializer,
}

#[async_trait]
impl HeartbeatRunner for CoreHeartbeatRunner {
    async fn run(&self, agent_name: &str, heartbeat_name: &str, prompt: &str) -> anyhow::Result<String> {
        let agent = self
            .router
            .agent(agent_name)
            .ok_or_else(|| anyhow::anyhow!("heartbeat references unknown agent '{agent_name}'"))?;
        let session_key = format!("{}:heartbeat:{}", agent.session_namespace, heartbeat_name);

        self.serializer
            .with_lock(&session_key, || async {
                run_turn(
                    &self.session_log,
                    &session_key,
                    self.client.as_ref(),
                    &self.registry,
                    &agent.model,
                    &agent.system_prompt,
                    self.max_tokens,
                    prompt,
                    self.max_turns,
                    self.compaction_threshold,
                    None,
                )
                .await
            })
            .await
    }
}
