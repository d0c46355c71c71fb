// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_safe_commands() -> Vec<String> {
    [
        "ls", "cat", "head", "tail", "wc", "date", "whoami", "echo", "pwd", "which", "git",
        "python", "python3", "node", "npm", "npx", "uv", "pip", "find", "grep", "sort", "uniq",
        "tr", "cut", "env", "file", "ruff", "pytest", "go", "cargo", "make",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Top-level configuration document. Every field has a default, so a missing
/// config file and `Config::default()` are indistinguishable to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workspace: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    pub agents: HashMap<String, AgentDef>,
    pub channels: HashMap<String, ChannelDef>,
    pub heartbeats: Vec<HeartbeatDef>,
    pub permissions: PermissionsDef,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: ".".to_string(),
            default_model: default_model(),
            agents: HashMap::new(),
            channels: HashMap::new(),
            heartbeats: Vec::new(),
            permissions: PermissionsDef::default(),
        }
    }
}

impl Config {
    /// Non-fatal configuration problems. Mirrors what a careful operator
    /// would want flagged without refusing to start.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for (id, agent) in &self.agents {
            if agent.model.is_empty() {
                warnings.push(format!("agent '{id}' has no model set; falls back to default_model"));
            }
            if let Some(prefix) = &agent.prefix {
                if !prefix.starts_with('/') {
                    warnings.push(format!("agent '{id}' prefix '{prefix}' does not start with '/'"));
                }
            }
        }
        for hb in &self.heartbeats {
            if !self.agents.contains_key(&hb.agent) && hb.agent != "main" {
                warnings.push(format!(
                    "heartbeat '{}' references unknown agent '{}'",
                    hb.name, hb.agent
                ));
            }
        }
        warnings
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentDef {
    pub name: String,
    pub model: String,
    pub soul_path: Option<String>,
    pub prefix: Option<String>,
    pub session_prefix: Option<String>,
}

impl Default for AgentDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            model: String::new(),
            soul_path: None,
            prefix: None,
            session_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelDef {
    pub enabled: bool,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl Default for ChannelDef {
    fn default() -> Self {
        Self { enabled: false, host: None, port: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatDef {
    pub name: String,
    pub schedule: String,
    pub prompt: String,
    #[serde(default = "default_heartbeat_agent")]
    pub agent: String,
}

fn default_heartbeat_agent() -> String {
    "main".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionsDef {
    #[serde(default = "default_safe_commands")]
    pub safe_commands: Vec<String>,
}

impl Default for PermissionsDef {
    fn default() -> Self {
        Self { safe_commands: default_safe_commands() }
    }
}
