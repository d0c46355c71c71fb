// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

/// A tool call ready for dispatch: arguments already parsed to a JSON value
/// (the turn loop is responsible for the raw-string → object parse; a
/// failure there yields an empty object here, never an aborted call).
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: Value,
}

/// One registered capability. `execute` may fail; the registry converts a
/// failure into an `Error: ...` result string rather than propagating it —
/// tool failures never abort a turn.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, args: Value) -> anyhow::Result<String>;
}
