// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;

use crate::permission::{CheckResult, PermissionGate};
use crate::tool::Tool;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runs a shell command through the Permission Gate. A denial is returned as
/// the tool's result string, not as an error — the turn loop never sees it
/// as a failure.
pub struct ShellTool {
    gate: Arc<PermissionGate>,
    timeout: Duration,
}

impl ShellTool {
    pub fn new(gate: Arc<PermissionGate>) -> Self {
        Self { gate, timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS) }
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Run a shell command and return its combined stdout and stderr."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "command": { "type": "string" } },
            "required": ["command"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let command = args.get("command").and_then(Value::as_str).unwrap_or("").to_string();
        if command.is_empty() {
            return Ok("Error: no command provided".to_string());
        }

        match self.gate.check(&command) {
            CheckResult::Safe | CheckResult::Approved => {}
            CheckResult::NeedsApproval => {
                if !self.gate.request_approval(&command) {
                    return Ok("Permission denied. Command requires approval.".to_string());
                }
            }
        }

        run_command(&command, self.timeout).await
    }
}

async fn run_command(command: &str, timeout: Duration) -> anyhow::Result<String> {
    let mut cmd = Command::new("bash");
    cmd.arg("-c").arg(command);
    cmd.stdin(Stdio::null());
    cmd.kill_on_drop(true);

    #[cfg(unix)]
    unsafe {
        use std::os::unix::process::CommandExt;
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    let child = cmd.output();
    match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => {
            let mut text = String::from_utf8_lossy(&output.stdout).to_string();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            let text = text.trim();
            if text.is_empty() {
                Ok("(no output)".to_string())
            } else {
                Ok(text.to_string())
            }
        }
        Ok(Err(e)) => Ok(format!("Error: {e}")),
        Err(_) => Ok(format!("Error: Command timed out after {} seconds", timeout.as_secs())),
    }
}
