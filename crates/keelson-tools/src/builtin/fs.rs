// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tool::Tool;

const READ_CAP_CHARS: usize = 50_000;

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a text file from disk, truncated to 50,000 characters."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "path": { "type": "string" } },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let path = args.get("path").and_then(Value::as_str).unwrap_or("");
        match std::fs::read_to_string(path) {
            Ok(content) if content.len() > READ_CAP_CHARS => Ok(format!(
                "{}\n[truncated to {READ_CAP_CHARS} characters]",
                &content[..READ_CAP_CHARS]
            )),
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(format!("Error: file not found: {path}"))
            }
            Err(e) => Ok(format!("Error: {e}")),
        }
    }
}

pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write text to a file, creating parent directories as needed."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "content": { "type": "string" }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let path = args.get("path").and_then(Value::as_str).unwrap_or("");
        let content = args.get("content").and_then(Value::as_str).unwrap_or("");
        if path.is_empty() {
            return Ok("Error: no path provided".to_string());
        }
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    return Ok(format!("Error: {e}"));
                }
            }
        }
        match std::fs::write(path, content) {
            Ok(()) => Ok(format!("Wrote {} characters to {path}", content.len())),
            Err(e) => Ok(format!("Error: {e}")),
        }
    }
}
