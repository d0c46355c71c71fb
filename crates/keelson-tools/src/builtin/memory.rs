// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;
use keelson_memory::MemoryStore;
use serde_json::{json, Value};

use crate::tool::Tool;

pub struct SaveMemoryTool {
    store: Arc<MemoryStore>,
}

impl SaveMemoryTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SaveMemoryTool {
    fn name(&self) -> &str {
        "save_memory"
    }

    fn description(&self) -> &str {
        "Save a named piece of text to long-term memory for later recall."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "key": { "type": "string" },
                "content": { "type": "string" }
            },
            "required": ["key", "content"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let key = args.get("key").and_then(Value::as_str).unwrap_or("");
        let content = args.get("content").and_then(Value::as_str).unwrap_or("");
        self.store.save(key, content)?;
        Ok(format!("Saved memory '{key}'"))
    }
}

pub struct SearchMemoryTool {
    store: Arc<MemoryStore>,
}

impl SearchMemoryTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SearchMemoryTool {
    fn name(&self) -> &str {
        "search_memory"
    }

    fn description(&self) -> &str {
        "Search saved memories for all given whitespace-separated terms."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "query": { "type": "string" } },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let query = args.get("query").and_then(Value::as_str).unwrap_or("");
        Ok(self.store.search(query)?)
    }
}
