// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

//! Agent definition (§4.I): the fixed identity an incoming message is
//! routed to.

use crate::soul::build_system_prompt;

/// One configured agent. `system_prompt` is built once at construction —
/// not lazily on every turn — since nothing it depends on (soul text,
/// workspace, current date) changes across a process lifetime.
#[derive(Debug, Clone)]
pub struct Agent {
    pub name: String,
    pub model: String,
    pub prefix: String,
    pub session_namespace: String,
    pub system_prompt: String,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        soul_text: &str,
        prefix: impl Into<String>,
        session_namespace: impl Into<String>,
        workspace: &str,
        current_date: &str,
    ) -> Self {
        let system_prompt = build_system_prompt(soul_text, workspace, current_date, None);
        Self {
            name: name.into(),
            model: model.into(),
            prefix: prefix.into(),
            session_namespace: session_namespace.into(),
            system_prompt,
        }
    }
}
