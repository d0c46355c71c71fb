// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

//! Default personality text and system-prompt assembly (§4.I).

/// Shipped when an agent definition names no `soul_path`.
pub const DEFAULT_SOUL: &str = "\
You are a capable, direct personal assistant. You have access to tools for \
reading and writing files, running shell commands, and recalling saved \
memories — use them whenever they would get a better answer than guessing. \
Say when you don't know something rather than inventing an answer. Keep \
responses focused on what was asked.";

/// Joins the soul text with a context block describing the run's workspace,
/// current date, and any agent-specific extra context, in that fixed order.
pub fn build_system_prompt(soul: &str, workspace: &str, current_date: &str, extra_context: Option<&str>) -> String {
    let mut blocks = vec![soul.to_string()];

    let mut context = format!("## Context\n- Current date: {current_date}\n- Workspace: {workspace}");
    if let Some(extra) = extra_context {
        if !extra.is_empty() {
            context.push('\n');
            context.push_str(extra);
        }
    }
    blocks.push(context);

    blocks.join("\n\n")
}
