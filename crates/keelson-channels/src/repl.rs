// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

//! A minimal stdin/stdout channel (§10.E) used to exercise the orchestration
//! core end to end. Not part of the core's contract — every other channel
//! (chat platforms, HTTP, …) reaches the router the same way this one does.

use std::io::Write as _;

use keelson_core::{AgentRouter, SessionLog, ToolUseObserver};
use keelson_model::ChatClient;
use keelson_tools::ToolRegistry;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const CHANNEL_NAME: &str = "repl";
const LOCAL_USER_ID: &str = "local";
const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];

#[allow(clippy::too_many_arguments)]
pub async fn run_repl(
    router: &AgentRouter,
    session_log: &SessionLog,
    client: &dyn ChatClient,
    registry: &ToolRegistry,
    max_tokens: u32,
    max_turns: u32,
    compaction_threshold: usize,
    observer: Option<&dyn ToolUseObserver>,
) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    info!("repl channel ready");
    print!("> ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            print!("> ");
            std::io::stdout().flush()?;
            continue;
        }
        if EXIT_COMMANDS.contains(&text) {
            break;
        }

        let answer = router
            .run(session_log, client, registry, CHANNEL_NAME, LOCAL_USER_ID, text, max_tokens, max_turns, compaction_threshold, observer)
            .await?;
        println!("{answer}");
        print!("> ");
        std::io::stdout().flush()?;
    }

    Ok(())
}
