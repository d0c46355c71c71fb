// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use keelson_config::{AgentDef, Config};
use keelson_core::{Agent, AgentRouter, SessionLog};
use keelson_model::{ChatClient, MockChatClient};
use keelson_scheduler::{CoreHeartbeatRunner, HeartbeatRunner, HeartbeatScheduler};
use keelson_tools::builtin::{ReadFileTool, SaveMemoryTool, SearchMemoryTool, ShellTool, WriteFileTool};
use keelson_tools::{PermissionGate, ToolRegistry};

use cli::{Cli, Commands};

const DEFAULT_MAX_TOKENS: u32 = 4096;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli { command, prompt, config: config_path, workspace, verbose } = Cli::parse();
    init_logging(verbose);

    if let Some(Commands::Completions { shell }) = command {
        cli::print_completions(shell);
        return Ok(());
    }

    let workspace = workspace.unwrap_or_else(|| PathBuf::from("."));
    let config = keelson_config::load(config_path.as_deref(), &workspace)
        .context("loading configuration")?;

    for warning in config.validate() {
        tracing::warn!("{warning}");
    }

    if matches!(command, Some(Commands::ShowConfig)) {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let workspace = PathBuf::from(&config.workspace);
    let session_log = Arc::new(SessionLog::new(workspace.join("sessions")));

    let memory_store = Arc::new(keelson_memory::MemoryStore::new(workspace.join("memory")));
    let permission_gate = Arc::new(PermissionGate::new(
        workspace.join("approvals.json"),
        config.permissions.safe_commands.clone(),
    ));

    let mut registry = ToolRegistry::new();
    registry.register(ShellTool::new(permission_gate.clone())).context("registering shell tool")?;
    registry.register(ReadFileTool).context("registering read_file tool")?;
    registry.register(WriteFileTool).context("registering write_file tool")?;
    registry.register(SaveMemoryTool::new(memory_store.clone())).context("registering save_memory tool")?;
    registry.register(SearchMemoryTool::new(memory_store.clone())).context("registering search_memory tool")?;
    let registry = Arc::new(registry);

    // The wire transport to an actual model provider is out of scope here —
    // operators plug in their own `ChatClient` at this seam. Shipped with
    // `MockChatClient` so the binary runs end to end without one.
    let client: Arc<dyn ChatClient> = Arc::new(MockChatClient::new(vec![]));

    let current_date = chrono::Local::now().format("%Y-%m-%d").to_string();
    let agents = build_agents(&config, &workspace, &current_date);
    let default_agent = agents.first().map(|a| a.name.clone()).unwrap_or_else(|| "main".to_string());
    let router = Arc::new(AgentRouter::new(agents, &default_agent));

    let mut scheduler = HeartbeatScheduler::new(Arc::new(CoreHeartbeatRunner {
        router: router.clone(),
        session_log: session_log.clone(),
        client: client.clone(),
        registry: registry.clone(),
        max_tokens: DEFAULT_MAX_TOKENS,
        max_turns: keelson_core::DEFAULT_MAX_TURNS,
        compaction_threshold: keelson_core::DEFAULT_COMPACTION_THRESHOLD,
        serializer: keelson_core::SessionSerializer::new(),
    }) as Arc<dyn HeartbeatRunner>);
    for heartbeat in &config.heartbeats {
        scheduler.add(&heartbeat.name, &heartbeat.schedule, &heartbeat.prompt, &heartbeat.agent);
    }
    scheduler.start();

    let result = if let Some(prompt) = prompt {
        let answer = router
            .run(
                &session_log,
                client.as_ref(),
                &registry,
                "cli",
                "local",
                &prompt,
                DEFAULT_MAX_TOKENS,
                keelson_core::DEFAULT_MAX_TURNS,
                keelson_core::DEFAULT_COMPACTION_THRESHOLD,
                None,
            )
            .await;
        match &result {
            Ok(answer) => println!("{answer}"),
            Err(e) => eprintln!("error: {e:#}"),
        }
        result.map(|_| ())
    } else {
        keelson_channels::run_repl(
            &router,
            &session_log,
            client.as_ref(),
            &registry,
            DEFAULT_MAX_TOKENS,
            keelson_core::DEFAULT_MAX_TURNS,
            keelson_core::DEFAULT_COMPACTION_THRESHOLD,
            None,
        )
        .await
    };

    scheduler.stop().await;
    result
}

/// Builds the configured agent set, falling back to a single `main` agent
/// with the default soul and model when none are configured.
fn build_agents(config: &Config, workspace: &Path, current_date: &str) -> Vec<Agent> {
    if config.agents.is_empty() {
        info!("no agents configured, falling back to a single default agent");
        return vec![Agent::new(
            "main",
            &config.default_model,
            keelson_core::DEFAULT_SOUL,
            "",
            "agent:main",
            &workspace.display().to_string(),
            current_date,
        )];
    }

    let mut names: Vec<&String> = config.agents.keys().collect();
    names.sort();

    names
        .into_iter()
        .map(|id| {
            let def: &AgentDef = &config.agents[id];
            let model = if def.model.is_empty() { config.default_model.clone() } else { def.model.clone() };
            let soul = def
                .soul_path
                .as_ref()
                .and_then(|path| std::fs::read_to_string(path).ok())
                .unwrap_or_else(|| keelson_core::DEFAULT_SOUL.to_string());
            let prefix = def.prefix.clone().unwrap_or_default();
            let namespace = def.session_prefix.clone().unwrap_or_else(|| format!("agent:{id}"));
            Agent::new(
                if def.name.is_empty() { id.clone() } else { def.name.clone() },
                model,
                &soul,
                prefix,
                namespace,
                &workspace.display().to_string(),
                current_date,
            )
        })
        .collect()
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
