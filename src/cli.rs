// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "keelson",
    about = "A personal AI assistant orchestration core",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// One-shot prompt. When given, keelson answers it and exits instead of
    /// starting the interactive repl channel.
    #[arg(value_name = "PROMPT")]
    pub prompt: Option<String>,

    /// Path to the configuration file (overrides OPENCLAW_CONFIG and
    /// auto-discovery of <workspace>/config.json).
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Workspace directory. Defaults to the configuration's `workspace`
    /// field, or the current directory if unset.
    #[arg(long, short = 'w')]
    pub workspace: Option<PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace).
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the effective configuration and exit.
    ShowConfig,
    /// Generate a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "keelson", &mut std::io::stdout());
}
