// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::Config;

/// Environment variable carrying an explicit config file path, checked when
/// no `--config` flag is supplied.
pub const CONFIG_ENV_VAR: &str = "OPENCLAW_CONFIG";

/// Resolve which single config file (if any) should be loaded, in priority
/// order: an explicit path, then `$OPENCLAW_CONFIG`, then `<workspace>/config.json`.
fn resolve_path(explicit: Option<&Path>, workspace: &Path) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    if let Ok(p) = std::env::var(CONFIG_ENV_VAR) {
        if !p.is_empty() {
            return Some(PathBuf::from(p));
        }
    }
    let candidate = workspace.join("config.json");
    if candidate.is_file() {
        return Some(candidate);
    }
    None
}

/// Load the single JSON configuration document. An explicit path or
/// `$OPENCLAW_CONFIG` that doesn't exist is an error; everything else missing
/// falls back to [`Config::default()`] — unlike the reference loader this
/// never merges multiple files, matching the single-document contract.
pub fn load(explicit: Option<&Path>, workspace: &Path) -> anyhow::Result<Config> {
    let explicit_requested = explicit.is_some() || std::env::var(CONFIG_ENV_VAR).is_ok();
    match resolve_path(explicit, workspace) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Config = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        }
        None if explicit_requested => {
            anyhow::bail!("config file not found")
        }
        None => {
            debug!("no config file found, using defaults");
            Ok(Config::default())
        }
    }
}
