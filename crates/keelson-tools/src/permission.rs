// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

//! Permission Gate: classifies shell-style commands and persists approval
//! decisions across turns.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
    Safe,
    Approved,
    NeedsApproval,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Approvals {
    #[serde(default)]
    allowed: Vec<String>,
    #[serde(default)]
    denied: Vec<String>,
}

fn load_approvals(path: &Path) -> Approvals {
    match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
        Err(_) => Approvals::default(),
    }
}

/// A prompt callback invoked by [`PermissionGate::request_approval`].
/// Returns `false` (deny) when no callback is configured.
pub trait ApprovalCallback: Send + Sync {
    fn ask(&self, command: &str) -> bool;
}

pub struct PermissionGate {
    approvals_path: PathBuf,
    safe_commands: HashSet<String>,
    callback: Option<Box<dyn ApprovalCallback>>,
}

impl PermissionGate {
    pub fn new(approvals_path: impl Into<PathBuf>, safe_commands: impl IntoIterator<Item = String>) -> Self {
        Self {
            approvals_path: approvals_path.into(),
            safe_commands: safe_commands.into_iter().collect(),
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: Box<dyn ApprovalCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn check(&self, command: &str) -> CheckResult {
        let base = command.split_whitespace().next().unwrap_or("");
        if self.safe_commands.contains(base) {
            return CheckResult::Safe;
        }
        let approvals = load_approvals(&self.approvals_path);
        if approvals.allowed.iter().any(|c| c == command) {
            return CheckResult::Approved;
        }
        CheckResult::NeedsApproval
    }

    /// Invokes the prompt callback (or defaults to deny) and persists the
    /// outcome. Returns whether the command is now approved.
    pub fn request_approval(&self, command: &str) -> bool {
        let approved = self.callback.as_ref().map(|cb| cb.ask(command)).unwrap_or(false);

        let mut approvals = load_approvals(&self.approvals_path);
        if approved {
            if !approvals.allowed.iter().any(|c| c == command) {
                approvals.allowed.push(command.to_string());
            }
            info!(command, "command approved and persisted");
        } else {
            if !approvals.denied.iter().any(|c| c == command) {
                approvals.denied.push(command.to_string());
            }
            info!(command, "command denied and persisted");
        }

        if let Some(parent) = self.approvals_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(error = %e, "could not create approvals directory");
                return approved;
            }
        }
        match serde_json::to_string_pretty(&approvals) {
            Ok(text) => {
                if let Err(e) = std::fs::write(&self.approvals_path, text) {
                    warn!(error = %e, "could not persist approval decision");
                }
            }
            Err(e) => warn!(error = %e, "could not serialise approvals"),
        }

        approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(dir: &Path, safe: &[&str]) -> PermissionGate {
        PermissionGate::new(dir.join("approvals.json"), safe.iter().map(|s| s.to_string()))
    }

    #[test]
    fn base_command_in_allow_list_is_safe() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate(dir.path(), &["ls", "git"]);
        assert_eq!(gate.check("git status"), CheckResult::Safe);
    }

    #[test]
    fn unknown_command_needs_approval() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate(dir.path(), &["ls"]);
        assert_eq!(gate.check("rm -rf /"), CheckResult::NeedsApproval);
    }

    #[test]
    fn missing_approvals_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate(dir.path(), &[]);
        assert_eq!(gate.check("curl example.com"), CheckResult::NeedsApproval);
    }

    #[test]
    fn corrupt_approvals_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("approvals.json");
        std::fs::write(&path, "not json").unwrap();
        let gate = PermissionGate::new(path, vec![]);
        assert_eq!(gate.check("curl example.com"), CheckResult::NeedsApproval);
    }

    #[test]
    fn request_approval_without_callback_denies_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate(dir.path(), &[]);
        assert!(!gate.request_approval("curl example.com"));
        assert_eq!(gate.check("curl example.com"), CheckResult::NeedsApproval);
    }

    struct AlwaysApprove;
    impl ApprovalCallback for AlwaysApprove {
        fn ask(&self, _command: &str) -> bool {
            true
        }
    }

    #[test]
    fn approved_command_becomes_approved_on_next_check() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate(dir.path(), &[]).with_callback(Box::new(AlwaysApprove));
        assert!(gate.request_approval("curl example.com"));
        assert_eq!(gate.check("curl example.com"), CheckResult::Approved);
    }
}
