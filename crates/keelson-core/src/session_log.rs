// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

//! Crash-safe append-only per-session history on durable storage (§4.A).

use std::io::Write;
use std::path::{Path, PathBuf};

use keelson_model::Message;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SessionLogError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialising message: {0}")]
    Serde(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, SessionLogError>;

/// Maps an opaque session key to a filesystem-safe name by replacing every
/// byte outside `[A-Za-z0-9_-]` with `_`. Collisions (two keys sanitising to
/// the same name) are acceptable and, for the same key, required.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// One directory of `<sanitised_key>.jsonl` files, one JSON message per line.
#[derive(Debug, Clone)]
pub struct SessionLog {
    dir: PathBuf,
}

impl SessionLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", sanitize_key(key)))
    }

    fn io_err(&self, path: &Path, source: std::io::Error) -> SessionLogError {
        SessionLogError::Io { path: path.to_path_buf(), source }
    }

    /// Returns an empty list when the session has never been written.
    /// Blank lines and a trailing malformed/partial line are silently
    /// skipped — this is how an interrupted append looks after a crash.
    pub fn load(&self, key: &str) -> Result<Vec<Message>> {
        let path = self.path(key);
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_err(&path, e)),
        };

        let mut messages = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Message>(line) {
                Ok(msg) => messages.push(msg),
                Err(e) => {
                    debug!(key, error = %e, "skipping malformed session log line");
                }
            }
        }
        Ok(messages)
    }

    /// Atomically appends one record; flushes before returning.
    pub fn append(&self, key: &str, msg: &Message) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| self.io_err(&self.dir, e))?;
        let path = self.path(key);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| self.io_err(&path, e))?;
        let line = serde_json::to_string(msg)?;
        writeln!(file, "{line}").map_err(|e| self.io_err(&path, e))?;
        file.flush().map_err(|e| self.io_err(&path, e))?;
        debug!(key, "appended message to session log");
        Ok(())
    }

    /// Appends several records as one write (used by the turn loop's
    /// atomicity rule: an assistant-with-tool-calls message together with
    /// every one of its tool results).
    pub fn append_many(&self, key: &str, msgs: &[Message]) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| self.io_err(&self.dir, e))?;
        let path = self.path(key);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| self.io_err(&path, e))?;
        for msg in msgs {
            let line = serde_json::to_string(msg)?;
            writeln!(file, "{line}").map_err(|e| self.io_err(&path, e))?;
        }
        file.flush().map_err(|e| self.io_err(&path, e))?;
        debug!(key, count = msgs.len(), "appended messages to session log");
        Ok(())
    }

    /// Replaces the entire log. Used only by the compactor.
    pub fn overwrite(&self, key: &str, msgs: &[Message]) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| self.io_err(&self.dir, e))?;
        let path = self.path(key);
        let mut lines = String::new();
        for msg in msgs {
            lines.push_str(&serde_json::to_string(msg)?);
            lines.push('\n');
        }
        std::fs::write(&path, lines).map_err(|e| self.io_err(&path, e))?;
        debug!(key, count = msgs.len(), "overwrote session log");
        Ok(())
    }

    pub fn exists(&self, key: &str) -> bool {
        self.path(key).is_file()
    }

    pub fn delete(&self, key: &str) -> Result<bool> {
        let path = self.path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_err(&path, e)),
        }
    }

    pub fn count(&self, key: &str) -> Result<usize> {
        Ok(self.load(key)?.len())
    }

    /// Session keys currently present, derived from filenames, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(|e| self.io_err(&self.dir, e))? {
            let entry = entry.map_err(|e| self.io_err(&self.dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
