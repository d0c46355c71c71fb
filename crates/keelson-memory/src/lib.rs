// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

//! Named markdown blobs with substring search.
//!
//! One file per key in a dedicated directory. Keys are sanitised the same
//! way session log keys are: every byte outside `[A-Za-z0-9_-]` becomes `_`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

type Result<T> = std::result::Result<T, MemoryError>;

/// Fixed string returned when a search matches nothing.
pub const NO_MATCH: &str = "No matching memories found.";

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// A directory of named, searchable markdown blobs.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    dir: PathBuf,
}

impl MemoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.md", sanitize_key(key)))
    }

    fn io_err(&self, path: &Path, source: std::io::Error) -> MemoryError {
        MemoryError::Io { path: path.to_path_buf(), source }
    }

    pub fn save(&self, key: &str, content: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| self.io_err(&self.dir, e))?;
        let path = self.path(key);
        std::fs::write(&path, content).map_err(|e| self.io_err(&path, e))?;
        debug!(key, bytes = content.len(), "memory saved");
        Ok(())
    }

    pub fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(&path, e)),
        }
    }

    pub fn delete(&self, key: &str) -> Result<bool> {
        let path = self.path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_err(&path, e)),
        }
    }

    /// Keys currently stored, derived from filenames, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(|e| self.io_err(&self.dir, e))? {
            let entry = entry.map_err(|e| self.io_err(&self.dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("md") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Tokenise `query` on whitespace, lowercase, and return the
    /// concatenation of every blob that contains all tokens (case-insensitive
    /// substring match). Returns [`NO_MATCH`] when nothing qualifies.
    pub fn search(&self, query: &str) -> Result<String> {
        let tokens: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        if tokens.is_empty() {
            return Ok(NO_MATCH.to_string());
        }

        let mut matches = Vec::new();
        for key in self.list()? {
            if let Some(content) = self.load(&key)? {
                let haystack = content.to_lowercase();
                if tokens.iter().all(|t| haystack.contains(t.as_str())) {
                    matches.push(format!("## {key}\n\n{content}"));
                }
            }
        }

        if matches.is_empty() {
            Ok(NO_MATCH.to_string())
        } else {
            Ok(matches.join("\n\n---\n\n"))
        }
    }
}
