// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

//! Session Serialiser (§4.H): guarantees at most one turn runs at a time
//! for a given session key, without serialising unrelated sessions against
//! each other.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

/// Per-key mutual exclusion over an otherwise unordered set of sessions.
/// The meta-lock only ever guards the map of per-key locks themselves — it
/// is released before a caller awaits the key's own lock, so two different
/// keys never wait on each other. The per-key lock is a `tokio::sync::Mutex`
/// rather than a `std::sync::Mutex` because it is held across the turn
/// loop's `.await` points (the LLM call, tool execution).
#[derive(Default)]
pub struct SessionSerializer {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SessionSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks.entry(key.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    /// Awaits the exclusive lock for `key`, then runs `f`. Blocking happens
    /// only on the per-key lock, acquired after the meta-lock guard is
    /// dropped.
    pub async fn with_lock<T, Fut>(&self, key: &str, f: impl FnOnce() -> Fut) -> T
    where
        Fut: Future<Output = T>,
    {
        let lock = self.lock_for(key);
        let _guard = lock.lock().await;
        f().await
    }

    /// Session keys that currently have an entry in the lock table. A key
    /// appears here once it has ever been locked, even if not currently
    /// held — this is meant as an introspection aid, not a live-lock list.
    pub fn known_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.locks.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}
