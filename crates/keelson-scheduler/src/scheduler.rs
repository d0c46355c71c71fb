// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

//! Background-task heartbeat scheduler (§4.J): polls a bounded wake
//! interval rather than sleeping until the exact next fire time, the same
//! shape as a `while not stopped: run_pending(); sleep(interval)` loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cadence::{self, Cadence};
use crate::runner::HeartbeatRunner;

const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30);
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

struct Job {
    name: String,
    cadence: Cadence,
    prompt: String,
    agent: String,
    last_fired: Mutex<Option<chrono::DateTime<Local>>>,
}

/// Manages a set of heartbeats and runs due ones in a background task.
pub struct HeartbeatScheduler {
    runner: Arc<dyn HeartbeatRunner>,
    jobs: Vec<Arc<Job>>,
    stop: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl HeartbeatScheduler {
    pub fn new(runner: Arc<dyn HeartbeatRunner>) -> Self {
        Self { runner, jobs: Vec::new(), stop: Arc::new(AtomicBool::new(false)), handle: Mutex::new(None) }
    }

    /// Registers one heartbeat. Returns `false` (and logs) for an
    /// unparseable cadence expression rather than failing the whole
    /// scheduler's construction.
    pub fn add(&mut self, name: impl Into<String>, cadence_expr: &str, prompt: impl Into<String>, agent: impl Into<String>) -> bool {
        let name = name.into();
        match cadence::parse(cadence_expr) {
            Some(cadence) => {
                self.jobs.push(Arc::new(Job { name, cadence, prompt: prompt.into(), agent: agent.into(), last_fired: Mutex::new(None) }));
                true
            }
            None => {
                warn!(name, cadence_expr, "invalid heartbeat cadence expression, skipping");
                false
            }
        }
    }

    pub fn heartbeat_names(&self) -> Vec<String> {
        self.jobs.iter().map(|j| j.name.clone()).collect()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.handle.lock().unwrap().as_ref(), Some(h) if !h.is_finished())
    }

    /// Spawns the poll loop. A no-op if already running.
    pub fn start(&self) {
        self.start_with_interval(DEFAULT_CHECK_INTERVAL);
    }

    pub fn start_with_interval(&self, check_interval: Duration) {
        let mut handle_guard = self.handle.lock().unwrap();
        if matches!(handle_guard.as_ref(), Some(h) if !h.is_finished()) {
            return;
        }

        self.stop.store(false, Ordering::SeqCst);
        let jobs = self.jobs.clone();
        let runner = self.runner.clone();
        let stop = self.stop.clone();

        let spawned = tokio::spawn(async move {
            while !stop.load(Ordering::SeqCst) {
                tick(&jobs, runner.as_ref()).await;
                tokio::time::sleep(check_interval).await;
            }
        });
        info!(check_interval_secs = check_interval.as_secs(), "heartbeat scheduler started");
        *handle_guard = Some(spawned);
    }

    /// Signals the background task to stop and waits (bounded) for it to
    /// exit.
    pub async fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        let handle = self.handle.lock().unwrap().take();
        if let Some(handle) = handle {
            if tokio::time::timeout(STOP_JOIN_TIMEOUT, handle).await.is_err() {
                warn!("heartbeat scheduler did not stop within timeout");
            }
        }
        info!("heartbeat scheduler stopped");
    }
}

async fn tick(jobs: &[Arc<Job>], runner: &dyn HeartbeatRunner) {
    let now = Local::now();
    for job in jobs {
        let last_fired = *job.last_fired.lock().unwrap();
        if !cadence::is_due(&job.cadence, last_fired, now) {
            continue;
        }
        match runner.run(&job.agent, &job.name, &job.prompt).await {
            Ok(response) => info!(heartbeat = %job.name, response = %response.chars().take(100).collect::<String>(), "heartbeat fired"),
            Err(e) => warn!(heartbeat = %job.name, error = %e, "heartbeat failed"),
        }
        *job.last_fired.lock().unwrap() = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct CountingRunner(AtomicUsize);

    #[async_trait]
    impl HeartbeatRunner for CountingRunner {
        async fn run(&self, _agent: &str, _name: &str, _prompt: &str) -> anyhow::Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("ok".to_string())
        }
    }

    #[test]
    fn add_rejects_invalid_cadence() {
        let mut scheduler = HeartbeatScheduler::new(Arc::new(CountingRunner(AtomicUsize::new(0))));
        assert!(!scheduler.add("bad", "not a schedule", "hi", "main"));
        assert!(scheduler.heartbeat_names().is_empty());
    }

    #[test]
    fn add_accepts_valid_cadence() {
        let mut scheduler = HeartbeatScheduler::new(Arc::new(CountingRunner(AtomicUsize::new(0))));
        assert!(scheduler.add("ping", "every 1 minute", "hi", "main"));
        assert_eq!(scheduler.heartbeat_names(), vec!["ping"]);
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let runner = Arc::new(CountingRunner(AtomicUsize::new(0)));
        let mut scheduler = HeartbeatScheduler::new(runner);
        scheduler.add("ping", "every 30 seconds", "hi", "main");
        scheduler.start_with_interval(Duration::from_millis(20));
        assert!(scheduler.is_running());
        scheduler.start_with_interval(Duration::from_millis(20));
        assert!(scheduler.is_running());
        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn due_heartbeat_fires_at_least_once() {
        let runner = Arc::new(CountingRunner(AtomicUsize::new(0)));
        let mut scheduler = HeartbeatScheduler::new(runner.clone());
        scheduler.add("ping", "every 1 second", "hi", "main");
        scheduler.start_with_interval(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.stop().await;
        assert!(runner.0.load(Ordering::SeqCst) >= 1);
    }
}
