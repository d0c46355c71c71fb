// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

mod agent;
mod compact;
mod router;
mod sanitize;
mod serializer;
mod session_log;
mod soul;
mod turn;

pub use agent::Agent;
pub use compact::{compact_session, estimate as estimate_tokens, DEFAULT_COMPACTION_THRESHOLD};
pub use router::AgentRouter;
pub use sanitize::sanitize;
pub use serializer::SessionSerializer;
pub use session_log::{sanitize_key, SessionLog, SessionLogError};
pub use soul::{build_system_prompt, DEFAULT_SOUL};
pub use turn::{run_turn, ToolUseObserver, DEFAULT_MAX_TURNS, MAX_TURNS_SENTINEL};
