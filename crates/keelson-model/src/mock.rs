// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0

//! A scripted [`ChatClient`] for tests: pops a queued response per call and
//! keeps the last one as a sticky fallback.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::provider::{ChatClient, ChatRequest, ChatResponse};

pub struct MockChatClient {
    responses: Mutex<Vec<ChatResponse>>,
    calls: AtomicUsize,
}

impl MockChatClient {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self { responses: Mutex::new(responses), calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn chat(&self, _request: ChatRequest) -> anyhow::Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            Ok(responses.remove(0))
        } else if let Some(last) = responses.first() {
            Ok(last.clone())
        } else {
            anyhow::bail!("MockChatClient exhausted with no responses queued")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, Role};

    fn stop_response(text: &str) -> ChatResponse {
        ChatResponse {
            choices: vec![crate::provider::ChatChoice {
                message: Message::assistant(text),
                finish_reason: "stop".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn returns_responses_in_order() {
        let client = MockChatClient::new(vec![stop_response("a"), stop_response("b")]);
        let req = ChatRequest { model: "m".into(), messages: vec![], max_tokens: 10, tools: None };
        let r1 = client.chat(req.clone()).await.unwrap();
        assert_eq!(r1.first_message().unwrap().content.as_deref(), Some("a"));
        let r2 = client.chat(req).await.unwrap();
        assert_eq!(r2.first_message().unwrap().content.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn sticks_to_last_response_once_exhausted() {
        let client = MockChatClient::new(vec![stop_response("only")]);
        let req = ChatRequest { model: "m".into(), messages: vec![], max_tokens: 10, tools: None };
        client.chat(req.clone()).await.unwrap();
        let r2 = client.chat(req).await.unwrap();
        assert_eq!(r2.first_message().unwrap().content.as_deref(), Some("only"));
        assert_eq!(client.call_count(), 2);
    }
}
