//! Scripted completion client for tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::{ChatStream, ChatTurn, CompletionClient, CompletionRequest, Preamble, StreamEvent};
use crate::types::{HubError, Result};

type Reply = (Duration, Result<String>);

/// Replays queued replies in call order and records every request.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    stream_events: Mutex<Vec<StreamEvent>>,
    requests: Mutex<Vec<CompletionRequest>>,
    chats: Mutex<Vec<(Vec<ChatTurn>, String, Preamble)>>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, text: &str) -> Self {
        self.push(Duration::ZERO, Ok(text.to_string()));
        self
    }

    pub(crate) fn reply_after(self, delay: Duration, text: &str) -> Self {
        self.push(delay, Ok(text.to_string()));
        self
    }

    pub(crate) fn fail(self, err: HubError) -> Self {
        self.push(Duration::ZERO, Err(err));
        self
    }

    pub(crate) fn stream(self, events: Vec<StreamEvent>) -> Self {
        *self.stream_events.lock().unwrap() = events;
        self
    }

    fn push(&self, delay: Duration, reply: Result<String>) {
        self.replies.lock().unwrap().push_back((delay, reply));
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn chats(&self) -> Vec<(Vec<ChatTurn>, String, Preamble)> {
        self.chats.lock().unwrap().clone()
    }

    async fn next_reply(&self) -> Result<String> {
        let next = self.replies.lock().unwrap().pop_front();
        let (delay, reply) = next.unwrap_or_else(|| {
            (
                Duration::ZERO,
                Err(HubError::MalformedResponse("no scripted reply left".into())),
            )
        });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.next_reply().await
    }

    async fn chat(
        &self,
        history: &[ChatTurn],
        new_turn: &str,
        preamble: &Preamble,
    ) -> Result<String> {
        self.chats
            .lock()
            .unwrap()
            .push((history.to_vec(), new_turn.to_string(), preamble.clone()));
        self.next_reply().await
    }

    fn stream_chat(&self, _history: &[ChatTurn], _message: ChatTurn, _model: &str) -> ChatStream {
        let events = self.stream_events.lock().unwrap().clone();
        Box::pin(futures::stream::iter(events))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
