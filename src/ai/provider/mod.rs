//! Completion Client Abstraction
//!
//! Defines the [`CompletionClient`] trait used by every action handler.
//! One implementation talks to the Gemini REST API; tests use a scripted double.
//!
//! ## Operations
//!
//! - `complete`: single-shot prompt, optional JSON hint, grounding and images
//! - `chat`: multi-turn reply, seeded with a preamble and a canned acknowledgment
//! - `stream_chat`: lazy stream of text chunks; failures arrive as one
//!   `StreamEvent::Error` followed by the end of the stream

mod gemini;
#[cfg(test)]
pub(crate) mod scripted;
mod sse;

pub use gemini::GeminiClient;

// Re-export error types from centralized location
pub use crate::types::{ChatRole, ChatTurn, ErrorCategory, ErrorClassifier, InlineImage, LlmError};

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use std::sync::Arc;

use crate::ai::prompt::{build_assistant_preamble, build_chat_system_prompt};
use crate::config::AiConfig;
use crate::constants::{ai, chat};
use crate::types::{Result, Task};

// =============================================================================
// Requests
// =============================================================================

/// Single-shot completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Model identifier; empty selects the client's default model
    pub model: String,
    /// e.g. `application/json`
    pub response_mime_type: Option<String>,
    /// Optional response schema hint
    pub response_schema: Option<Value>,
    /// Enable Google Search grounding
    pub grounding: bool,
    /// Images sent after the prompt text
    pub images: Vec<InlineImage>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Ask for JSON output
    pub fn json(mut self) -> Self {
        self.response_mime_type = Some(ai::JSON_MIME_TYPE.to_string());
        self
    }

    pub fn schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn grounded(mut self, enabled: bool) -> Self {
        self.grounding = enabled;
        self
    }

    pub fn images(mut self, images: Vec<InlineImage>) -> Self {
        self.images = images;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }
}

/// Priming turn pair placed at the head of a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    pub instruction: String,
    pub acknowledgment: String,
}

impl Preamble {
    pub fn new(instruction: impl Into<String>, acknowledgment: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            acknowledgment: acknowledgment.into(),
        }
    }

    /// Guide chat anchored to one task
    pub fn for_task(task: &Task) -> Self {
        Self::new(build_chat_system_prompt(task), chat::TASK_CHAT_ACK)
    }

    /// General assistant persona
    pub fn assistant() -> Self {
        Self::new(build_assistant_preamble(), chat::ASSISTANT_ACK)
    }

    /// Preamble turns followed by a copy of `history`. The input is not mutated.
    pub fn seed(&self, history: &[ChatTurn]) -> Vec<ChatTurn> {
        let mut turns = Vec::with_capacity(history.len() + 2);
        turns.push(ChatTurn::user(self.instruction.clone()));
        turns.push(ChatTurn::model(self.acknowledgment.clone()));
        turns.extend_from_slice(history);
        turns
    }
}

// =============================================================================
// Streaming
// =============================================================================

/// One item of a streamed reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Text(String),
    /// Terminal failure; nothing follows it
    Error(String),
}

/// Forward-only, non-restartable reply stream. Dropping it cancels the request.
pub type ChatStream = BoxStream<'static, StreamEvent>;

// =============================================================================
// Client Trait
// =============================================================================

/// Shared client type for concurrent access across action handlers
pub type SharedClient = Arc<dyn CompletionClient>;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Single-shot completion. Upstream failure is `HubError::ModelUnavailable`.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Reply to `new_turn` given `history`, seeded with `preamble`.
    async fn chat(&self, history: &[ChatTurn], new_turn: &str, preamble: &Preamble)
    -> Result<String>;

    /// Streamed assistant reply. `message` may carry an inline image.
    /// An empty `model` selects the client's default model.
    fn stream_chat(&self, history: &[ChatTurn], message: ChatTurn, model: &str) -> ChatStream;

    /// Client name for logging
    fn name(&self) -> &str;
}

/// Create the shared client from configuration
pub fn create_client(config: &AiConfig) -> Result<SharedClient> {
    Ok(Arc::new(GeminiClient::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_prepends_preamble_without_mutating() {
        let history = vec![ChatTurn::user("hi"), ChatTurn::model("hello")];
        let preamble = Preamble::new("System: help", "ok");

        let seeded = preamble.seed(&history);

        assert_eq!(history.len(), 2);
        assert_eq!(seeded.len(), 4);
        assert_eq!(seeded[0], ChatTurn::user("System: help"));
        assert_eq!(seeded[1], ChatTurn::model("ok"));
        assert_eq!(&seeded[2..], &history[..]);
    }

    #[test]
    fn test_task_preamble_uses_task_ack() {
        let mut task = Task::new("Write release notes");
        task.description = "v2.1".into();
        let preamble = Preamble::for_task(&task);

        assert!(preamble.instruction.contains("Write release notes"));
        assert_eq!(preamble.acknowledgment, chat::TASK_CHAT_ACK);
        assert_eq!(Preamble::assistant().acknowledgment, chat::ASSISTANT_ACK);
    }

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new("prompt", "gemini-test")
            .json()
            .grounded(true)
            .temperature(0.4)
            .max_output_tokens(100);

        assert_eq!(request.response_mime_type.as_deref(), Some("application/json"));
        assert!(request.grounding);
        assert_eq!(request.temperature, Some(0.4));
        assert_eq!(request.max_output_tokens, Some(100));
        assert!(request.images.is_empty());
    }
}
