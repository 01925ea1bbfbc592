//! AI Integration Layer
//!
//! Prompt builders, the completion client and response normalization.

pub mod prompt;
pub mod provider;
pub mod timeout;
pub mod validation;

pub use prompt::{PromptBuilder, PromptSection, extract_youtube_video_id};
pub use provider::{
    ChatStream, CompletionClient, CompletionRequest, GeminiClient, Preamble, SharedClient,
    StreamEvent, create_client,
};
pub use timeout::{TimeoutConfig, with_timeout};
pub use validation::{Contract, JsonRepairer, ResponseNormalizer};
