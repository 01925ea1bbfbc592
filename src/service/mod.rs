//! Action Handlers
//!
//! One method per user action. Each sequences prompt, completion client,
//! normalizer, mapper and repository, and owns the stale-response guard for
//! the entity it touches. Errors reach the caller typed; `HubError::user_message`
//! renders them.

mod assistant;
mod inflight;
mod knowledge;
mod tasks;
mod video;

pub use assistant::AssistantService;
pub use inflight::{InFlightRegistry, InFlightToken};
pub use knowledge::KnowledgeService;
pub use tasks::TaskService;
pub use video::VideoService;

use std::sync::Arc;

use crate::ai::{
    CompletionRequest, ResponseNormalizer, SharedClient, TimeoutConfig, prompt, with_timeout,
};
use crate::config::{AiConfig, Config};
use crate::storage::{
    HistoryRepository, KnowledgeRepository, SharedStore, TaskRepository, open_store,
};
use crate::types::Result;

/// Dependencies shared by every action handler
pub struct ServiceContext {
    pub client: SharedClient,
    pub ai: AiConfig,
    pub timeouts: TimeoutConfig,
    pub normalizer: ResponseNormalizer,
    pub inflight: InFlightRegistry,
}

pub type SharedContext = Arc<ServiceContext>;

impl ServiceContext {
    pub fn new(client: SharedClient, ai: AiConfig) -> Self {
        Self {
            client,
            timeouts: TimeoutConfig::from_secs(ai.timeout_secs),
            ai,
            normalizer: ResponseNormalizer::new(),
            inflight: InFlightRegistry::new(),
        }
    }

    /// Single-shot completion under the completion deadline
    pub(crate) async fn complete(
        &self,
        request: CompletionRequest,
        operation: &str,
    ) -> Result<String> {
        tracing::debug!(
            "{}: {} via {} ({} prompt chars)",
            operation,
            request.model,
            self.client.name(),
            request.prompt.len()
        );
        with_timeout(
            self.timeouts.completion,
            self.client.complete(&request),
            operation,
        )
        .await
    }

    /// JSON request on the smart model
    pub(crate) fn smart_json(&self, prompt: String) -> CompletionRequest {
        CompletionRequest::new(prompt, self.ai.model_smart.clone())
            .json()
            .temperature(self.ai.temperature)
            .max_output_tokens(self.ai.max_output_tokens)
    }

    /// Grounded resource analysis request for `url`
    pub(crate) fn resource_request(&self, url: &str) -> CompletionRequest {
        let video_id = prompt::extract_youtube_video_id(url);
        let text = prompt::build_resource_analysis_prompt(url, video_id.as_deref());
        CompletionRequest::new(text, self.ai.model_resource.clone())
            .json()
            .grounded(self.ai.grounding)
            .temperature(self.ai.resource_temperature)
            .max_output_tokens(self.ai.max_output_tokens)
    }
}

/// All action handlers wired to one client and one store
pub struct Services {
    pub tasks: TaskService,
    pub knowledge: KnowledgeService,
    pub video: VideoService,
    pub assistant: AssistantService,
}

impl Services {
    pub fn new(client: SharedClient, ai: AiConfig, store: SharedStore) -> Result<Self> {
        let ctx: SharedContext = Arc::new(ServiceContext::new(client, ai));
        Ok(Self {
            tasks: TaskService::new(ctx.clone(), TaskRepository::new(store.clone())),
            knowledge: KnowledgeService::new(ctx.clone(), KnowledgeRepository::new(store.clone())),
            video: VideoService::new(ctx.clone(), Arc::new(HistoryRepository::new(store)?)),
            assistant: AssistantService::new(ctx),
        })
    }

    /// Wire everything from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = crate::ai::create_client(&config.ai)?;
        let store = open_store(&config.storage)?;
        Self::new(client, config.ai.clone(), store)
    }
}
