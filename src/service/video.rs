//! Video analysis actions. Results go to the append-only history.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use super::SharedContext;
use crate::ai::CompletionRequest;
use crate::ai::prompt::{build_quick_summary_prompt, build_video_frames_prompt};
use crate::ai::validation::{FramesPayload, ResourcePayload};
use crate::mapper::{map_frames_analysis, map_url_analysis};
use crate::storage::HistoryRepository;
use crate::types::{
    AnalysisHistoryItem, InlineImage, Result, ValidationError, ValidationErrorKind,
};

pub struct VideoService {
    ctx: SharedContext,
    history: Arc<HistoryRepository>,
}

impl VideoService {
    pub fn new(ctx: SharedContext, history: Arc<HistoryRepository>) -> Self {
        Self { ctx, history }
    }

    /// Detailed analysis of a video URL. Failures are reported, never stored.
    pub async fn analyze_url(&self, url: &str) -> Result<AnalysisHistoryItem> {
        let request = self.ctx.resource_request(url);
        let raw = self.ctx.complete(request, "video analysis").await?;
        let payload: ResourcePayload = self.ctx.normalizer.normalize(&raw)?;

        let item = map_url_analysis(&payload, url);
        self.history.append(&item)?;
        info!("Stored analysis {} for {}", item.id, url);
        Ok(item)
    }

    /// Analysis of frames sampled from an uploaded video
    pub async fn analyze_frames(
        &self,
        file_name: &str,
        frames: Vec<InlineImage>,
        duration_secs: f64,
    ) -> Result<AnalysisHistoryItem> {
        if frames.is_empty() {
            return Err(ValidationError::new(
                ValidationErrorKind::Range,
                "at least one frame is required",
            )
            .with_field("frames")
            .into());
        }

        let prompt = build_video_frames_prompt(frames.len(), duration_secs);
        let request = self.ctx.smart_json(prompt).images(frames);
        let raw = self.ctx.complete(request, "frame analysis").await?;
        let payload: FramesPayload = self.ctx.normalizer.normalize(&raw)?;

        let item = map_frames_analysis(payload, file_name);
        self.history.append(&item)?;
        info!("Stored frame analysis {} for {}", item.id, file_name);
        Ok(item)
    }

    /// Free-text markdown summary on the fast model. Not stored.
    pub async fn quick_summary(&self, url: &str) -> Result<String> {
        let request = CompletionRequest::new(
            build_quick_summary_prompt(url),
            self.ctx.ai.model_fast.clone(),
        )
        .temperature(self.ctx.ai.temperature)
        .max_output_tokens(self.ctx.ai.max_output_tokens);

        let text = self.ctx.complete(request, "quick summary").await?;
        Ok(text.trim().to_string())
    }

    /// Newest first
    pub fn history(&self) -> Result<Vec<AnalysisHistoryItem>> {
        self.history.list()
    }

    pub fn get(&self, id: &str) -> Result<AnalysisHistoryItem> {
        self.history.get(id)
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<AnalysisHistoryItem>> {
        self.history.subscribe()
    }
}
