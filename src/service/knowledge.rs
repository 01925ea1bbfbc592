//! Knowledge hub actions.
//!
//! The only path that substitutes data on failure: a malformed, invalid or
//! sentinel analysis still stores a draft fallback record that can be
//! retried later. Upstream and timeout failures propagate.

use tracing::{info, warn};

use super::SharedContext;
use crate::ai::validation::ResourcePayload;
use crate::constants::storage as collections;
use crate::mapper::{FileUpload, fallback_resource, file_resource, map_resource, new_resource_id};
use crate::storage::KnowledgeRepository;
use crate::types::{
    EntityKey, HubError, KnowledgeResource, Result, ResourceStatus, ValidationError, now_rfc3339,
};

pub struct KnowledgeService {
    ctx: SharedContext,
    repo: KnowledgeRepository,
}

impl KnowledgeService {
    pub fn new(ctx: SharedContext, repo: KnowledgeRepository) -> Self {
        Self { ctx, repo }
    }

    pub fn list(&self) -> Result<Vec<KnowledgeResource>> {
        self.repo.list()
    }

    pub fn get(&self, id: &str) -> Result<KnowledgeResource> {
        self.repo.get(id)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.repo.delete(id)
    }

    /// Analyze a URL and store the result, or a fallback draft when the
    /// model's answer is unusable.
    pub async fn add_from_url(&self, url: &str) -> Result<KnowledgeResource> {
        let id = new_resource_id();
        let resource = self.analyze(id, url).await?;
        self.repo.insert(&resource)?;
        info!("Added resource {} ({})", resource.id, resource.title());
        Ok(resource)
    }

    /// Store a local record for an uploaded file
    pub fn add_from_file(&self, upload: &FileUpload) -> Result<KnowledgeResource> {
        let resource = file_resource(new_resource_id(), upload);
        self.repo.insert(&resource)?;
        info!("Added uploaded file {} as {}", upload.name, resource.id);
        Ok(resource)
    }

    /// Re-run analysis for a stored resource, keeping its id and original URL.
    ///
    /// The record moves to `draft` before the call and ends `active` or
    /// `draft` depending on the outcome.
    pub async fn retry(&self, id: &str) -> Result<KnowledgeResource> {
        let mut existing = self.repo.get(id)?;
        let url = existing
            .original_url()
            .map(str::to_string)
            .ok_or_else(|| ValidationError::missing("managementInfo.originalFileUrl"))?;

        let token = self
            .ctx
            .inflight
            .begin(EntityKey::new(collections::KNOWLEDGE, id));

        existing.management_info.status = ResourceStatus::Draft;
        existing.management_info.last_updated = now_rfc3339();
        self.repo.update(&existing)?;

        let outcome = async {
            let refreshed = self.analyze(id.to_string(), &url).await?;
            self.ctx.inflight.ensure_current(&token)?;
            // Deleted meanwhile
            self.repo.get(id)?;
            self.repo.update(&refreshed)?;
            Ok(refreshed)
        }
        .await;

        self.ctx.inflight.finish(&token);
        outcome
    }

    async fn analyze(&self, id: String, url: &str) -> Result<KnowledgeResource> {
        let request = self.ctx.resource_request(url);
        let raw = self.ctx.complete(request, "resource analysis").await?;

        match self.ctx.normalizer.normalize::<ResourcePayload>(&raw) {
            Ok(payload) => Ok(map_resource(payload, id, url)),
            Err(HubError::AnalysisFailed { reason }) => {
                warn!("Resource analysis refused for {}: {}", url, reason);
                Ok(fallback_resource(id, url, &reason))
            }
            Err(e) if e.is_malformed() => {
                warn!("Unusable resource analysis for {}: {}", url, e);
                Ok(fallback_resource(id, url, ""))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::scripted::ScriptedClient;
    use crate::constants::fallback;
    use crate::service::test_support::{context, memory_store};
    use crate::types::{AnalysisOutcome, ErrorCategory, LlmError};
    use std::sync::Arc;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    const ANALYSIS: &str = r#"{
        "basicInfo": {"title": "Rust 비동기 입문", "summary": "요약", "level": "INTERMEDIATE", "tags": ["rust"], "contentType": "video"},
        "metadata": {"duration": "15:30", "language": "Korean", "category": "개발"},
        "searchOptimization": {"keywords": ["tokio"], "chapters": [{"title": "소개", "timestamp": "00:00-05:00", "summary": "s"}]},
        "managementInfo": {"status": "active", "visibility": "team", "originalFileUrl": "https://elsewhere.example"}
    }"#;

    fn service(client: Arc<ScriptedClient>) -> KnowledgeService {
        KnowledgeService::new(context(client), KnowledgeRepository::new(memory_store()))
    }

    #[tokio::test]
    async fn test_add_from_url_maps_and_stores() {
        let client = Arc::new(ScriptedClient::new().reply(ANALYSIS));
        let knowledge = service(client.clone());

        let resource = knowledge.add_from_url(URL).await.unwrap();

        assert_eq!(resource.original_url(), Some(URL));
        assert_eq!(resource.metadata.duration, Some(930));
        assert_eq!(resource.management_info.status, ResourceStatus::Active);
        assert_eq!(knowledge.get(&resource.id).unwrap(), resource);

        let request = &client.requests()[0];
        assert!(request.grounding);
        assert!(request.prompt.contains("dQw4w9WgXcQ"));
    }

    #[tokio::test]
    async fn test_sentinel_stores_draft_fallback() {
        let client = Arc::new(ScriptedClient::new().reply(
            r#"{"error": "Analysis failed", "reason": "Insufficient content or metadata available at the provided URL."}"#,
        ));
        let knowledge = service(client);

        let resource = knowledge.add_from_url(URL).await.unwrap();

        assert_eq!(resource.title(), fallback::FAILURE_TITLE);
        assert_eq!(resource.management_info.status, ResourceStatus::Draft);
        assert!(resource.search_optimization.keywords.is_empty());
        assert!(resource.search_optimization.chapters.is_empty());
        assert_eq!(resource.original_url(), Some(URL));
        assert!(matches!(
            resource.analysis,
            AnalysisOutcome::Failed { ref reason } if reason.contains("Insufficient")
        ));
        assert_eq!(knowledge.list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_stores_fallback() {
        let client = Arc::new(ScriptedClient::new().reply("죄송합니다, 분석할 수 없습니다."));
        let knowledge = service(client);

        let resource = knowledge.add_from_url(URL).await.unwrap();
        assert_eq!(resource.title(), fallback::FAILURE_TITLE);
        assert_eq!(resource.original_url(), Some(URL));
        assert!(resource.is_failed());
    }

    #[tokio::test]
    async fn test_upstream_failure_stores_nothing() {
        let client = Arc::new(ScriptedClient::new().fail(
            LlmError::new(ErrorCategory::RateLimit, "429").into(),
        ));
        let knowledge = service(client);

        let err = knowledge.add_from_url(URL).await.unwrap_err();
        assert!(matches!(err, HubError::ModelUnavailable(_)));
        assert!(knowledge.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retry_keeps_id_and_url() {
        let client = Arc::new(
            ScriptedClient::new()
                .reply("not json at all")
                .reply(ANALYSIS),
        );
        let knowledge = service(client);

        let failed = knowledge.add_from_url(URL).await.unwrap();
        assert!(failed.is_failed());

        let retried = knowledge.retry(&failed.id).await.unwrap();
        assert_eq!(retried.id, failed.id);
        assert_eq!(retried.original_url(), Some(URL));
        assert_eq!(retried.analysis, AnalysisOutcome::Succeeded);
        assert_eq!(retried.management_info.status, ResourceStatus::Active);
        assert_eq!(knowledge.list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_failure_leaves_draft() {
        let client = Arc::new(
            ScriptedClient::new()
                .reply(ANALYSIS)
                .fail(LlmError::new(ErrorCategory::Network, "reset").into()),
        );
        let knowledge = service(client);
        let resource = knowledge.add_from_url(URL).await.unwrap();

        assert!(knowledge.retry(&resource.id).await.is_err());
        let stored = knowledge.get(&resource.id).unwrap();
        assert_eq!(stored.management_info.status, ResourceStatus::Draft);
        assert_eq!(stored.title(), resource.title());
    }

    #[tokio::test]
    async fn test_retry_missing_resource() {
        let knowledge = service(Arc::new(ScriptedClient::new()));
        assert!(matches!(
            knowledge.retry("r0").await,
            Err(HubError::EntityNotFound { .. })
        ));
    }

    #[test]
    fn test_add_from_file() {
        let knowledge = service(Arc::new(ScriptedClient::new()));
        let upload = FileUpload {
            name: "회의록.pdf".into(),
            mime_type: "application/pdf".into(),
            size: 10,
            location: "/tmp/회의록.pdf".into(),
        };

        let resource = knowledge.add_from_file(&upload).unwrap();
        assert_eq!(resource.title(), "회의록");
        assert_eq!(resource.analysis, AnalysisOutcome::NotRequested);
        assert_eq!(knowledge.list().unwrap()[0].id, resource.id);
    }
}
