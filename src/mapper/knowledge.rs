//! Knowledge resource construction: analyzed, fallback and uploaded records.

use uuid::Uuid;

use crate::ai::validation::ResourcePayload;
use crate::constants::fallback;
use crate::types::{
    AnalysisOutcome, BasicInfo, Chapter, ContentType, KnowledgeResource, Level, ManagementInfo,
    ResourceMetadata, ResourceStatus, SearchOptimization, Visibility, now_millis, now_rfc3339,
};

/// Id for a new resource: `r{millis}-{suffix}`
pub fn new_resource_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("r{}-{}", now_millis(), &suffix[..8])
}

/// Successful analysis. `url` always wins over any URL the model echoed back.
pub fn map_resource(payload: ResourcePayload, id: String, url: &str) -> KnowledgeResource {
    KnowledgeResource {
        id,
        basic_info: BasicInfo {
            title: payload.title,
            summary: payload.summary,
            level: Level::coerce(payload.level.as_deref()),
            tags: payload.tags,
            author: payload.author,
            content_type: ContentType::coerce(payload.content_type.as_deref()),
        },
        metadata: ResourceMetadata {
            duration: (payload.duration > 0).then_some(payload.duration),
            language: payload.language,
            category: payload.category,
            sub_category: payload.sub_category,
            uploaded_at: payload.uploaded_at,
            department: payload.department,
        },
        search_optimization: SearchOptimization {
            keywords: payload.keywords,
            searchable_text: payload.searchable_text,
            chapters: payload
                .chapters
                .into_iter()
                .map(|c| Chapter {
                    title: c.title,
                    timestamp: c.timestamp,
                    summary: c.summary,
                })
                .collect(),
        },
        management_info: ManagementInfo {
            status: ResourceStatus::Active,
            visibility: Visibility::coerce(payload.visibility.as_deref()),
            original_file_url: Some(url.to_string()),
            thumbnail_url: payload.thumbnail_url,
            file_size: payload.file_size,
            last_updated: now_rfc3339(),
        },
        analysis: AnalysisOutcome::Succeeded,
    }
}

/// Draft record standing in for a failed analysis, retryable from `url`.
pub fn fallback_resource(id: String, url: &str, reason: &str) -> KnowledgeResource {
    let summary = if reason.trim().is_empty() {
        fallback::FAILURE_SUMMARY.to_string()
    } else {
        format!("{} ({})", fallback::FAILURE_SUMMARY, reason.trim())
    };
    let now = now_rfc3339();

    KnowledgeResource {
        id,
        basic_info: BasicInfo {
            title: fallback::FAILURE_TITLE.to_string(),
            summary,
            level: Level::Beginner,
            tags: Vec::new(),
            author: None,
            content_type: ContentType::Article,
        },
        metadata: ResourceMetadata {
            category: Some(fallback::FAILURE_CATEGORY.to_string()),
            uploaded_at: Some(now.clone()),
            ..Default::default()
        },
        search_optimization: SearchOptimization::default(),
        management_info: ManagementInfo {
            status: ResourceStatus::Draft,
            visibility: Visibility::Private,
            original_file_url: Some(url.to_string()),
            thumbnail_url: None,
            file_size: None,
            last_updated: now,
        },
        analysis: AnalysisOutcome::Failed {
            reason: reason.to_string(),
        },
    }
}

/// Metadata of an uploaded file
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// File name including extension
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// Where the file can be opened again
    pub location: String,
}

impl FileUpload {
    fn is_video(&self) -> bool {
        self.mime_type.starts_with("video")
    }

    /// Name up to the first dot
    fn stem(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }
}

/// Local record for an uploaded file. Nothing is sent to the model.
pub fn file_resource(id: String, upload: &FileUpload) -> KnowledgeResource {
    let title = upload.stem().to_string();
    let is_video = upload.is_video();
    let now = now_rfc3339();

    KnowledgeResource {
        id,
        basic_info: BasicInfo {
            title: title.clone(),
            summary: format!(
                "업로드된 파일({})에 대한 AI 자동 분석 결과입니다. 파일의 주요 내용을 요약하고 핵심 정보를 추출했습니다.",
                upload.name
            ),
            level: Level::Intermediate,
            tags: vec![
                "File".to_string(),
                if is_video { "Video" } else { "Document" }.to_string(),
                "Upload".to_string(),
            ],
            author: Some("User Upload".to_string()),
            content_type: if is_video {
                ContentType::Video
            } else {
                ContentType::Document
            },
        },
        metadata: ResourceMetadata {
            duration: is_video.then_some(300),
            language: None,
            category: Some(fallback::FAILURE_CATEGORY.to_string()),
            sub_category: Some("자료실".to_string()),
            uploaded_at: Some(now.clone()),
            department: Some("개인".to_string()),
        },
        search_optimization: SearchOptimization {
            keywords: vec![title, "Upload".to_string(), "Analysis".to_string()],
            searchable_text: None,
            chapters: Vec::new(),
        },
        management_info: ManagementInfo {
            status: ResourceStatus::Active,
            visibility: Visibility::Private,
            original_file_url: Some(upload.location.clone()),
            thumbnail_url: None,
            file_size: Some(upload.size),
            last_updated: now,
        },
        analysis: AnalysisOutcome::NotRequested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::validation::ChapterItem;

    #[test]
    fn test_map_resource_overwrites_url() {
        let payload = ResourcePayload {
            title: "Async Rust".into(),
            level: Some("advanced".into()),
            content_type: Some("video".into()),
            duration: 930,
            chapters: vec![ChapterItem {
                title: "Intro".into(),
                timestamp: "00:00-05:00".into(),
                summary: String::new(),
            }],
            ..Default::default()
        };

        let resource = map_resource(payload, "r1".into(), "https://youtu.be/abcdefghijk");

        assert_eq!(resource.original_url(), Some("https://youtu.be/abcdefghijk"));
        assert_eq!(resource.basic_info.level, Level::Advanced);
        assert_eq!(resource.metadata.duration, Some(930));
        assert_eq!(resource.management_info.status, ResourceStatus::Active);
        assert_eq!(resource.analysis, AnalysisOutcome::Succeeded);
    }

    #[test]
    fn test_map_resource_defaults() {
        let payload = ResourcePayload {
            title: "Notes".into(),
            ..Default::default()
        };
        let resource = map_resource(payload, "r2".into(), "https://example.com");

        assert_eq!(resource.basic_info.level, Level::Beginner);
        assert_eq!(resource.basic_info.content_type, ContentType::Article);
        assert_eq!(resource.metadata.duration, None);
        assert_eq!(resource.management_info.visibility, Visibility::Private);
    }

    #[test]
    fn test_fallback_resource() {
        let resource = fallback_resource("r3".into(), "https://example.com/x", "No captions");

        assert_eq!(resource.title(), fallback::FAILURE_TITLE);
        assert!(resource.basic_info.summary.starts_with(fallback::FAILURE_SUMMARY));
        assert!(resource.basic_info.summary.contains("No captions"));
        assert!(resource.search_optimization.keywords.is_empty());
        assert!(resource.search_optimization.chapters.is_empty());
        assert_eq!(resource.management_info.status, ResourceStatus::Draft);
        assert_eq!(resource.original_url(), Some("https://example.com/x"));
        assert!(resource.is_failed());
    }

    #[test]
    fn test_file_resource() {
        let upload = FileUpload {
            name: "demo.final.mp4".into(),
            mime_type: "video/mp4".into(),
            size: 2048,
            location: "/tmp/demo.final.mp4".into(),
        };
        let resource = file_resource("r4".into(), &upload);

        assert_eq!(resource.title(), "demo");
        assert_eq!(resource.basic_info.content_type, ContentType::Video);
        assert_eq!(resource.metadata.duration, Some(300));
        assert_eq!(resource.management_info.file_size, Some(2048));
        assert_eq!(resource.analysis, AnalysisOutcome::NotRequested);

        let doc = FileUpload {
            mime_type: "application/pdf".into(),
            ..upload
        };
        let resource = file_resource("r5".into(), &doc);
        assert_eq!(resource.basic_info.content_type, ContentType::Document);
        assert_eq!(resource.metadata.duration, None);
        assert_eq!(resource.basic_info.tags[1], "Document");
    }

    #[test]
    fn test_resource_ids_unique() {
        assert_ne!(new_resource_id(), new_resource_id());
        assert!(new_resource_id().starts_with('r'));
    }
}
