//! Knowledge hub resources.
//!
//! A resource is either the mapped result of an AI analysis of a URL, a
//! fallback record describing a failed analysis, or a local record created
//! from an uploaded file. [`AnalysisOutcome`] tells them apart explicitly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn coerce(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("INTERMEDIATE") => Level::Intermediate,
            Some("ADVANCED") => Level::Advanced,
            _ => Level::Beginner,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    #[default]
    Article,
    Document,
    Other,
}

impl ContentType {
    pub fn coerce(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("video") => ContentType::Video,
            Some("document") => ContentType::Document,
            Some("other") => ContentType::Other,
            _ => ContentType::Article,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Active,
    #[default]
    Draft,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Team,
    #[default]
    Private,
}

impl Visibility {
    pub fn coerce(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("public") => Visibility::Public,
            Some("team") => Visibility::Team,
            _ => Visibility::Private,
        }
    }
}

/// How the resource content came to be
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum AnalysisOutcome {
    Succeeded,
    Failed { reason: String },
    /// Local record built from file metadata, never sent to the model
    NotRequested,
}

impl AnalysisOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, AnalysisOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub content_type: ContentType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    /// RFC 3339
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    /// `MM:SS-MM:SS` range
    pub timestamp: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptimization {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searchable_text: Option<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementInfo {
    #[serde(default)]
    pub status: ResourceStatus,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// RFC 3339
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeResource {
    pub id: String,
    pub basic_info: BasicInfo,
    #[serde(default)]
    pub metadata: ResourceMetadata,
    #[serde(default)]
    pub search_optimization: SearchOptimization,
    pub management_info: ManagementInfo,
    pub analysis: AnalysisOutcome,
}

impl KnowledgeResource {
    pub fn title(&self) -> &str {
        &self.basic_info.title
    }

    pub fn original_url(&self) -> Option<&str> {
        self.management_info.original_file_url.as_deref()
    }

    pub fn is_failed(&self) -> bool {
        self.analysis.is_failed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_and_content_type_defaults() {
        assert_eq!(Level::coerce(None), Level::Beginner);
        assert_eq!(Level::coerce(Some("advanced")), Level::Advanced);
        assert_eq!(ContentType::coerce(None), ContentType::Article);
        assert_eq!(ContentType::coerce(Some("Video")), ContentType::Video);
    }

    #[test]
    fn test_outcome_serialization() {
        let failed = AnalysisOutcome::Failed {
            reason: "no captions".into(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["reason"], "no captions");

        let ok: AnalysisOutcome = serde_json::from_str(r#"{"state":"succeeded"}"#).unwrap();
        assert_eq!(ok, AnalysisOutcome::Succeeded);

        let local = serde_json::to_value(AnalysisOutcome::NotRequested).unwrap();
        assert_eq!(local["state"], "notRequested");
    }
}
