//! Video analysis history entries.

use serde::{Deserialize, Serialize};

/// Time-bounded segment of an analyzed video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    /// Seconds
    pub start_time: u64,
    /// Seconds
    pub end_time: u64,
}

/// One persisted video analysis. Entries are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisHistoryItem {
    pub id: String,
    /// URL or uploaded filename
    pub source: String,
    pub title: String,
    pub overall_summary: String,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// RFC 3339 UTC
    pub analyzed_at: String,
}
