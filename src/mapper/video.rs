use uuid::Uuid;

use crate::ai::validation::{FramesPayload, ResourcePayload};
use crate::constants::fallback;
use crate::types::{AnalysisHistoryItem, Scene, now_rfc3339, parse_time_range};

/// History entry from a URL analysis. Chapters become scenes; keywords fall
/// back to tags when the model gave none.
pub fn map_url_analysis(payload: &ResourcePayload, source: &str) -> AnalysisHistoryItem {
    let title = if payload.title.trim().is_empty() {
        fallback::UNTITLED_VIDEO.to_string()
    } else {
        payload.title.clone()
    };
    let keywords = if payload.keywords.is_empty() {
        payload.tags.clone()
    } else {
        payload.keywords.clone()
    };

    AnalysisHistoryItem {
        id: Uuid::new_v4().to_string(),
        source: source.to_string(),
        title,
        overall_summary: payload.summary.clone(),
        scenes: payload
            .chapters
            .iter()
            .map(|chapter| {
                let (start_time, end_time) = parse_time_range(&chapter.timestamp);
                Scene {
                    title: chapter.title.clone(),
                    summary: chapter.summary.clone(),
                    start_time,
                    end_time,
                }
            })
            .collect(),
        keywords,
        analyzed_at: now_rfc3339(),
    }
}

/// History entry from a frame analysis of an uploaded file
pub fn map_frames_analysis(payload: FramesPayload, file_name: &str) -> AnalysisHistoryItem {
    AnalysisHistoryItem {
        id: Uuid::new_v4().to_string(),
        source: file_name.to_string(),
        title: file_name.to_string(),
        overall_summary: payload.overall_summary,
        scenes: payload
            .scenes
            .into_iter()
            .map(|scene| Scene {
                title: scene.title,
                summary: scene.summary,
                start_time: scene.start_time,
                end_time: scene.end_time,
            })
            .collect(),
        keywords: payload.keywords,
        analyzed_at: now_rfc3339(),
    }
}
