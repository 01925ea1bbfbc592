//! Typed output contracts, one per JSON prompt.
//!
//! Each contract reads a parsed `Value` leniently (unknown fields ignored,
//! optional fields defaulted) but rejects shapes that cannot be mapped.
//! Violations are `HubError::Validation`.

use serde_json::Value;
use tracing::warn;

use crate::constants::prompt::DRAFT_COUNT;
use crate::types::{
    HubError, Result, SuggestedResource, ValidationError, ValidationErrorKind, format_seconds,
    json_non_empty, json_seconds, json_string, json_string_array,
};

/// A payload type checked against its prompt's output contract
pub trait Contract: Sized {
    /// Contract name for logs and errors
    const NAME: &'static str;

    fn from_value(value: Value) -> Result<Self>;
}

/// Reason carried by a `{"error": ..., "reason": ...}` failure object, if any.
///
/// Only a truthy `error` marks a failure; `false`, `""`, `0` and `null` do not.
pub fn detect_sentinel(value: &Value) -> Option<String> {
    let obj = value.as_object()?;
    let error = obj.get("error").filter(|e| is_truthy(e))?;
    let reason = obj
        .get("reason")
        .and_then(Value::as_str)
        .filter(|r| !r.trim().is_empty())
        .or_else(|| error.as_str())
        .unwrap_or("unknown reason");
    Some(reason.to_string())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn shape_error(contract: &str, expected: &str) -> HubError {
    ValidationError::new(
        ValidationErrorKind::Shape,
        format!("{} payload must be {}", contract, expected),
    )
    .into()
}

/// Accept a bare array or an object wrapping it under `key`
fn unwrap_array(value: Value, key: &str, contract: &str) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove(key) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(shape_error(
                contract,
                &format!("an array or an object with a '{}' array", key),
            )),
        },
        _ => Err(shape_error(contract, "an array")),
    }
}

fn require_object<'a>(
    value: &'a Value,
    contract: &str,
) -> Result<&'a serde_json::Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| shape_error(contract, "a JSON object"))
}

fn require_string(value: &Value, key: &str, field_path: &str) -> Result<String> {
    match value.get(key) {
        None | Some(Value::Null) => Err(ValidationError::missing(field_path).into()),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(ValidationError::new(
            ValidationErrorKind::MissingField,
            format!("'{}' is empty", field_path),
        )
        .with_field(field_path)
        .into()),
        Some(_) => Err(ValidationError::new(
            ValidationErrorKind::Type,
            format!("'{}' must be a string", field_path),
        )
        .with_field(field_path)
        .into()),
    }
}

// =============================================================================
// Drafts
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DraftItem {
    pub title: String,
    pub description: Option<String>,
    /// Raw priority text, coerced by the mapper
    pub priority: Option<String>,
    pub product: Option<String>,
    pub task_type: Option<String>,
    pub style_tag: Option<String>,
}

/// `[{title, description, priority, product, type, styleTag}]`, exactly 3
#[derive(Debug, Clone, PartialEq)]
pub struct DraftsPayload(pub Vec<DraftItem>);

impl Contract for DraftsPayload {
    const NAME: &'static str = "drafts";

    fn from_value(value: Value) -> Result<Self> {
        let items = unwrap_array(value, "drafts", Self::NAME)?;
        if items.is_empty() {
            return Err(
                ValidationError::new(ValidationErrorKind::Range, "no drafts returned").into(),
            );
        }
        if items.len() != DRAFT_COUNT {
            warn!(
                "Expected {} drafts, got {}; keeping the first {}",
                DRAFT_COUNT,
                items.len(),
                DRAFT_COUNT.min(items.len())
            );
        }

        let drafts = items
            .iter()
            .take(DRAFT_COUNT)
            .enumerate()
            .map(|(i, item)| {
                if !item.is_object() {
                    return Err(shape_error(Self::NAME, "an array of objects"));
                }
                Ok(DraftItem {
                    title: require_string(item, "title", &format!("drafts[{}].title", i))?,
                    description: json_string(item, "description"),
                    priority: json_string(item, "priority"),
                    product: json_non_empty(item, "product"),
                    task_type: json_non_empty(item, "type"),
                    style_tag: json_non_empty(item, "styleTag"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self(drafts))
    }
}

// =============================================================================
// Task Analysis
// =============================================================================

/// `{strategy, suggestedResources[{title, url}]}`
#[derive(Debug, Clone, PartialEq)]
pub struct TaskAnalysisPayload {
    pub strategy: String,
    pub suggested_resources: Vec<SuggestedResource>,
}

impl Contract for TaskAnalysisPayload {
    const NAME: &'static str = "task analysis";

    fn from_value(value: Value) -> Result<Self> {
        require_object(&value, Self::NAME)?;
        let strategy = require_string(&value, "strategy", "strategy")?;

        let suggested_resources = value
            .get("suggestedResources")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let resource = json_non_empty(item, "title")
                            .zip(json_non_empty(item, "url"))
                            .map(|(title, url)| SuggestedResource { title, url });
                        if resource.is_none() {
                            warn!("Skipping suggested resource without title or url");
                        }
                        resource
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            strategy,
            suggested_resources,
        })
    }
}

// =============================================================================
// Subtasks
// =============================================================================

/// `[{title}]`; bare strings are accepted as titles
#[derive(Debug, Clone, PartialEq)]
pub struct SubtasksPayload(pub Vec<String>);

impl Contract for SubtasksPayload {
    const NAME: &'static str = "subtasks";

    fn from_value(value: Value) -> Result<Self> {
        let items = unwrap_array(value, "subtasks", Self::NAME)?;
        let titles = items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
                Value::Object(_) => {
                    require_string(item, "title", &format!("subtasks[{}].title", i))
                }
                _ => Err(shape_error(Self::NAME, "an array of {title} objects")),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(titles))
    }
}

// =============================================================================
// Resource Analysis
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ChapterItem {
    pub title: String,
    /// `MM:SS-MM:SS`, rebuilt from `startTime`/`endTime` when given that way
    pub timestamp: String,
    pub summary: String,
}

/// Resource analysis output, flattened from its four sections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePayload {
    pub title: String,
    pub summary: String,
    pub level: Option<String>,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub content_type: Option<String>,
    /// Seconds; zero means unknown
    pub duration: u64,
    pub language: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub uploaded_at: Option<String>,
    pub department: Option<String>,
    pub keywords: Vec<String>,
    pub searchable_text: Option<String>,
    pub chapters: Vec<ChapterItem>,
    pub visibility: Option<String>,
    pub thumbnail_url: Option<String>,
    pub file_size: Option<u64>,
}

impl Contract for ResourcePayload {
    const NAME: &'static str = "resource analysis";

    fn from_value(value: Value) -> Result<Self> {
        require_object(&value, Self::NAME)?;
        let basic = value
            .get("basicInfo")
            .filter(|b| b.is_object())
            .ok_or_else(|| ValidationError::missing("basicInfo"))?;
        let empty = Value::Object(Default::default());
        let metadata = value.get("metadata").unwrap_or(&empty);
        let search = value.get("searchOptimization").unwrap_or(&empty);
        let management = value.get("managementInfo").unwrap_or(&empty);

        let chapters = search
            .get("chapters")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(chapter_item).collect())
            .unwrap_or_default();

        Ok(Self {
            title: require_string(basic, "title", "basicInfo.title")?,
            summary: json_string(basic, "summary").unwrap_or_default(),
            level: json_non_empty(basic, "level"),
            tags: json_string_array(basic, "tags"),
            author: json_non_empty(basic, "author"),
            content_type: json_non_empty(basic, "contentType"),
            duration: json_seconds(metadata, "duration"),
            language: json_non_empty(metadata, "language"),
            category: json_non_empty(metadata, "category"),
            sub_category: json_non_empty(metadata, "subCategory"),
            uploaded_at: json_non_empty(metadata, "uploadedAt"),
            department: json_non_empty(metadata, "department"),
            keywords: json_string_array(search, "keywords"),
            searchable_text: json_non_empty(search, "searchableText"),
            chapters,
            visibility: json_non_empty(management, "visibility"),
            thumbnail_url: json_non_empty(management, "thumbnailUrl"),
            file_size: management.get("fileSize").and_then(Value::as_u64),
        })
    }
}

fn chapter_item(item: &Value) -> Option<ChapterItem> {
    let title = json_non_empty(item, "title")?;
    let timestamp = match json_non_empty(item, "timestamp") {
        Some(ts) => ts,
        None => format!(
            "{}-{}",
            format_seconds(json_seconds(item, "startTime")),
            format_seconds(json_seconds(item, "endTime"))
        ),
    };
    Some(ChapterItem {
        title,
        timestamp,
        summary: json_string(item, "summary").unwrap_or_default(),
    })
}

// =============================================================================
// Video Frames
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SceneItem {
    pub title: String,
    pub summary: String,
    pub start_time: u64,
    pub end_time: u64,
}

/// `{overallSummary, scenes[{title, summary, startTime, endTime}], keywords}`
#[derive(Debug, Clone, PartialEq)]
pub struct FramesPayload {
    pub overall_summary: String,
    pub scenes: Vec<SceneItem>,
    pub keywords: Vec<String>,
}

impl Contract for FramesPayload {
    const NAME: &'static str = "video frames";

    fn from_value(value: Value) -> Result<Self> {
        require_object(&value, Self::NAME)?;
        let overall_summary = require_string(&value, "overallSummary", "overallSummary")?;

        let scenes = match value.get("scenes") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| {
                    Some(SceneItem {
                        title: json_non_empty(item, "title")?,
                        summary: json_string(item, "summary").unwrap_or_default(),
                        start_time: json_seconds(item, "startTime"),
                        end_time: json_seconds(item, "endTime"),
                    })
                })
                .collect(),
            Some(_) => {
                return Err(ValidationError::new(
                    ValidationErrorKind::Type,
                    "'scenes' must be an array",
                )
                .with_field("scenes")
                .into());
            }
        };

        Ok(Self {
            overall_summary,
            scenes,
            keywords: json_string_array(&value, "keywords"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_time_range;
    use serde_json::json;

    #[test]
    fn test_detect_sentinel() {
        let value = json!({"error": "Analysis failed", "reason": "No captions"});
        assert_eq!(detect_sentinel(&value).as_deref(), Some("No captions"));

        let value = json!({"error": "Analysis failed"});
        assert_eq!(detect_sentinel(&value).as_deref(), Some("Analysis failed"));

        assert_eq!(detect_sentinel(&json!({"error": null, "title": "x"})), None);
        assert_eq!(detect_sentinel(&json!([{"error": "x"}])), None);

        assert_eq!(detect_sentinel(&json!({"error": true})).as_deref(), Some("unknown reason"));
        assert_eq!(detect_sentinel(&json!({"error": false, "strategy": "ok"})), None);
        assert_eq!(detect_sentinel(&json!({"error": "", "reason": "r"})), None);
        assert_eq!(detect_sentinel(&json!({"error": 0})), None);
    }

    #[test]
    fn test_drafts_bare_and_wrapped() {
        let items = json!([
            {"title": "A", "priority": "HIGH"},
            {"title": "B"},
            {"title": "C", "styleTag": "concise"}
        ]);
        let bare = DraftsPayload::from_value(items.clone()).unwrap();
        let wrapped = DraftsPayload::from_value(json!({"drafts": items})).unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare.0.len(), 3);
        assert_eq!(bare.0[2].style_tag.as_deref(), Some("concise"));
    }

    #[test]
    fn test_drafts_truncates_extra_and_rejects_empty() {
        let many = json!([{"title": "1"}, {"title": "2"}, {"title": "3"}, {"title": "4"}]);
        assert_eq!(DraftsPayload::from_value(many).unwrap().0.len(), 3);

        let err = DraftsPayload::from_value(json!([])).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_drafts_require_title() {
        let err = DraftsPayload::from_value(json!([{"description": "no title"}])).unwrap_err();
        assert!(err.to_string().contains("drafts[0].title"));
    }

    #[test]
    fn test_task_analysis_contract() {
        let payload = TaskAnalysisPayload::from_value(json!({
            "strategy": "## Plan",
            "suggestedResources": [
                {"title": "Docs", "url": "https://example.com"},
                {"title": "No url"}
            ]
        }))
        .unwrap();
        assert_eq!(payload.suggested_resources.len(), 1);

        assert!(TaskAnalysisPayload::from_value(json!({"suggestedResources": []})).is_err());
        assert!(TaskAnalysisPayload::from_value(json!(["strategy"])).is_err());
    }

    #[test]
    fn test_subtasks_contract() {
        let wrapped =
            SubtasksPayload::from_value(json!({"subtasks": [{"title": "a"}, "b"]})).unwrap();
        assert_eq!(wrapped.0, vec!["a", "b"]);

        assert!(SubtasksPayload::from_value(json!([1, 2])).is_err());
        assert!(SubtasksPayload::from_value(json!({"items": []})).is_err());
    }

    #[test]
    fn test_resource_contract_defaults() {
        let payload = ResourcePayload::from_value(json!({
            "basicInfo": {"title": "Rust intro"},
            "metadata": {"duration": "12:30"},
            "searchOptimization": {
                "chapters": [
                    {"title": "Start", "timestamp": "00:00-05:30", "summary": "s"},
                    {"title": "Pair", "startTime": "05:30", "endTime": "12:30"},
                    {"summary": "untitled"}
                ]
            }
        }))
        .unwrap();

        assert_eq!(payload.title, "Rust intro");
        assert_eq!(payload.level, None);
        assert_eq!(payload.duration, 750);
        assert_eq!(payload.chapters.len(), 2);
        assert_eq!(payload.chapters[1].timestamp, "05:30-12:30");
        assert!(payload.keywords.is_empty());
    }

    #[test]
    fn test_resource_chapter_numeric_times() {
        let payload = ResourcePayload::from_value(json!({
            "basicInfo": {"title": "Talk"},
            "searchOptimization": {
                "chapters": [
                    {"title": "Intro", "startTime": 0, "endTime": 330},
                    {"title": "Deep dive", "startTime": 330.2, "endTime": "01:02:03"}
                ]
            }
        }))
        .unwrap();

        assert_eq!(payload.chapters[0].timestamp, "00:00-05:30");
        assert_eq!(payload.chapters[1].timestamp, "05:30-1:02:03");
        assert_eq!(parse_time_range(&payload.chapters[0].timestamp), (0, 330));
    }

    #[test]
    fn test_resource_contract_requires_basic_info() {
        let err = ResourcePayload::from_value(json!({"metadata": {}})).unwrap_err();
        assert!(err.to_string().contains("basicInfo"));

        let err = ResourcePayload::from_value(json!({"basicInfo": {"title": 5}})).unwrap_err();
        assert!(matches!(err, HubError::Validation(ref v) if v.kind == ValidationErrorKind::Type));
    }

    #[test]
    fn test_frames_contract() {
        let payload = FramesPayload::from_value(json!({
            "overallSummary": "A cooking video",
            "scenes": [
                {"title": "Prep", "startTime": 0, "endTime": "01:10"},
                {"title": "Cook", "startTime": "70", "endTime": 180.4}
            ],
            "keywords": ["food"]
        }))
        .unwrap();

        assert_eq!(payload.scenes[0].end_time, 70);
        assert_eq!(payload.scenes[1].start_time, 70);
        assert_eq!(payload.scenes[1].end_time, 180);

        assert!(
            FramesPayload::from_value(json!({"overallSummary": "x", "scenes": "none"})).is_err()
        );
    }
}
