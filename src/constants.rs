//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers and fixed strings should be defined here with documentation.

/// Completion service defaults
pub mod ai {
    /// Default Gemini REST endpoint
    pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// Environment variable consulted when no key is configured
    pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

    /// Model used for drafting, task analysis and frame analysis
    pub const DEFAULT_MODEL_SMART: &str = "gemini-1.5-pro-preview";

    /// Model used for chat and quick summaries
    pub const DEFAULT_MODEL_FAST: &str = "gemini-1.5-pro-preview";

    /// Model used for grounded knowledge-resource analysis
    pub const DEFAULT_MODEL_RESOURCE: &str = "gemini-3-pro-preview";

    /// Default sampling temperature
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    /// Lower temperature for factual resource extraction
    pub const RESOURCE_TEMPERATURE: f32 = 0.4;

    /// Default output token cap for single-shot completions
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;

    /// Output token cap for task chat replies
    pub const CHAT_MAX_OUTPUT_TOKENS: u32 = 1000;

    /// Output token cap for the streaming assistant
    pub const STREAM_MAX_OUTPUT_TOKENS: u32 = 4096;

    /// MIME hint requesting JSON output
    pub const JSON_MIME_TYPE: &str = "application/json";

    /// Harm categories configured on every request
    pub const HARM_CATEGORIES: [&str; 4] = [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ];

    /// Default threshold for every harm category
    pub const DEFAULT_SAFETY_THRESHOLD: &str = "BLOCK_NONE";
}

/// Fixed prompt vocabulary
pub mod prompt {
    /// Output locale requested from the model
    pub const TARGET_LANGUAGE: &str = "Korean";

    /// Sources shorter than this (seconds) get no chapters
    pub const SHORT_VIDEO_THRESHOLD_SECS: u64 = 300;

    /// Number of drafts the draft prompt requests
    pub const DRAFT_COUNT: usize = 3;

    /// Checklist size range for the subtask prompt
    pub const MIN_SUBTASKS: usize = 4;
    pub const MAX_SUBTASKS: usize = 6;

    /// Suggested resource range for the task analysis prompt
    pub const MIN_SUGGESTED_RESOURCES: usize = 2;
    pub const MAX_SUGGESTED_RESOURCES: usize = 5;

    /// Failure sentinel error value
    pub const SENTINEL_ERROR: &str = "Analysis failed";

    /// Sentinel reason for URL analysis
    pub const SENTINEL_REASON_URL: &str =
        "Insufficient content or metadata available at the provided URL.";

    /// Sentinel reason for frame analysis
    pub const SENTINEL_REASON_FRAMES: &str = "Insufficient frames to determine video content.";
}

/// Chat seeding
pub mod chat {
    /// Model acknowledgment after the task chat preamble
    pub const TASK_CHAT_ACK: &str = "네, 알겠습니다. 업무 진행을 도와드리겠습니다.";

    /// Model acknowledgment after the assistant persona preamble
    pub const ASSISTANT_ACK: &str = "반갑습니다! Nexus AI Gemini입니다. 무엇을 도와드릴까요?";
}

/// Knowledge fallback record values
pub mod fallback {
    /// Title of a resource whose analysis failed
    pub const FAILURE_TITLE: &str = "분석 실패";

    /// Summary of a resource whose analysis failed
    pub const FAILURE_SUMMARY: &str = "데이터를 파싱할 수 없습니다.";

    /// Category assigned to fallback records
    pub const FAILURE_CATEGORY: &str = "기타";

    /// Title used when a video payload has none
    pub const UNTITLED_VIDEO: &str = "제목 없음";
}

/// Persistence constants
pub mod storage {
    /// Task collection name
    pub const TASKS: &str = "tasks";

    /// Knowledge resource collection name
    pub const KNOWLEDGE: &str = "knowledge";

    /// Video analysis history collection name
    pub const ANALYSIS_HISTORY: &str = "analysis_history";

    /// SQLite busy timeout (milliseconds)
    pub const BUSY_TIMEOUT_MS: u32 = 5000;

    /// Maximum pooled SQLite connections
    pub const POOL_SIZE: u32 = 4;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;
}
