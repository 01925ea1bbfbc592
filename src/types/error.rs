//! Unified Error Type System
//!
//! Centralized error types for the whole crate.
//!
//! ## Error Families
//!
//! - **ModelUnavailable**: the completion service call itself failed
//!   (network, quota, policy block). Surfaced, never retried automatically.
//! - **MalformedResponse / Validation**: the model answered, but not with
//!   JSON matching the prompt contract.
//! - **AnalysisFailed**: the model returned the `{error, reason}` sentinel.
//! - **EntityNotFound**: a repository call referenced an unknown id.
//! - **StaleResponse**: a response arrived for a superseded request.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Categories for upstream completion failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited or quota exhausted
    RateLimit,
    /// Prompt or context too large
    TokenLimit,
    /// Authentication failed (missing or invalid API key)
    Auth,
    /// Network/connectivity issues
    Network,
    /// Model or endpoint unavailable
    Unavailable,
    /// Request rejected as invalid
    BadRequest,
    /// Blocked by safety filtering
    PolicyBlock,
    /// Temporary server issues
    Transient,
    /// Unknown error
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::TokenLimit => write!(f, "TOKEN_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::PolicyBlock => write!(f, "POLICY_BLOCK"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Whether a manual retry by the user has a reasonable chance to succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit | Self::Network | Self::Transient)
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Classified completion-service error
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Model that produced the error
    pub model: Option<String>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(model) = &self.model {
            write!(f, "[{}:{}] {}", model, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            model: None,
        }
    }

    /// Attach the model identifier the request was sent to
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps raw upstream failures onto [`ErrorCategory`]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message by its wording
    pub fn classify(message: &str) -> LlmError {
        let lower = message.to_lowercase();

        if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("quota")
            || lower.contains("resource_exhausted")
        {
            return LlmError::new(ErrorCategory::RateLimit, message);
        }

        if lower.contains("token")
            && (lower.contains("limit") || lower.contains("exceed") || lower.contains("maximum"))
            || lower.contains("context length")
            || lower.contains("too large")
        {
            return LlmError::new(ErrorCategory::TokenLimit, message);
        }

        if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited")
        {
            return LlmError::new(ErrorCategory::PolicyBlock, message);
        }

        if lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("unauthorized")
            || lower.contains("permission denied")
        {
            return LlmError::new(ErrorCategory::Auth, message);
        }

        if lower.contains("network")
            || lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("timeout")
            || lower.contains("timed out")
        {
            return LlmError::new(ErrorCategory::Network, message);
        }

        if lower.contains("503")
            || lower.contains("502")
            || lower.contains("500")
            || lower.contains("unavailable")
            || lower.contains("overloaded")
        {
            return LlmError::new(ErrorCategory::Transient, message);
        }

        if lower.contains("404") || lower.contains("not found") {
            return LlmError::new(ErrorCategory::Unavailable, message);
        }

        if lower.contains("400") || lower.contains("invalid") || lower.contains("bad request") {
            return LlmError::new(ErrorCategory::BadRequest, message);
        }

        LlmError::new(ErrorCategory::Unknown, message)
    }

    /// Classify by HTTP status code (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str) -> LlmError {
        match status {
            429 => LlmError::new(ErrorCategory::RateLimit, message),
            401 | 403 => LlmError::new(ErrorCategory::Auth, message),
            400 => LlmError::new(ErrorCategory::BadRequest, message),
            404 => LlmError::new(ErrorCategory::Unavailable, message),
            500 | 502 | 503 | 504 => LlmError::new(ErrorCategory::Transient, message),
            _ => LlmError::new(ErrorCategory::Unknown, message),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Structured contract violation in a model response
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// What validation failed
    pub kind: ValidationErrorKind,
    /// Field path that failed validation
    pub field: Option<String>,
    /// Detailed message
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "Validation failed for '{}': {}", field, self.message)
        } else {
            write!(f, "Validation failed: {}", self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Required field missing
    pub fn missing(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ValidationErrorKind::MissingField,
            format!("required field '{}' is missing", field),
        )
        .with_field(field)
    }
}

/// Validation error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Top-level shape is wrong (object vs array)
    Shape,
    /// Required field missing
    MissingField,
    /// Field has the wrong type
    Type,
    /// Collection size outside the contract
    Range,
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum HubError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // AI Errors
    // -------------------------------------------------------------------------
    /// The upstream completion call failed
    #[error("AI model unavailable: {0}")]
    ModelUnavailable(LlmError),

    /// Completion text was not valid JSON after fence stripping and repair
    #[error("Malformed AI response: {0}")]
    MalformedResponse(String),

    /// JSON parsed but did not match the prompt contract
    #[error("{0}")]
    Validation(ValidationError),

    /// The model returned the explicit failure sentinel
    #[error("AI analysis failed: {reason}")]
    AnalysisFailed { reason: String },

    /// Operation timeout with context
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("{kind} not found: {id}")]
    EntityNotFound { kind: &'static str, id: String },

    /// A newer request for the same entity superseded this one
    #[error("Stale response discarded for {entity}")]
    StaleResponse { entity: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<LlmError> for HubError {
    fn from(err: LlmError) -> Self {
        HubError::ModelUnavailable(err)
    }
}

impl From<ValidationError> for HubError {
    fn from(err: ValidationError) -> Self {
        HubError::Validation(err)
    }
}

pub type Result<T> = std::result::Result<T, HubError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl HubError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::EntityNotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn analysis_failed(reason: impl Into<String>) -> Self {
        Self::AnalysisFailed {
            reason: reason.into(),
        }
    }

    /// True when the model answered but its output could not be used
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedResponse(_) | Self::Validation(_) | Self::Json(_)
        )
    }

    /// True for failures the user can reasonably retry by hand
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ModelUnavailable(e) => e.is_retryable(),
            Self::Timeout { .. } | Self::AnalysisFailed { .. } => true,
            other => other.is_malformed(),
        }
    }

    /// Human-readable message for the action handler to display
    pub fn user_message(&self) -> String {
        match self {
            Self::ModelUnavailable(_) | Self::Timeout { .. } => {
                "The AI model failed to respond. Please try again.".to_string()
            }
            Self::MalformedResponse(_) | Self::Validation(_) | Self::Json(_) => {
                "The AI model did not return a valid result. Please try again.".to_string()
            }
            Self::AnalysisFailed { reason } => format!("AI analysis failed: {}", reason),
            Self::EntityNotFound { kind, id } => format!("{} '{}' no longer exists.", kind, id),
            Self::StaleResponse { .. } => {
                "A newer request replaced this one; its result was ignored.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Context extension trait for adding context to storage errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| HubError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| HubError::Storage(format!("{}: {}", f().into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::PolicyBlock.to_string(), "POLICY_BLOCK");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = ErrorClassifier::classify("Quota exceeded for model");
        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_policy_block() {
        let err = ErrorClassifier::classify("Response was blocked due to SAFETY");
        assert_eq!(err.category, ErrorCategory::PolicyBlock);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classify_network() {
        let err = ErrorClassifier::classify("Connection timed out after 30s");
        assert_eq!(err.category, ErrorCategory::Network);
    }

    #[test]
    fn test_classify_unknown() {
        let err = ErrorClassifier::classify("Something weird happened");
        assert_eq!(err.category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_classify_http_status() {
        assert_eq!(
            ErrorClassifier::classify_http_status(429, "slow down").category,
            ErrorCategory::RateLimit
        );
        assert_eq!(
            ErrorClassifier::classify_http_status(403, "denied").category,
            ErrorCategory::Auth
        );
        assert_eq!(
            ErrorClassifier::classify_http_status(503, "busy").category,
            ErrorCategory::Transient
        );
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::new(ErrorCategory::RateLimit, "Too many requests").model("gemini-pro");
        assert_eq!(err.to_string(), "[gemini-pro:RATE_LIMIT] Too many requests");

        let err = LlmError::new(ErrorCategory::Network, "Connection failed");
        assert_eq!(err.to_string(), "[NETWORK] Connection failed");
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = HubError::from(LlmError::new(ErrorCategory::Auth, "API key invalid: AIza..."));
        assert!(!err.user_message().contains("AIza"));

        let failed = HubError::analysis_failed("Insufficient content");
        assert_eq!(failed.user_message(), "AI analysis failed: Insufficient content");
        assert!(failed.is_retryable());
    }

    #[test]
    fn test_validation_error_is_malformed() {
        let err = HubError::from(ValidationError::missing("strategy"));
        assert!(err.is_malformed());
        assert!(err.to_string().contains("strategy"));
    }
}
