pub mod chat;
pub mod error;
pub mod knowledge;
pub mod task;
pub mod utils;
pub mod video;

pub use chat::*;
pub use error::{
    ErrorCategory, ErrorClassifier, HubError, LlmError, Result, ResultExt, ValidationError,
    ValidationErrorKind,
};
pub use knowledge::*;
pub use task::*;
pub use utils::{
    enum_to_str, format_seconds, json_non_empty, json_seconds, json_string, json_string_array,
    log_filter_warn, now_millis, now_rfc3339, parse_time_range, parse_time_string,
};
pub use video::*;

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

/// Identifier of an entity that can have an AI request in flight
///
/// Keys are namespaced by collection so a task and a resource sharing an id
/// never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn new(collection: &str, id: &str) -> Self {
        Self(format!("{}/{}", collection, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for EntityKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
