//! Timeout Configuration
//!
//! Deadlines for action handlers:
//! - Operation-specific timeout defaults
//! - Helper functions for wrapping async operations
//! - Consistent `HubError::Timeout` handling
//!
//! ## Usage
//!
//! ```ignore
//! use crate::ai::timeout::{TimeoutConfig, with_timeout};
//!
//! let timeouts = TimeoutConfig::from_secs(config.ai.timeout_secs);
//! let text = with_timeout(timeouts.completion, client.complete(&request), "draft").await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::constants::network as net_constants;
use crate::types::{HubError, Result};

/// Timeout configuration for AI-backed actions
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Single-shot completion or chat reply
    pub completion: Duration,
    /// Time to the first streamed chunk
    pub first_chunk: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::from_secs(net_constants::DEFAULT_TIMEOUT_SECS)
    }
}

impl TimeoutConfig {
    /// Derive all deadlines from the configured request timeout
    pub fn from_secs(request_secs: u64) -> Self {
        let completion = Duration::from_secs(request_secs.max(1));
        Self {
            completion,
            first_chunk: completion.min(Duration::from_secs(
                net_constants::CONNECTION_TIMEOUT_SECS * 2,
            )),
        }
    }
}

/// Execute an async operation with a timeout
///
/// Returns `HubError::Timeout` if the operation doesn't complete within the
/// specified duration. The inner future is dropped on expiry.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(HubError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_config_from_secs() {
        let config = TimeoutConfig::from_secs(120);
        assert_eq!(config.completion.as_secs(), 120);
        assert_eq!(config.first_chunk.as_secs(), 60);

        let short = TimeoutConfig::from_secs(10);
        assert_eq!(short.first_chunk.as_secs(), 10);

        assert_eq!(TimeoutConfig::from_secs(0).completion.as_secs(), 1);
    }

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, HubError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, HubError>(42)
            },
            "slow operation",
        )
        .await;
        assert!(matches!(result.unwrap_err(), HubError::Timeout { .. }));
    }
}
