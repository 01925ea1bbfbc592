//! NexusHub - AI orchestration core of a team productivity dashboard
//!
//! Turns free-form requests into structured tasks, analyzes learning
//! resources and videos with Gemini, and keeps the results in a document
//! store.
//!
//! ## Quick Start
//!
//! ```ignore
//! use nexushub::{ConfigLoader, Services};
//!
//! let config = ConfigLoader::load()?;
//! let services = Services::from_config(&config)?;
//! let drafts = services.tasks.draft("landing page for the spring promo").await?;
//! let task = services.tasks.create_from_patch(&drafts[0])?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: prompt builders, Gemini client, response normalization
//! - [`mapper`]: normalized payloads to domain entities
//! - [`storage`]: document store (SQLite or in-memory) and repositories
//! - [`service`]: user-facing actions over tasks, resources and videos
//! - [`config`]: layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod mapper;
pub mod service;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{AiConfig, Config, ConfigLoader, StorageBackend, StorageConfig};

pub use types::error::{ErrorCategory, HubError, LlmError, Result, ResultExt};

pub use storage::{Database, DocumentStore, MemoryStore, SharedStore, open_store};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    ChatStream, CompletionClient, CompletionRequest, GeminiClient, PromptBuilder,
    ResponseNormalizer, SharedClient, StreamEvent, TimeoutConfig, create_client, with_timeout,
};

// =============================================================================
// Service Re-exports
// =============================================================================

pub use service::{
    AssistantService, KnowledgeService, ServiceContext, Services, TaskService, VideoService,
};
