//! Domain Mappers
//!
//! Turn normalized AI payloads into the entity shapes the repositories
//! persist. Mappers generate ids and timestamps but never touch storage.

mod draft;
mod knowledge;
mod subtask;
mod video;

pub use draft::map_drafts;
pub use knowledge::{FileUpload, fallback_resource, file_resource, map_resource, new_resource_id};
pub use subtask::{map_subtasks, subtask_seed};
pub use video::{map_frames_analysis, map_url_analysis};
