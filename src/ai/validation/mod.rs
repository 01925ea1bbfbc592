//! AI Response Normalization
//!
//! Turns raw completion text into typed payloads:
//! 1. Strip code fences, BOM and whitespace
//! 2. Parse JSON, repairing common defects
//! 3. Detect the `{error, reason}` failure sentinel
//! 4. Check the payload against its prompt contract
//!
//! Nothing here retries or substitutes data; fallbacks are the caller's choice.

pub mod contracts;
mod json_repair;

pub use contracts::{
    ChapterItem, Contract, DraftItem, DraftsPayload, FramesPayload, ResourcePayload, SceneItem,
    SubtasksPayload, TaskAnalysisPayload, detect_sentinel,
};
pub use json_repair::{JsonRepairer, strip_fences};

use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{HubError, Result};

/// Parsing pipeline shared by every JSON prompt
pub struct ResponseNormalizer {
    repairer: JsonRepairer,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self {
            repairer: JsonRepairer::new(),
        }
    }

    /// Normalizer that rejects anything needing repair beyond fence stripping
    pub fn strict() -> Self {
        Self {
            repairer: JsonRepairer::strict(),
        }
    }

    /// Parse raw completion text and reject failure sentinels.
    pub fn parse(&self, raw: &str) -> Result<Value> {
        let (value, was_repaired) = self.repairer.parse_or_repair(raw)?;
        if was_repaired {
            debug!("Completion needed JSON repair");
        }

        if let Some(reason) = detect_sentinel(&value) {
            warn!("Model reported analysis failure: {}", reason);
            return Err(HubError::analysis_failed(reason));
        }

        Ok(value)
    }

    /// Parse and check against the contract `C`.
    pub fn normalize<C: Contract>(&self, raw: &str) -> Result<C> {
        let value = self.parse(raw)?;
        C::from_value(value).inspect_err(|e| warn!("{} contract violated: {}", C::NAME, e))
    }
}
