//! Per-entity request tokens for discarding superseded AI responses.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::types::{EntityKey, HubError, Result};

/// Ticket for one in-flight request against one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlightToken {
    key: EntityKey,
    generation: u64,
}

impl InFlightToken {
    pub fn key(&self) -> &EntityKey {
        &self.key
    }
}

/// Tracks the latest request generation per entity.
///
/// Each `begin` supersedes earlier tokens for the same entity; only the
/// newest token passes `ensure_current`. Generations come from one counter,
/// so a token never matches again after its entry is cleared.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    latest: DashMap<EntityKey, u64>,
    next_generation: AtomicU64,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, superseding any earlier one for `key`
    pub fn begin(&self, key: EntityKey) -> InFlightToken {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.latest
            .entry(key.clone())
            .and_modify(|latest| *latest = (*latest).max(generation))
            .or_insert(generation);
        InFlightToken { key, generation }
    }

    pub fn is_current(&self, token: &InFlightToken) -> bool {
        self.latest
            .get(&token.key)
            .is_some_and(|latest| *latest == token.generation)
    }

    /// `StaleResponse` unless `token` is still the newest for its entity
    pub fn ensure_current(&self, token: &InFlightToken) -> Result<()> {
        if self.is_current(token) {
            Ok(())
        } else {
            tracing::info!("Discarding stale response for {}", token.key);
            Err(HubError::StaleResponse {
                entity: token.key.to_string(),
            })
        }
    }

    /// Drop bookkeeping once the newest request has finished
    pub fn finish(&self, token: &InFlightToken) {
        self.latest
            .remove_if(&token.key, |_, latest| *latest == token.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_request_supersedes() {
        let registry = InFlightRegistry::new();
        let key = EntityKey::new("tasks", "t1");

        let first = registry.begin(key.clone());
        let second = registry.begin(key.clone());

        assert!(!registry.is_current(&first));
        assert!(registry.ensure_current(&second).is_ok());
        assert!(matches!(
            registry.ensure_current(&first),
            Err(HubError::StaleResponse { .. })
        ));
    }

    #[test]
    fn test_entities_are_independent() {
        let registry = InFlightRegistry::new();
        let task = registry.begin(EntityKey::new("tasks", "x"));
        let resource = registry.begin(EntityKey::new("knowledge", "x"));

        assert!(registry.is_current(&task));
        assert!(registry.is_current(&resource));
    }

    #[test]
    fn test_finish_only_clears_newest() {
        let registry = InFlightRegistry::new();
        let key = EntityKey::new("tasks", "t1");

        let first = registry.begin(key.clone());
        let second = registry.begin(key.clone());
        registry.finish(&first);
        assert!(registry.is_current(&second));

        registry.finish(&second);
        let third = registry.begin(key);
        assert!(registry.is_current(&third));
        assert!(!registry.is_current(&first));
        assert!(!registry.is_current(&second));
    }
}
