//! In-memory entity store.
//!
//! Backed by a plain `HashMap` behind a synchronous lock; every operation is
//! a short critical section with no await point inside, so the async trait
//! methods never hold the lock across a suspension.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use symbiont_core::entities::EntityKind;
use symbiont_core::error::{StorageError, StorageResult};
use symbiont_core::ports::EntityStore;

/// Entity store keeping every document in process memory.
///
/// Used by the dry-run replay mode and throughout the handler tests.
#[derive(Default)]
pub struct InMemoryEntityStore {
    entities: RwLock<HashMap<(EntityKind, String), serde_json::Value>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities of one kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities
            .read()
            .expect("entity map lock poisoned")
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    /// Total number of stored entities across all kinds.
    pub fn len(&self) -> usize {
        self.entities
            .read()
            .expect("entity map lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn load(&self, kind: EntityKind, id: &str) -> StorageResult<Option<serde_json::Value>> {
        let entities = self
            .entities
            .read()
            .map_err(|e| StorageError::ConnectionError(format!("lock poisoned: {e}")))?;
        Ok(entities.get(&(kind, id.to_string())).cloned())
    }

    async fn save(&self, kind: EntityKind, id: &str, data: serde_json::Value) -> StorageResult<()> {
        let mut entities = self
            .entities
            .write()
            .map_err(|e| StorageError::ConnectionError(format!("lock poisoned: {e}")))?;
        entities.insert((kind, id.to_string()), data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let store = InMemoryEntityStore::new();
        let loaded = store.load(EntityKind::Vault, "0xabc").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_roundtrips() {
        let store = InMemoryEntityStore::new();
        let doc = json!({"id": "0xabc", "total_staked": "100"});

        store
            .save(EntityKind::Vault, "0xabc", doc.clone())
            .await
            .unwrap();

        let loaded = store.load(EntityKind::Vault, "0xabc").await.unwrap();
        assert_eq!(loaded, Some(doc));
    }

    // Deux kinds distincts peuvent partager le même id sans collision
    #[tokio::test]
    async fn test_kinds_are_isolated_namespaces() {
        let store = InMemoryEntityStore::new();

        store
            .save(EntityKind::Vault, "shared", json!({"a": 1}))
            .await
            .unwrap();
        store
            .save(EntityKind::Operator, "shared", json!({"b": 2}))
            .await
            .unwrap();

        assert_eq!(store.count(EntityKind::Vault), 1);
        assert_eq!(store.count(EntityKind::Operator), 1);
        assert_eq!(store.len(), 2);

        let vault = store.load(EntityKind::Vault, "shared").await.unwrap();
        assert_eq!(vault, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_save_is_an_upsert() {
        let store = InMemoryEntityStore::new();

        store
            .save(EntityKind::Network, "n1", json!({"v": 1}))
            .await
            .unwrap();
        store
            .save(EntityKind::Network, "n1", json!({"v": 2}))
            .await
            .unwrap();

        assert_eq!(store.count(EntityKind::Network), 1);
        let loaded = store.load(EntityKind::Network, "n1").await.unwrap();
        assert_eq!(loaded, Some(json!({"v": 2})));
    }
}
