//! Port trait for the entity store.
//!
//! The store is a plain key-value contract: `load(kind, id)` and
//! `save(kind, id, document)`. It is single-writer and crash-consistent per
//! entity; the engine relies on idempotent handlers, not transactions, for
//! recovery (see the engine module).

use async_trait::async_trait;

use crate::entities::{EntityKind, StoreEntity};
use crate::error::{StorageError, StorageResult};

/// Key-value persistence for derived entities.
///
/// Implementations live in the infrastructure layer (`symbiont-storage`).
/// Documents are JSON; the typed surface is provided by [`EntityStoreExt`].
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Load an entity document by kind and id.
    async fn load(&self, kind: EntityKind, id: &str) -> StorageResult<Option<serde_json::Value>>;

    /// Save (upsert) an entity document.
    async fn save(&self, kind: EntityKind, id: &str, data: serde_json::Value) -> StorageResult<()>;
}

/// Typed convenience layer over [`EntityStore`], blanket-implemented for
/// every store. All handlers go through this surface.
#[async_trait]
pub trait EntityStoreExt: EntityStore {
    /// Load a typed entity by id.
    async fn get<T: StoreEntity>(&self, id: &str) -> StorageResult<Option<T>> {
        match self.load(T::KIND, id).await? {
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                StorageError::SerializationError(format!("{} {}: {}", T::KIND, id, e))
            }),
            None => Ok(None),
        }
    }

    /// Persist a typed entity (upsert).
    async fn put<T: StoreEntity>(&self, entity: &T) -> StorageResult<()> {
        let value = serde_json::to_value(entity).map_err(|e| {
            StorageError::SerializationError(format!("{} {}: {}", T::KIND, entity.id(), e))
        })?;
        self.save(T::KIND, entity.id(), value).await
    }

    /// Load an entity, or build a fresh one if absent.
    ///
    /// The fresh entity is *not* persisted; the caller mutates it and calls
    /// [`put`](Self::put) once. This is the uniform load-or-create pattern
    /// used by the opt-in handlers and the metric rollups.
    async fn load_or_init<T, F>(&self, id: &str, init: F) -> StorageResult<T>
    where
        T: StoreEntity,
        F: FnOnce() -> T + Send,
    {
        match self.get::<T>(id).await? {
            Some(entity) => Ok(entity),
            None => Ok(init()),
        }
    }
}

impl<S: EntityStore + ?Sized> EntityStoreExt for S {}
