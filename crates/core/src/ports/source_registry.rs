//! Port trait for dynamic event-source registration.
//!
//! When the vault factory creates a vault, the engine must tell the
//! transport to start delivering that address's future events with the same
//! ordering guarantees as pre-configured origins. The relationship is a
//! plain interface; the transport itself is out of scope.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::DomainResult;
use crate::models::Address;

/// Boundary to the transport layer for dynamic source expansion.
#[async_trait]
pub trait SourceRegistry: Send + Sync {
    /// Register `address` as a first-class event origin.
    ///
    /// Called once per created vault; registering an already-known address
    /// must be a no-op.
    async fn register_source(&self, address: &Address) -> DomainResult<()>;
}

/// In-memory source registry tracking the watched address set.
///
/// Used by the replay command and by tests; a real transport adapter would
/// forward registrations to its subscription machinery.
#[derive(Default)]
pub struct WatchedSources {
    watched: RwLock<HashSet<Address>>,
}

impl WatchedSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an address is currently watched.
    pub async fn is_watched(&self, address: &Address) -> bool {
        self.watched.read().await.contains(address)
    }

    /// Number of watched addresses.
    pub async fn len(&self) -> usize {
        self.watched.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.watched.read().await.is_empty()
    }
}

#[async_trait]
impl SourceRegistry for WatchedSources {
    async fn register_source(&self, address: &Address) -> DomainResult<()> {
        let newly_added = self.watched.write().await.insert(*address);
        if newly_added {
            debug!(address = %address, "Watching new event source");
        }
        Ok(())
    }
}
