//! Port trait for event handlers.
//!
//! This is the main extensibility point of the engine. Each family of
//! protocol events implements this trait and is registered for the event
//! kinds it aggregates.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::models::{EventKind, StakingEvent};
use crate::ports::{EntityStore, SourceRegistry};

/// Dependencies passed to handlers during event processing.
#[derive(Clone)]
pub struct HandlerContext {
    /// Persistence for derived entities.
    pub store: Arc<dyn EntityStore>,
    /// Boundary to the transport: new vault addresses are registered here.
    pub sources: Arc<dyn SourceRegistry>,
}

impl HandlerContext {
    pub fn new(store: Arc<dyn EntityStore>, sources: Arc<dyn SourceRegistry>) -> Self {
        Self { store, sources }
    }
}

/// Trait for event-kind-specific aggregation logic.
///
/// A handler runs to completion for one event - every load, mutation, and
/// persist - before the engine considers the next event. Handlers must be
/// idempotent: re-applying the same event leaves the store in the same state.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handler name, used for logging and metrics.
    fn name(&self) -> &'static str;

    /// Event kinds this handler processes.
    fn kinds(&self) -> &'static [EventKind];

    /// Apply one event's mutations to the derived entity graph.
    async fn handle(&self, event: &StakingEvent, ctx: &HandlerContext) -> DomainResult<()>;
}

/// Registry mapping event kinds to their handlers.
pub struct HandlerRegistry {
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for every kind it declares.
    ///
    /// A later registration for the same kind replaces the earlier one.
    pub fn register(&mut self, handler: Arc<dyn EventHandler>) {
        for kind in handler.kinds() {
            self.handlers.insert(*kind, handler.clone());
        }
    }

    /// Get the handler for an event kind.
    pub fn get(&self, kind: EventKind) -> Option<&Arc<dyn EventHandler>> {
        self.handlers.get(&kind)
    }

    /// Check if a kind has a registered handler.
    pub fn has_handler(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// List all kinds with a registered handler.
    pub fn registered_kinds(&self) -> Vec<EventKind> {
        self.handlers.keys().copied().collect()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
