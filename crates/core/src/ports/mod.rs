//! Port traits implemented by adapters in outer layers.

mod entity_store;
mod event_handler;
mod source_registry;

pub use entity_store::{EntityStore, EntityStoreExt};
pub use event_handler::{EventHandler, HandlerContext, HandlerRegistry};
pub use source_registry::{SourceRegistry, WatchedSources};
