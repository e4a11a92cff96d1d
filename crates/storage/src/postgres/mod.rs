//! PostgreSQL storage adapter.
//!
//! Entities are persisted as JSONB documents in a single table keyed by
//! `(kind, id)`. The engine's entities are small, schemaless aggregates
//! whose shape follows the domain types, so a document table avoids a
//! migration per entity while keeping upserts atomic per row.
//!
//! # Usage
//!
//! ```ignore
//! let config = DatabaseConfig::for_engine(&database_url);
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let store = PgEntityStore::new(&db);
//! ```

mod database;
mod entity_store;

pub use database::{Database, DatabaseConfig, PurgeStats};
pub use entity_store::PgEntityStore;
