//! Storage layer for the Symbiont aggregation engine.
//!
//! This crate provides implementations of the [`EntityStore`] port defined
//! in `symbiont-core`:
//!
//! - [`postgres`] - durable store backed by a single JSONB-document table,
//!   with connection pooling and migrations
//! - [`memory`] - in-memory store for tests and dry-run replays
//!
//! # Usage
//!
//! ```ignore
//! use symbiont_storage::{Database, DatabaseConfig, PgEntityStore};
//!
//! let config = DatabaseConfig::for_engine(&database_url);
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let store = Arc::new(PgEntityStore::new(&db));
//! ```
//!
//! [`EntityStore`]: symbiont_core::ports::EntityStore

pub mod memory;
pub mod postgres;

pub use memory::InMemoryEntityStore;
pub use postgres::{Database, DatabaseConfig, PgEntityStore, PurgeStats};
