//! Core domain layer for the Symbiont indexer.
//!
//! This crate contains the decoded event models, derived entity types, port
//! traits (interfaces), and the aggregation engine for the Symbiotic
//! restaking protocol. It follows hexagonal architecture principles - this
//! is the innermost layer with no dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    symbiont (binary)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   symbiont-handlers                         │
//! │        (registration, opt-ins, vaults, rollups)             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   symbiont-storage                          │
//! │              (PostgreSQL / in-memory store)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   symbiont-core  ← YOU ARE HERE             │
//! │              (models, entities, ports, engine)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Decoded chain event records (the engine's input contract)
//! - [`entities`] - Derived entities persisted through the entity store
//! - [`ports`] - Interface traits for adapters to implement
//! - [`services`] - The aggregation engine
//! - [`constants`] - Protocol constants and day-bucket helpers
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metric definitions
//!
//! # Key Concepts
//!
//! ## Ports
//!
//! - [`ports::EntityStore`] - Load/save persistence for derived entities
//! - [`ports::SourceRegistry`] - Tells the transport to start delivering
//!   events from a newly created vault address
//! - [`ports::EventHandler`] - Per-event-kind aggregation logic
//!
//! ## Engine lifecycle
//!
//! 1. The transport hands the engine one decoded event at a time, in
//!    canonical order (block number, then log index)
//! 2. The engine looks up the handler registered for the event's kind
//! 3. The handler loads, mutates, and persists the derived entities
//! 4. A storage failure aborts that event; re-running the event is safe
//!    because every mutation is idempotent

pub mod constants;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;
