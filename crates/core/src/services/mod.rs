//! Core business logic services.

mod engine;

pub use engine::AggregationEngine;
