//! Metrics definitions for the aggregation engine.
//!
//! Metrics are collected using the `metrics` crate and exported to
//! Prometheus via `metrics-exporter-prometheus` (installed by the binary).

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "events_processed_total",
        "Total number of events successfully aggregated"
    );
    describe_counter!(
        "handler_errors_total",
        "Total number of handler errors during event processing"
    );
    describe_counter!(
        "sources_registered_total",
        "Total number of vault addresses registered as event sources"
    );
    describe_histogram!(
        "event_processing_duration_seconds",
        "Time taken to process one event in seconds"
    );
}

/// Record a successfully processed event.
pub fn record_event_processed(kind: &str) {
    counter!("events_processed_total", "kind" => kind.to_string()).increment(1);
}

/// Record a handler error.
pub fn record_handler_error(handler: &str, kind: &str) {
    counter!("handler_errors_total", "handler" => handler.to_string(), "kind" => kind.to_string())
        .increment(1);
}

/// Record a new event-source registration.
pub fn record_source_registered() {
    counter!("sources_registered_total").increment(1);
}

/// Record event processing duration.
pub fn record_processing_duration(duration_secs: f64) {
    histogram!("event_processing_duration_seconds").record(duration_secs);
}

/// A timer that automatically records duration when dropped.
pub struct ProcessingTimer {
    start: Instant,
}

impl ProcessingTimer {
    /// Start a new processing timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for ProcessingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProcessingTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_processing_duration(duration);
    }
}
