//! Aggregation engine - ordered single-pass event dispatch.
//!
//! The engine consumes decoded events one at a time, in the canonical order
//! defined by the upstream transport (block number, then log index), and runs
//! the matching handler to completion before the next event is considered.
//! Ordering is a correctness requirement: running totals are computed
//! incrementally from prior state, so replaying events out of order or
//! skipping one silently corrupts every downstream aggregate.

use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::error::{DomainError, EngineResult};
use crate::metrics::{record_event_processed, record_handler_error, ProcessingTimer};
use crate::models::StakingEvent;
use crate::ports::{EntityStore, HandlerContext, HandlerRegistry, SourceRegistry};

/// Event-driven state aggregation engine.
///
/// # Flow
///
/// One event in → locate/create primary entity → apply mutation →
/// cross-update related entities → recompute day-bucket rollup → persist.
/// No component calls back into an earlier one; the flow is strictly a
/// single pass per event.
///
/// # Failure model
///
/// A storage failure is fatal to the current event's processing and
/// propagates to the caller. Because every handler mutation is keyed
/// deterministically and idempotent, recovery is re-running the event from
/// the top of its handler; a crash mid-batch is recovered by rerunning from
/// the last persisted position.
pub struct AggregationEngine {
    ctx: HandlerContext,
    handlers: Arc<HandlerRegistry>,
}

impl AggregationEngine {
    pub fn new(
        store: Arc<dyn EntityStore>,
        sources: Arc<dyn SourceRegistry>,
        handlers: Arc<HandlerRegistry>,
    ) -> Self {
        Self {
            ctx: HandlerContext::new(store, sources),
            handlers,
        }
    }

    /// Apply one event's mutations to the derived entity graph.
    #[instrument(skip_all, fields(block = event.meta.block_number, log = event.meta.log_index, kind = %event.kind()))]
    pub async fn apply(&self, event: &StakingEvent) -> EngineResult<()> {
        let kind = event.kind();

        // Every protocol event kind must be wired to a handler; a miss is a
        // configuration bug, not a skippable event.
        let handler = self
            .handlers
            .get(kind)
            .ok_or_else(|| DomainError::HandlerNotFound(kind.to_string()))?;

        trace!(handler = handler.name(), "Dispatching event");
        let _timer = ProcessingTimer::new();

        if let Err(e) = handler.handle(event, &self.ctx).await {
            record_handler_error(handler.name(), &kind.to_string());
            return Err(e.into());
        }

        record_event_processed(&kind.to_string());
        Ok(())
    }

    /// Apply an ordered sequence of events, stopping at the first failure.
    ///
    /// Returns the number of events applied.
    pub async fn replay<I>(&self, events: I) -> EngineResult<u64>
    where
        I: IntoIterator<Item = StakingEvent>,
    {
        let mut applied = 0u64;
        for event in events {
            self.apply(&event).await?;
            applied += 1;
            if applied % 1000 == 0 {
                debug!(applied, "Replay progress");
            }
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    use async_trait::async_trait;

    use crate::entities::EntityKind;
    use crate::error::{DomainResult, StorageResult};
    use crate::models::{Address, EventKind, EventMeta, EventPayload, NetworkRegistered, TxHash};
    use crate::ports::{EventHandler, WatchedSources};

    struct NullStore;

    #[async_trait]
    impl EntityStore for NullStore {
        async fn load(
            &self,
            _kind: EntityKind,
            _id: &str,
        ) -> StorageResult<Option<serde_json::Value>> {
            Ok(None)
        }
        async fn save(
            &self,
            _kind: EntityKind,
            _id: &str,
            _data: serde_json::Value,
        ) -> StorageResult<()> {
            Ok(())
        }
    }

    struct CountingHandler {
        calls: Arc<AtomicU64>,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn kinds(&self) -> &'static [EventKind] {
            &[EventKind::NetworkRegistered]
        }
        async fn handle(&self, _: &StakingEvent, _: &HandlerContext) -> DomainResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn sample_event() -> StakingEvent {
        StakingEvent {
            meta: EventMeta {
                tx_hash: TxHash::from([1; 32]),
                log_index: 0,
                block_number: 1,
                timestamp: 1_700_000_000,
                origin: Address::from([2; 20]),
                tx_from: Address::from([3; 20]),
            },
            payload: EventPayload::NetworkRegistered(NetworkRegistered {
                network: Address::from([4; 20]),
                admin: Address::from([5; 20]),
            }),
        }
    }

    #[tokio::test]
    async fn test_apply_dispatches_to_registered_handler() {
        let calls = Arc::new(AtomicU64::new(0));
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(CountingHandler {
            calls: calls.clone(),
        }));

        let engine = AggregationEngine::new(
            Arc::new(NullStore),
            Arc::new(WatchedSources::new()),
            Arc::new(registry),
        );

        engine.apply(&sample_event()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // Un kind sans handler est un bug de câblage, pas un événement ignorable
    #[tokio::test]
    async fn test_apply_fails_for_unwired_kind() {
        let engine = AggregationEngine::new(
            Arc::new(NullStore),
            Arc::new(WatchedSources::new()),
            Arc::new(HandlerRegistry::new()),
        );

        let err = engine.apply(&sample_event()).await.unwrap_err();
        assert!(err.to_string().contains("Handler not found"));
    }

    #[tokio::test]
    async fn test_replay_counts_applied_events() {
        let calls = Arc::new(AtomicU64::new(0));
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(CountingHandler {
            calls: calls.clone(),
        }));

        let engine = AggregationEngine::new(
            Arc::new(NullStore),
            Arc::new(WatchedSources::new()),
            Arc::new(registry),
        );

        let applied = engine
            .replay(vec![sample_event(), sample_event(), sample_event()])
            .await
            .unwrap();
        assert_eq!(applied, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
