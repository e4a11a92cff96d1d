//! Handlers for network and operator registration events.
//!
//! Each registration bumps the corresponding protocol-wide total and creates
//! the primary entity with zeroed counters and placeholder configuration
//! defaults. Registration events are expected at most once per address; a
//! duplicate overwrites the entity with fresh defaults and double-counts the
//! protocol total - the known gap is surfaced with a warning, not guarded.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use symbiont_core::entities::{Network, Operator};
use symbiont_core::error::{DomainError, DomainResult};
use symbiont_core::models::{EventKind, EventPayload, StakingEvent};
use symbiont_core::ports::{EntityStoreExt, EventHandler, HandlerContext};

use crate::protocol::ensure_protocol;

/// Default network epoch duration (1 day). Placeholder pending richer
/// on-chain configuration, not a protocol-derived value.
const DEFAULT_EPOCH_DURATION: i64 = 86_400;

/// Default network slashing window (7 days). Same placeholder status.
const DEFAULT_SLASHING_WINDOW: i64 = 604_800;

// =============================================================================
// Network registration
// =============================================================================

/// Handler for `NetworkRegistered` events from the network registry.
pub struct NetworkRegistryHandler;

#[async_trait]
impl EventHandler for NetworkRegistryHandler {
    fn name(&self) -> &'static str {
        "network_registry"
    }

    fn kinds(&self) -> &'static [EventKind] {
        &[EventKind::NetworkRegistered]
    }

    async fn handle(&self, event: &StakingEvent, ctx: &HandlerContext) -> DomainResult<()> {
        let EventPayload::NetworkRegistered(payload) = &event.payload else {
            return Err(DomainError::DecodingError(format!(
                "network_registry handler received {}",
                event.kind()
            )));
        };
        let meta = &event.meta;
        let store = ctx.store.as_ref();

        let mut protocol = ensure_protocol(store, meta.timestamp).await?;
        protocol.total_networks += 1;
        protocol.updated_at = meta.timestamp;
        store.put(&protocol).await?;

        let id = Network::id_for(&payload.network);
        if store.get::<Network>(&id).await?.is_some() {
            warn!(network = %id, "Duplicate network registration, overwriting with fresh defaults");
        }

        let network = Network {
            id: id.clone(),
            address: payload.network,
            admin: payload.admin,
            middleware: None,
            epoch_duration: DEFAULT_EPOCH_DURATION,
            slashing_window: DEFAULT_SLASHING_WINDOW,
            total_stake: Decimal::ZERO,
            operator_count: 0,
            vault_count: 0,
            created_at: meta.timestamp,
            updated_at: meta.timestamp,
            created_at_block: meta.block_number,
        };
        store.put(&network).await?;

        debug!(network = %id, block = meta.block_number, "Network registered");
        Ok(())
    }
}

// =============================================================================
// Operator registration
// =============================================================================

/// Handler for `OperatorRegistered` events from the operator registry.
pub struct OperatorRegistryHandler;

#[async_trait]
impl EventHandler for OperatorRegistryHandler {
    fn name(&self) -> &'static str {
        "operator_registry"
    }

    fn kinds(&self) -> &'static [EventKind] {
        &[EventKind::OperatorRegistered]
    }

    async fn handle(&self, event: &StakingEvent, ctx: &HandlerContext) -> DomainResult<()> {
        let EventPayload::OperatorRegistered(payload) = &event.payload else {
            return Err(DomainError::DecodingError(format!(
                "operator_registry handler received {}",
                event.kind()
            )));
        };
        let meta = &event.meta;
        let store = ctx.store.as_ref();

        let mut protocol = ensure_protocol(store, meta.timestamp).await?;
        protocol.total_operators += 1;
        protocol.updated_at = meta.timestamp;
        store.put(&protocol).await?;

        let id = Operator::id_for(&payload.operator);
        if store.get::<Operator>(&id).await?.is_some() {
            warn!(operator = %id, "Duplicate operator registration, overwriting with fresh defaults");
        }

        let operator = Operator {
            id: id.clone(),
            address: payload.operator,
            admin: payload.admin,
            total_stake: Decimal::ZERO,
            network_count: 0,
            vault_count: 0,
            created_at: meta.timestamp,
            updated_at: meta.timestamp,
            created_at_block: meta.block_number,
        };
        store.put(&operator).await?;

        debug!(operator = %id, block = meta.block_number, "Operator registered");
        Ok(())
    }
}
