//! Handlers for opt-in toggle events.
//!
//! The opt-in record itself is authoritative: it is created or updated
//! unconditionally. Counter updates on the two related entities are
//! best-effort - a counterpart that does not exist yet is skipped without
//! error, and its counter is never retroactively reconciled.
//!
//! Counters move per *event*, not per flag transition: two consecutive
//! events carrying the same boolean move the counter twice. This matches
//! the observed upstream behavior (see DESIGN.md).

use async_trait::async_trait;
use tracing::debug;

use symbiont_core::entities::{
    Network, Operator, OperatorNetworkOptIn, Vault, VaultOperatorOptIn,
};
use symbiont_core::error::{DomainError, DomainResult};
use symbiont_core::models::{EventKind, EventPayload, StakingEvent};
use symbiont_core::ports::{EntityStoreExt, EventHandler, HandlerContext};

fn counter_delta(is_opted_in: bool) -> i64 {
    if is_opted_in {
        1
    } else {
        -1
    }
}

// =============================================================================
// Operator ↔ Network
// =============================================================================

/// Handler for `OptIn` events from the operator-network opt-in service.
pub struct OperatorNetworkOptInHandler;

#[async_trait]
impl EventHandler for OperatorNetworkOptInHandler {
    fn name(&self) -> &'static str {
        "operator_network_opt_in"
    }

    fn kinds(&self) -> &'static [EventKind] {
        &[EventKind::OperatorNetworkOptIn]
    }

    async fn handle(&self, event: &StakingEvent, ctx: &HandlerContext) -> DomainResult<()> {
        let EventPayload::OperatorNetworkOptIn(payload) = &event.payload else {
            return Err(DomainError::DecodingError(format!(
                "operator_network_opt_in handler received {}",
                event.kind()
            )));
        };
        let meta = &event.meta;
        let store = ctx.store.as_ref();

        let id = OperatorNetworkOptIn::id_for(&payload.operator, &payload.network);
        let mut opt_in = store
            .load_or_init::<OperatorNetworkOptIn, _>(&id, || OperatorNetworkOptIn {
                id: id.clone(),
                operator: payload.operator.to_hex(),
                network: payload.network.to_hex(),
                is_opted_in: false,
                created_at: meta.timestamp,
                created_at_block: meta.block_number,
                updated_at: meta.timestamp,
                updated_at_block: meta.block_number,
            })
            .await?;
        opt_in.is_opted_in = payload.is_opted_in;
        opt_in.updated_at = meta.timestamp;
        opt_in.updated_at_block = meta.block_number;
        store.put(&opt_in).await?;

        let delta = counter_delta(payload.is_opted_in);

        // Best-effort counter updates on both sides of the relationship.
        match store
            .get::<Operator>(&Operator::id_for(&payload.operator))
            .await?
        {
            Some(mut operator) => {
                operator.network_count += delta;
                operator.updated_at = meta.timestamp;
                store.put(&operator).await?;
            }
            None => {
                debug!(operator = %payload.operator, "Opt-in for unknown operator, counter skipped");
            }
        }

        match store.get::<Network>(&Network::id_for(&payload.network)).await? {
            Some(mut network) => {
                network.operator_count += delta;
                network.updated_at = meta.timestamp;
                store.put(&network).await?;
            }
            None => {
                debug!(network = %payload.network, "Opt-in for unknown network, counter skipped");
            }
        }

        Ok(())
    }
}

// =============================================================================
// Operator ↔ Vault
// =============================================================================

/// Handler for `OptIn` events from the operator-vault opt-in service.
pub struct OperatorVaultOptInHandler;

#[async_trait]
impl EventHandler for OperatorVaultOptInHandler {
    fn name(&self) -> &'static str {
        "operator_vault_opt_in"
    }

    fn kinds(&self) -> &'static [EventKind] {
        &[EventKind::OperatorVaultOptIn]
    }

    async fn handle(&self, event: &StakingEvent, ctx: &HandlerContext) -> DomainResult<()> {
        let EventPayload::OperatorVaultOptIn(payload) = &event.payload else {
            return Err(DomainError::DecodingError(format!(
                "operator_vault_opt_in handler received {}",
                event.kind()
            )));
        };
        let meta = &event.meta;
        let store = ctx.store.as_ref();

        let id = VaultOperatorOptIn::id_for(&payload.vault, &payload.operator);
        let mut opt_in = store
            .load_or_init::<VaultOperatorOptIn, _>(&id, || VaultOperatorOptIn {
                id: id.clone(),
                vault: payload.vault.to_hex(),
                operator: payload.operator.to_hex(),
                is_opted_in: false,
                created_at: meta.timestamp,
                created_at_block: meta.block_number,
                updated_at: meta.timestamp,
                updated_at_block: meta.block_number,
            })
            .await?;
        opt_in.is_opted_in = payload.is_opted_in;
        opt_in.updated_at = meta.timestamp;
        opt_in.updated_at_block = meta.block_number;
        store.put(&opt_in).await?;

        let delta = counter_delta(payload.is_opted_in);

        match store
            .get::<Operator>(&Operator::id_for(&payload.operator))
            .await?
        {
            Some(mut operator) => {
                operator.vault_count += delta;
                operator.updated_at = meta.timestamp;
                store.put(&operator).await?;
            }
            None => {
                debug!(operator = %payload.operator, "Opt-in for unknown operator, counter skipped");
            }
        }

        match store.get::<Vault>(&Vault::id_for(&payload.vault)).await? {
            Some(mut vault) => {
                vault.operator_count += delta;
                vault.updated_at = meta.timestamp;
                store.put(&vault).await?;
            }
            None => {
                debug!(vault = %payload.vault, "Opt-in for unknown vault, counter skipped");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use symbiont_core::models::{
        Address, EventMeta, OperatorNetworkOptIn as OperatorNetworkOptInEvent, OperatorRegistered,
        NetworkRegistered, TxHash,
    };
    use symbiont_core::ports::WatchedSources;
    use symbiont_storage::InMemoryEntityStore;

    use crate::registration::{NetworkRegistryHandler, OperatorRegistryHandler};

    fn ctx() -> HandlerContext {
        HandlerContext::new(
            Arc::new(InMemoryEntityStore::new()),
            Arc::new(WatchedSources::new()),
        )
    }

    fn meta(ts: i64, log_index: u32) -> EventMeta {
        EventMeta {
            tx_hash: TxHash::from([0x05; 32]),
            log_index,
            block_number: 7,
            timestamp: ts,
            origin: Address::from([0xee; 20]),
            tx_from: Address::from([0xff; 20]),
        }
    }

    fn opt_in_event(operator: Address, network: Address, opted: bool, ts: i64) -> StakingEvent {
        StakingEvent {
            meta: meta(ts, 0),
            payload: EventPayload::OperatorNetworkOptIn(OperatorNetworkOptInEvent {
                operator,
                network,
                is_opted_in: opted,
            }),
        }
    }

    async fn register_pair(ctx: &HandlerContext, operator: Address, network: Address) {
        let op_event = StakingEvent {
            meta: meta(0, 0),
            payload: EventPayload::OperatorRegistered(OperatorRegistered {
                operator,
                admin: Address::from([0xad; 20]),
            }),
        };
        OperatorRegistryHandler.handle(&op_event, ctx).await.unwrap();

        let net_event = StakingEvent {
            meta: meta(0, 1),
            payload: EventPayload::NetworkRegistered(NetworkRegistered {
                network,
                admin: Address::from([0xad; 20]),
            }),
        };
        NetworkRegistryHandler.handle(&net_event, ctx).await.unwrap();
    }

    // Opt-in puis opt-out: les compteurs reviennent à 0
    #[tokio::test]
    async fn test_toggle_nets_to_zero() {
        let ctx = ctx();
        let operator = Address::from([0xaa; 20]);
        let network = Address::from([0xbb; 20]);
        register_pair(&ctx, operator, network).await;

        OperatorNetworkOptInHandler
            .handle(&opt_in_event(operator, network, true, 100), &ctx)
            .await
            .unwrap();
        OperatorNetworkOptInHandler
            .handle(&opt_in_event(operator, network, false, 200), &ctx)
            .await
            .unwrap();

        let record: OperatorNetworkOptIn = ctx
            .store
            .get(&OperatorNetworkOptIn::id_for(&operator, &network))
            .await
            .unwrap()
            .unwrap();
        assert!(!record.is_opted_in);
        assert_eq!(record.created_at, 100);
        assert_eq!(record.updated_at, 200);

        let op: Operator = ctx
            .store
            .get(&Operator::id_for(&operator))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(op.network_count, 0);

        let net: Network = ctx
            .store
            .get(&Network::id_for(&network))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(net.operator_count, 0);
    }

    #[tokio::test]
    async fn test_single_opt_in_moves_counters_by_exactly_one() {
        let ctx = ctx();
        let operator = Address::from([0x01; 20]);
        let network = Address::from([0x02; 20]);
        register_pair(&ctx, operator, network).await;

        OperatorNetworkOptInHandler
            .handle(&opt_in_event(operator, network, true, 100), &ctx)
            .await
            .unwrap();

        let op: Operator = ctx
            .store
            .get(&Operator::id_for(&operator))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(op.network_count, 1);

        let net: Network = ctx
            .store
            .get(&Network::id_for(&network))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(net.operator_count, 1);
    }

    // Sémantique par événement préservée: deux `true` consécutifs comptent deux fois
    #[tokio::test]
    async fn test_repeated_same_flag_counts_per_event() {
        let ctx = ctx();
        let operator = Address::from([0x03; 20]);
        let network = Address::from([0x04; 20]);
        register_pair(&ctx, operator, network).await;

        for ts in [100, 200] {
            OperatorNetworkOptInHandler
                .handle(&opt_in_event(operator, network, true, ts), &ctx)
                .await
                .unwrap();
        }

        let op: Operator = ctx
            .store
            .get(&Operator::id_for(&operator))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(op.network_count, 2);
    }

    // Contrepartie absente: l'enregistrement d'opt-in reste autoritaire
    #[tokio::test]
    async fn test_missing_counterparts_do_not_fail() {
        let ctx = ctx();
        let operator = Address::from([0x05; 20]);
        let network = Address::from([0x06; 20]);

        OperatorNetworkOptInHandler
            .handle(&opt_in_event(operator, network, true, 100), &ctx)
            .await
            .unwrap();

        let record: Option<OperatorNetworkOptIn> = ctx
            .store
            .get(&OperatorNetworkOptIn::id_for(&operator, &network))
            .await
            .unwrap();
        assert!(record.unwrap().is_opted_in);

        let op: Option<Operator> = ctx.store.get(&Operator::id_for(&operator)).await.unwrap();
        assert!(op.is_none());
    }

    #[tokio::test]
    async fn test_vault_opt_in_updates_operator_side() {
        let ctx = ctx();
        let operator = Address::from([0x07; 20]);
        let vault = Address::from([0x08; 20]);

        let op_event = StakingEvent {
            meta: meta(0, 0),
            payload: EventPayload::OperatorRegistered(OperatorRegistered {
                operator,
                admin: Address::from([0xad; 20]),
            }),
        };
        OperatorRegistryHandler
            .handle(&op_event, &ctx)
            .await
            .unwrap();

        let event = StakingEvent {
            meta: meta(100, 0),
            payload: EventPayload::OperatorVaultOptIn(
                symbiont_core::models::OperatorVaultOptIn {
                    operator,
                    vault,
                    is_opted_in: true,
                },
            ),
        };
        OperatorVaultOptInHandler.handle(&event, &ctx).await.unwrap();

        let op: Operator = ctx
            .store
            .get(&Operator::id_for(&operator))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(op.vault_count, 1);

        let record: VaultOperatorOptIn = ctx
            .store
            .get(&VaultOperatorOptIn::id_for(&vault, &operator))
            .await
            .unwrap()
            .unwrap();
        assert!(record.is_opted_in);
    }
}
