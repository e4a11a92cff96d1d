//! Handler for vault creation events from the vault factory.
//!
//! Creating a vault is the one operation that grows the watched source set
//! at runtime: every new vault address is handed to the source registry so
//! its own deposit/withdrawal/slash/claim events are picked up from that
//! point on.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, info};

use symbiont_core::entities::{DelegatorType, SlasherType, Vault, VaultConfiguration};
use symbiont_core::error::{DomainError, DomainResult};
use symbiont_core::metrics::record_source_registered;
use symbiont_core::models::{Address, EventKind, EventPayload, StakingEvent};
use symbiont_core::ports::{EntityStoreExt, EventHandler, HandlerContext};

use crate::protocol::ensure_protocol;
use crate::rollup::update_daily_protocol_metric;

/// Default vault epoch duration (1 day), pending on-chain configuration
/// lookup.
const DEFAULT_VAULT_EPOCH_DURATION: i64 = 86_400;

/// Default veto/vesting duration (7 days), same placeholder status.
const DEFAULT_VESTING_DURATION: i64 = 604_800;

/// Classify the delegation module behind `delegator`.
///
/// Placeholder: always `Full` until contract code detection lands.
fn classify_delegator(_delegator: &Address) -> DelegatorType {
    DelegatorType::Full
}

/// Classify the slashing module behind `slasher`.
///
/// Placeholder: always `Instant` until contract code detection lands.
fn classify_slasher(_slasher: &Address) -> SlasherType {
    SlasherType::Instant
}

/// Handler for `AddEntity` events from the vault factory.
pub struct VaultFactoryHandler;

#[async_trait]
impl EventHandler for VaultFactoryHandler {
    fn name(&self) -> &'static str {
        "vault_factory"
    }

    fn kinds(&self) -> &'static [EventKind] {
        &[EventKind::VaultCreated]
    }

    async fn handle(&self, event: &StakingEvent, ctx: &HandlerContext) -> DomainResult<()> {
        let EventPayload::VaultCreated(payload) = &event.payload else {
            return Err(DomainError::DecodingError(format!(
                "vault_factory handler received {}",
                event.kind()
            )));
        };
        let meta = &event.meta;
        let store = ctx.store.as_ref();

        let mut protocol = ensure_protocol(store, meta.timestamp).await?;
        protocol.total_vaults += 1;
        protocol.updated_at = meta.timestamp;
        store.put(&protocol).await?;

        let id = Vault::id_for(&payload.vault);
        let vault = Vault {
            id: id.clone(),
            address: payload.vault,
            creator: meta.tx_from,
            collateral_token: payload.collateral,
            collateral_symbol: "Unknown".to_string(),
            collateral_decimals: 18,
            delegator_type: classify_delegator(&payload.delegator),
            slasher_type: classify_slasher(&payload.slasher),
            deposit_whitelist: false,
            is_deposit_limit: false,
            deposit_limit: 0,
            total_staked: Decimal::ZERO,
            total_shares: Decimal::ZERO,
            user_count: 0,
            operator_count: 0,
            restaking_ratio: Decimal::ZERO,
            created_at: meta.timestamp,
            updated_at: meta.timestamp,
            created_at_block: meta.block_number,
        };
        store.put(&vault).await?;

        let configuration = VaultConfiguration {
            id: VaultConfiguration::id_for(&id),
            vault: id.clone(),
            admin: payload.admin,
            delegator: payload.delegator,
            slasher: payload.slasher,
            epoch_duration: DEFAULT_VAULT_EPOCH_DURATION,
            vesting_duration: DEFAULT_VESTING_DURATION,
            updated_at: meta.timestamp,
            updated_at_block: meta.block_number,
        };
        store.put(&configuration).await?;

        // From this block on, the vault's own events are in scope.
        ctx.sources.register_source(&payload.vault).await?;
        record_source_registered();

        update_daily_protocol_metric(store, &protocol, meta.timestamp).await?;

        info!(vault = %id, block = meta.block_number, "🏦 Vault created and registered as source");
        debug!(
            collateral = %payload.collateral,
            delegator = %payload.delegator,
            slasher = %payload.slasher,
            "Vault modules recorded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use symbiont_core::constants::PROTOCOL_ID;
    use symbiont_core::entities::{DailyProtocolMetric, Protocol};
    use symbiont_core::models::{EventMeta, TxHash, VaultCreated};
    use symbiont_core::ports::WatchedSources;
    use symbiont_storage::InMemoryEntityStore;

    fn creation_event(vault: Address, ts: i64, log_index: u32) -> StakingEvent {
        StakingEvent {
            meta: EventMeta {
                tx_hash: TxHash::from([0x09; 32]),
                log_index,
                block_number: 321,
                timestamp: ts,
                origin: Address::from([0xfa; 20]),
                tx_from: Address::from([0xcc; 20]),
            },
            payload: EventPayload::VaultCreated(VaultCreated {
                vault,
                collateral: Address::from([0x11; 20]),
                delegator: Address::from([0x12; 20]),
                slasher: Address::from([0x13; 20]),
                admin: Address::from([0x14; 20]),
            }),
        }
    }

    #[tokio::test]
    async fn test_vault_creation_persists_vault_and_configuration() {
        let sources = Arc::new(WatchedSources::new());
        let ctx = HandlerContext::new(Arc::new(InMemoryEntityStore::new()), sources.clone());
        let vault_addr = Address::from([0x40; 20]);

        VaultFactoryHandler
            .handle(&creation_event(vault_addr, 1_700_000_000, 0), &ctx)
            .await
            .unwrap();

        let vault: Vault = ctx
            .store
            .get(&Vault::id_for(&vault_addr))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(vault.creator, Address::from([0xcc; 20]));
        assert_eq!(vault.collateral_symbol, "Unknown");
        assert_eq!(vault.collateral_decimals, 18);
        assert_eq!(vault.delegator_type, DelegatorType::Full);
        assert_eq!(vault.slasher_type, SlasherType::Instant);
        assert_eq!(vault.total_staked, Decimal::ZERO);

        let config: VaultConfiguration = ctx
            .store
            .get(&VaultConfiguration::id_for(&vault.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(config.vault, vault.id);
        assert_eq!(config.epoch_duration, 86_400);
        assert_eq!(config.vesting_duration, 604_800);

        let protocol: Protocol = ctx.store.get(PROTOCOL_ID).await.unwrap().unwrap();
        assert_eq!(protocol.total_vaults, 1);

        // La création d'un coffre enregistre immédiatement sa source
        assert!(sources.is_watched(&vault_addr).await);
    }

    #[tokio::test]
    async fn test_vault_creation_writes_protocol_day_bucket() {
        let ctx = HandlerContext::new(
            Arc::new(InMemoryEntityStore::new()),
            Arc::new(WatchedSources::new()),
        );
        let ts = 1_700_000_000;

        VaultFactoryHandler
            .handle(&creation_event(Address::from([0x41; 20]), ts, 0), &ctx)
            .await
            .unwrap();

        let day = symbiont_core::constants::day_index(ts);
        let metric: DailyProtocolMetric = ctx
            .store
            .get(&DailyProtocolMetric::id_for(day))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(metric.total_vaults, 1);
    }

    #[tokio::test]
    async fn test_multiple_creations_register_distinct_sources() {
        let sources = Arc::new(WatchedSources::new());
        let ctx = HandlerContext::new(Arc::new(InMemoryEntityStore::new()), sources.clone());

        for i in 0..3u8 {
            let addr = Address::from([0x50 + i; 20]);
            VaultFactoryHandler
                .handle(&creation_event(addr, 1_000 + i as i64, i as u32), &ctx)
                .await
                .unwrap();
        }

        assert_eq!(sources.len().await, 3);
        let protocol: Protocol = ctx.store.get(PROTOCOL_ID).await.unwrap().unwrap();
        assert_eq!(protocol.total_vaults, 3);
    }
}
