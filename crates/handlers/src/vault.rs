//! Handler for per-vault activity events.
//!
//! Every activity event produces an append-only record keyed by
//! `<tx-hash>-<log-index>`, whether or not the vault entity exists. Aggregate
//! updates only run when the vault is known; activity from an unknown vault
//! (created before aggregation started, or outside the factory) keeps its
//! record but is skipped for aggregation, without failing the event.
//!
//! `user_count` moves per deposit event, not per distinct depositor - the
//! known approximation is kept (see DESIGN.md). Withdrawals and slashes
//! subtract without clamping, so adversarial or mid-history input can drive
//! totals negative.

use async_trait::async_trait;
use tracing::{debug, warn};

use symbiont_core::constants::decimal_from_raw;
use symbiont_core::entities::{
    ClaimRecord, DepositRecord, SlashRecord, Vault, WithdrawalRecord,
};
use symbiont_core::error::{DomainError, DomainResult};
use symbiont_core::models::{EventKind, EventPayload, StakingEvent};
use symbiont_core::ports::{EntityStore, EntityStoreExt, EventHandler, HandlerContext};

use crate::rollup::update_daily_vault_metric;

/// Handler for deposit, withdrawal, slash and claim events emitted by vault
/// contracts.
pub struct VaultActivityHandler;

#[async_trait]
impl EventHandler for VaultActivityHandler {
    fn name(&self) -> &'static str {
        "vault_activity"
    }

    fn kinds(&self) -> &'static [EventKind] {
        &[
            EventKind::Deposit,
            EventKind::Withdrawal,
            EventKind::Slash,
            EventKind::Claim,
        ]
    }

    async fn handle(&self, event: &StakingEvent, ctx: &HandlerContext) -> DomainResult<()> {
        let store = ctx.store.as_ref();
        match &event.payload {
            EventPayload::Deposit(payload) => {
                handle_deposit(store, event, payload).await
            }
            EventPayload::Withdrawal(payload) => {
                handle_withdrawal(store, event, payload).await
            }
            EventPayload::Slash(payload) => handle_slash(store, event, payload).await,
            EventPayload::Claim(payload) => handle_claim(store, event, payload).await,
            other => Err(DomainError::DecodingError(format!(
                "vault_activity handler received {}",
                other.kind()
            ))),
        }
    }
}

/// Load the vault behind `meta.origin`, logging when it is unknown.
async fn load_origin_vault(
    store: &dyn EntityStore,
    event: &StakingEvent,
) -> DomainResult<Option<Vault>> {
    let id = Vault::id_for(&event.meta.origin);
    let vault = store.get::<Vault>(&id).await?;
    if vault.is_none() {
        warn!(
            vault = %id,
            kind = %event.kind(),
            "Activity from unknown vault, record kept but aggregates skipped"
        );
    }
    Ok(vault)
}

async fn handle_deposit(
    store: &dyn EntityStore,
    event: &StakingEvent,
    payload: &symbiont_core::models::Deposit,
) -> DomainResult<()> {
    let meta = &event.meta;
    let amount = decimal_from_raw(payload.amount)?;
    let shares = decimal_from_raw(payload.shares)?;

    let record = DepositRecord {
        id: meta.record_id(),
        vault: Vault::id_for(&meta.origin),
        depositor: payload.depositor,
        recipient: payload.recipient,
        amount,
        shares,
        timestamp: meta.timestamp,
        block_number: meta.block_number,
        transaction_hash: meta.tx_hash,
    };
    store.put(&record).await?;

    let Some(mut vault) = load_origin_vault(store, event).await? else {
        return Ok(());
    };

    vault.total_staked += amount;
    vault.total_shares += shares;
    vault.user_count += 1;
    vault.updated_at = meta.timestamp;
    store.put(&vault).await?;

    update_daily_vault_metric(store, &vault, meta.timestamp).await?;

    debug!(vault = %vault.id, %amount, "Deposit aggregated");
    Ok(())
}

async fn handle_withdrawal(
    store: &dyn EntityStore,
    event: &StakingEvent,
    payload: &symbiont_core::models::Withdrawal,
) -> DomainResult<()> {
    let meta = &event.meta;
    let amount = decimal_from_raw(payload.amount)?;
    let shares = decimal_from_raw(payload.shares)?;

    let record = WithdrawalRecord {
        id: meta.record_id(),
        vault: Vault::id_for(&meta.origin),
        withdrawer: payload.withdrawer,
        claimer: payload.claimer,
        epoch: payload.epoch,
        amount,
        shares,
        timestamp: meta.timestamp,
        block_number: meta.block_number,
        transaction_hash: meta.tx_hash,
    };
    store.put(&record).await?;

    let Some(mut vault) = load_origin_vault(store, event).await? else {
        return Ok(());
    };

    vault.total_staked -= amount;
    vault.total_shares -= shares;
    vault.updated_at = meta.timestamp;
    store.put(&vault).await?;

    update_daily_vault_metric(store, &vault, meta.timestamp).await?;

    debug!(vault = %vault.id, %amount, epoch = payload.epoch, "Withdrawal aggregated");
    Ok(())
}

async fn handle_slash(
    store: &dyn EntityStore,
    event: &StakingEvent,
    payload: &symbiont_core::models::Slash,
) -> DomainResult<()> {
    let meta = &event.meta;
    let amount = decimal_from_raw(payload.amount)?;

    let record = SlashRecord {
        id: meta.record_id(),
        vault: Vault::id_for(&meta.origin),
        slasher: payload.slasher,
        amount,
        capture_timestamp: payload.capture_timestamp,
        timestamp: meta.timestamp,
        block_number: meta.block_number,
        transaction_hash: meta.tx_hash,
    };
    store.put(&record).await?;

    let Some(mut vault) = load_origin_vault(store, event).await? else {
        return Ok(());
    };

    // Slashing burns stake but leaves shares alone; the share price drops.
    vault.total_staked -= amount;
    vault.updated_at = meta.timestamp;
    store.put(&vault).await?;

    update_daily_vault_metric(store, &vault, meta.timestamp).await?;

    debug!(vault = %vault.id, %amount, "Slash aggregated");
    Ok(())
}

async fn handle_claim(
    store: &dyn EntityStore,
    event: &StakingEvent,
    payload: &symbiont_core::models::Claim,
) -> DomainResult<()> {
    let meta = &event.meta;
    let amount = decimal_from_raw(payload.amount)?;

    let record = ClaimRecord {
        id: meta.record_id(),
        vault: Vault::id_for(&meta.origin),
        claimer: payload.claimer,
        amount,
        timestamp: meta.timestamp,
        block_number: meta.block_number,
        transaction_hash: meta.tx_hash,
    };
    store.put(&record).await?;

    let Some(mut vault) = load_origin_vault(store, event).await? else {
        return Ok(());
    };

    // Claims realize already-withdrawn funds; the stake ledger was debited
    // at withdrawal time.
    vault.updated_at = meta.timestamp;
    store.put(&vault).await?;

    debug!(vault = %vault.id, %amount, "Claim recorded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use symbiont_core::constants::day_index;
    use symbiont_core::entities::{DailyVaultMetric, EntityKind};
    use symbiont_core::models::{
        Address, Claim, Deposit, EventMeta, Slash, TxHash, VaultCreated, Withdrawal,
    };
    use symbiont_core::ports::WatchedSources;
    use symbiont_storage::InMemoryEntityStore;

    use crate::vault_factory::VaultFactoryHandler;

    fn ctx() -> (HandlerContext, Arc<InMemoryEntityStore>) {
        let store = Arc::new(InMemoryEntityStore::new());
        let ctx = HandlerContext::new(store.clone(), Arc::new(WatchedSources::new()));
        (ctx, store)
    }

    fn activity_event(
        vault: Address,
        payload: EventPayload,
        ts: i64,
        log_index: u32,
    ) -> StakingEvent {
        StakingEvent {
            meta: EventMeta {
                tx_hash: TxHash::from([0x0a; 32]),
                log_index,
                block_number: 500,
                timestamp: ts,
                origin: vault,
                tx_from: Address::from([0xdd; 20]),
            },
            payload,
        }
    }

    async fn create_vault(ctx: &HandlerContext, vault: Address, ts: i64) {
        let event = StakingEvent {
            meta: EventMeta {
                tx_hash: TxHash::from([0x0b; 32]),
                log_index: 0,
                block_number: 400,
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
        };
        VaultFactoryHandler.handle(&event, ctx).await.unwrap();
    }

    // Scénario de bout en bout: dépôt de 1000 puis retrait de 400
    #[tokio::test]
    async fn test_deposit_then_withdrawal_nets_totals() {
        let (ctx, mem) = ctx();
        let vault_addr = Address::from([0x60; 20]);
        create_vault(&ctx, vault_addr, 10).await;

        let deposit = activity_event(
            vault_addr,
            EventPayload::Deposit(Deposit {
                depositor: Address::from([0x61; 20]),
                recipient: Address::from([0x61; 20]),
                amount: 1_000,
                shares: 1_000,
            }),
            20,
            0,
        );
        VaultActivityHandler.handle(&deposit, &ctx).await.unwrap();

        let withdrawal = activity_event(
            vault_addr,
            EventPayload::Withdrawal(Withdrawal {
                withdrawer: Address::from([0x61; 20]),
                claimer: Address::from([0x61; 20]),
                epoch: 3,
                amount: 400,
                shares: 400,
            }),
            30,
            1,
        );
        VaultActivityHandler.handle(&withdrawal, &ctx).await.unwrap();

        let vault: Vault = ctx
            .store
            .get(&Vault::id_for(&vault_addr))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(vault.total_staked, Decimal::from(600));
        assert_eq!(vault.total_shares, Decimal::from(600));
        assert_eq!(vault.user_count, 1);

        // Les deux mutations tombent le jour 0: un seul bucket, dernier état
        let metric: DailyVaultMetric = ctx
            .store
            .get(&DailyVaultMetric::id_for(&vault.id, day_index(30)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(metric.total_staked, Decimal::from(600));
        assert_eq!(metric.total_shares, Decimal::from(600));
        assert_eq!(metric.user_count, 1);

        assert_eq!(mem.count(EntityKind::DailyVaultMetric), 1);
        assert_eq!(mem.count(EntityKind::Deposit), 1);
        assert_eq!(mem.count(EntityKind::Withdrawal), 1);
    }

    #[tokio::test]
    async fn test_slash_reduces_stake_but_not_shares() {
        let (ctx, _mem) = ctx();
        let vault_addr = Address::from([0x62; 20]);
        create_vault(&ctx, vault_addr, 10).await;

        let deposit = activity_event(
            vault_addr,
            EventPayload::Deposit(Deposit {
                depositor: Address::from([0x63; 20]),
                recipient: Address::from([0x63; 20]),
                amount: 1_000,
                shares: 1_000,
            }),
            20,
            0,
        );
        VaultActivityHandler.handle(&deposit, &ctx).await.unwrap();

        let slash = activity_event(
            vault_addr,
            EventPayload::Slash(Slash {
                slasher: Address::from([0x64; 20]),
                amount: 250,
                capture_timestamp: 15,
            }),
            40,
            1,
        );
        VaultActivityHandler.handle(&slash, &ctx).await.unwrap();

        let vault: Vault = ctx
            .store
            .get(&Vault::id_for(&vault_addr))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(vault.total_staked, Decimal::from(750));
        assert_eq!(vault.total_shares, Decimal::from(1_000));

        let record: SlashRecord = ctx
            .store
            .get(&format!("0x{}-1", "0a".repeat(32)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.capture_timestamp, 15);
    }

    #[tokio::test]
    async fn test_claim_touches_updated_at_only() {
        let (ctx, _mem) = ctx();
        let vault_addr = Address::from([0x65; 20]);
        create_vault(&ctx, vault_addr, 10).await;

        let claim = activity_event(
            vault_addr,
            EventPayload::Claim(Claim {
                claimer: Address::from([0x66; 20]),
                amount: 500,
            }),
            99,
            0,
        );
        VaultActivityHandler.handle(&claim, &ctx).await.unwrap();

        let vault: Vault = ctx
            .store
            .get(&Vault::id_for(&vault_addr))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(vault.total_staked, Decimal::ZERO);
        assert_eq!(vault.updated_at, 99);

        let record: ClaimRecord = ctx
            .store
            .get(&format!("0x{}-0", "0a".repeat(32)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.amount, Decimal::from(500));
    }

    // Activité d'un coffre inconnu: l'enregistrement survit, rien d'autre
    #[tokio::test]
    async fn test_unknown_vault_keeps_record_skips_aggregates() {
        let (ctx, mem) = ctx();
        let orphan = Address::from([0x70; 20]);

        let deposit = activity_event(
            orphan,
            EventPayload::Deposit(Deposit {
                depositor: Address::from([0x71; 20]),
                recipient: Address::from([0x71; 20]),
                amount: 1_000,
                shares: 1_000,
            }),
            20,
            0,
        );
        VaultActivityHandler.handle(&deposit, &ctx).await.unwrap();

        let record: DepositRecord = ctx
            .store
            .get(&format!("0x{}-0", "0a".repeat(32)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.vault, orphan.to_hex());

        let vault: Option<Vault> = ctx.store.get(&Vault::id_for(&orphan)).await.unwrap();
        assert!(vault.is_none());

        assert_eq!(mem.count(EntityKind::DailyVaultMetric), 0);
    }

    // Retrait supérieur au solde: le total devient négatif, sans clamp
    #[tokio::test]
    async fn test_over_withdrawal_goes_negative() {
        let (ctx, _mem) = ctx();
        let vault_addr = Address::from([0x72; 20]);
        create_vault(&ctx, vault_addr, 10).await;

        let withdrawal = activity_event(
            vault_addr,
            EventPayload::Withdrawal(Withdrawal {
                withdrawer: Address::from([0x73; 20]),
                claimer: Address::from([0x73; 20]),
                epoch: 1,
                amount: 300,
                shares: 300,
            }),
            20,
            0,
        );
        VaultActivityHandler.handle(&withdrawal, &ctx).await.unwrap();

        let vault: Vault = ctx
            .store
            .get(&Vault::id_for(&vault_addr))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(vault.total_staked, Decimal::from(-300));
    }
}
