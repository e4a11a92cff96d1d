//! Day-bucketed metric rollups.
//!
//! Both rollups are pure projections of their subject's current aggregate
//! state into a bucket keyed by `floor(timestamp / 86400)`. Snapshot fields
//! are idempotently overwritten, never summed, so re-processing the same
//! event leaves the bucket in the same final state.

use rust_decimal::Decimal;

use symbiont_core::constants::{day_index, day_start};
use symbiont_core::entities::{DailyProtocolMetric, DailyVaultMetric, Protocol, Vault};
use symbiont_core::error::DomainResult;
use symbiont_core::ports::{EntityStore, EntityStoreExt};

/// Overwrite the vault's day bucket with its current aggregate state.
pub async fn update_daily_vault_metric(
    store: &dyn EntityStore,
    vault: &Vault,
    timestamp: i64,
) -> DomainResult<()> {
    let day = day_index(timestamp);
    let id = DailyVaultMetric::id_for(&vault.id, day);

    let mut metric = store
        .load_or_init::<DailyVaultMetric, _>(&id, || DailyVaultMetric {
            id: id.clone(),
            vault: vault.id.clone(),
            day,
            deposits_count: 0,
            deposits_volume: Decimal::ZERO,
            withdrawals_count: 0,
            withdrawals_volume: Decimal::ZERO,
            total_staked: Decimal::ZERO,
            total_shares: Decimal::ZERO,
            user_count: 0,
            timestamp: day_start(timestamp),
        })
        .await?;

    metric.total_staked = vault.total_staked;
    metric.total_shares = vault.total_shares;
    metric.user_count = vault.user_count;
    store.put(&metric).await?;

    Ok(())
}

/// Overwrite the protocol's day bucket with its current totals.
pub async fn update_daily_protocol_metric(
    store: &dyn EntityStore,
    protocol: &Protocol,
    timestamp: i64,
) -> DomainResult<()> {
    let day = day_index(timestamp);
    let id = DailyProtocolMetric::id_for(day);

    let mut metric = store
        .load_or_init::<DailyProtocolMetric, _>(&id, || DailyProtocolMetric {
            id: id.clone(),
            day,
            total_tvl: Decimal::ZERO,
            total_vaults: 0,
            total_operators: 0,
            total_networks: 0,
            total_users: 0,
            timestamp: day_start(timestamp),
        })
        .await?;

    metric.total_tvl = protocol.total_tvl;
    metric.total_vaults = protocol.total_vaults;
    metric.total_operators = protocol.total_operators;
    metric.total_networks = protocol.total_networks;
    store.put(&metric).await?;

    Ok(())
}
