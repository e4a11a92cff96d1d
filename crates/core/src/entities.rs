//! Derived entities persisted through the entity store.
//!
//! Every entity id is a pure function of immutable identifying fields
//! (an address, or an ordered pair of addresses), which is what makes each
//! handler idempotent under at-least-once delivery. Running totals use signed
//! decimals: adversarial or mid-history input can legitimately drive a
//! vault's totals negative, and no clamp is applied.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::Address;

// =============================================================================
// Entity kinds
// =============================================================================

/// Discriminator for entity storage. One kind per persisted entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Protocol,
    Network,
    Operator,
    Vault,
    VaultConfiguration,
    OperatorNetworkOptIn,
    VaultOperatorOptIn,
    Deposit,
    Withdrawal,
    Slash,
    Claim,
    DailyVaultMetric,
    DailyProtocolMetric,
}

impl EntityKind {
    /// Stable storage name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Protocol => "protocol",
            EntityKind::Network => "network",
            EntityKind::Operator => "operator",
            EntityKind::Vault => "vault",
            EntityKind::VaultConfiguration => "vault_configuration",
            EntityKind::OperatorNetworkOptIn => "operator_network_opt_in",
            EntityKind::VaultOperatorOptIn => "vault_operator_opt_in",
            EntityKind::Deposit => "deposit",
            EntityKind::Withdrawal => "withdrawal",
            EntityKind::Slash => "slash",
            EntityKind::Claim => "claim",
            EntityKind::DailyVaultMetric => "daily_vault_metric",
            EntityKind::DailyProtocolMetric => "daily_protocol_metric",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type that can be persisted through the entity store.
pub trait StoreEntity: Serialize + DeserializeOwned + Send + Sync {
    /// Storage discriminator for this entity type.
    const KIND: EntityKind;

    /// Stable id of this instance.
    fn id(&self) -> &str;
}

macro_rules! impl_store_entity {
    ($type:ty, $kind:expr) => {
        impl StoreEntity for $type {
            const KIND: EntityKind = $kind;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

// =============================================================================
// Protocol singleton
// =============================================================================

/// Protocol-wide aggregate record. A single instance exists, keyed by
/// [`crate::constants::PROTOCOL_ID`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Protocol {
    pub id: String,
    pub vault_factory_address: Address,
    pub delegator_factory_address: Address,
    pub slasher_factory_address: Address,
    pub network_registry_address: Address,
    pub operator_registry_address: Address,
    pub vault_configurator_address: Address,
    pub total_vaults: i64,
    pub total_operators: i64,
    pub total_networks: i64,
    pub total_tvl: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
}

impl_store_entity!(Protocol, EntityKind::Protocol);

// =============================================================================
// Registered parties
// =============================================================================

/// A consumer of staked collateral, keyed by its address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub address: Address,
    pub admin: Address,
    pub middleware: Option<Address>,
    /// Placeholder default pending richer on-chain configuration.
    pub epoch_duration: i64,
    /// Placeholder default pending richer on-chain configuration.
    pub slashing_window: i64,
    pub total_stake: Decimal,
    pub operator_count: i64,
    pub vault_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub created_at_block: u64,
}

impl Network {
    pub fn id_for(address: &Address) -> String {
        address.to_hex()
    }
}

impl_store_entity!(Network, EntityKind::Network);

/// An entity that can be delegated stake, keyed by its address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    pub id: String,
    pub address: Address,
    pub admin: Address,
    pub total_stake: Decimal,
    pub network_count: i64,
    pub vault_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub created_at_block: u64,
}

impl Operator {
    pub fn id_for(address: &Address) -> String {
        address.to_hex()
    }
}

impl_store_entity!(Operator, EntityKind::Operator);

// =============================================================================
// Vaults
// =============================================================================

/// Classification of a vault's delegation module.
///
/// Currently defaulted pending contract code detection; callers must not
/// treat it as authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelegatorType {
    Full,
    NetworkRestake,
}

/// Classification of a vault's slashing module. Same placeholder status as
/// [`DelegatorType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlasherType {
    Instant,
    Veto,
}

/// A pooled collateral contract, keyed by its address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vault {
    pub id: String,
    pub address: Address,
    pub creator: Address,
    pub collateral_token: Address,
    /// Placeholder until token metadata enrichment is available.
    pub collateral_symbol: String,
    /// Placeholder until token metadata enrichment is available.
    pub collateral_decimals: u32,
    pub delegator_type: DelegatorType,
    pub slasher_type: SlasherType,
    pub deposit_whitelist: bool,
    pub is_deposit_limit: bool,
    pub deposit_limit: u128,
    pub total_staked: Decimal,
    pub total_shares: Decimal,
    pub user_count: i64,
    pub operator_count: i64,
    pub restaking_ratio: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
    pub created_at_block: u64,
}

impl Vault {
    pub fn id_for(address: &Address) -> String {
        address.to_hex()
    }
}

impl_store_entity!(Vault, EntityKind::Vault);

/// Per-vault configuration record, created alongside its vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfiguration {
    pub id: String,
    pub vault: String,
    pub admin: Address,
    pub delegator: Address,
    pub slasher: Address,
    pub epoch_duration: i64,
    pub vesting_duration: i64,
    pub updated_at: i64,
    pub updated_at_block: u64,
}

impl VaultConfiguration {
    pub fn id_for(vault_id: &str) -> String {
        format!("{vault_id}-config")
    }
}

impl_store_entity!(VaultConfiguration, EntityKind::VaultConfiguration);

// =============================================================================
// Opt-in relationships
// =============================================================================

/// Toggleable opt-in relationship between an operator and a network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorNetworkOptIn {
    pub id: String,
    pub operator: String,
    pub network: String,
    pub is_opted_in: bool,
    pub created_at: i64,
    pub created_at_block: u64,
    pub updated_at: i64,
    pub updated_at_block: u64,
}

impl OperatorNetworkOptIn {
    pub fn id_for(operator: &Address, network: &Address) -> String {
        format!("{}-{}", operator.to_hex(), network.to_hex())
    }
}

impl_store_entity!(OperatorNetworkOptIn, EntityKind::OperatorNetworkOptIn);

/// Toggleable opt-in relationship between a vault and an operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultOperatorOptIn {
    pub id: String,
    pub vault: String,
    pub operator: String,
    pub is_opted_in: bool,
    pub created_at: i64,
    pub created_at_block: u64,
    pub updated_at: i64,
    pub updated_at_block: u64,
}

impl VaultOperatorOptIn {
    pub fn id_for(vault: &Address, operator: &Address) -> String {
        format!("{}-{}", vault.to_hex(), operator.to_hex())
    }
}

impl_store_entity!(VaultOperatorOptIn, EntityKind::VaultOperatorOptIn);

// =============================================================================
// Append-only activity records
// =============================================================================

/// One deposit occurrence. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRecord {
    pub id: String,
    pub vault: String,
    pub depositor: Address,
    pub recipient: Address,
    pub amount: Decimal,
    pub shares: Decimal,
    pub timestamp: i64,
    pub block_number: u64,
    pub transaction_hash: crate::models::TxHash,
}

impl_store_entity!(DepositRecord, EntityKind::Deposit);

/// One withdrawal occurrence, carrying the epoch at which it becomes
/// claimable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRecord {
    pub id: String,
    pub vault: String,
    pub withdrawer: Address,
    pub claimer: Address,
    pub epoch: u64,
    pub amount: Decimal,
    pub shares: Decimal,
    pub timestamp: i64,
    pub block_number: u64,
    pub transaction_hash: crate::models::TxHash,
}

impl_store_entity!(WithdrawalRecord, EntityKind::Withdrawal);

/// One slash occurrence. `capture_timestamp` is when the slashed stake was
/// captured, not when the slash executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlashRecord {
    pub id: String,
    pub vault: String,
    pub slasher: Address,
    pub amount: Decimal,
    pub capture_timestamp: i64,
    pub timestamp: i64,
    pub block_number: u64,
    pub transaction_hash: crate::models::TxHash,
}

impl_store_entity!(SlashRecord, EntityKind::Slash);

/// One claim occurrence. Claims realize previously-withdrawn funds and do
/// not re-affect the stake ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub id: String,
    pub vault: String,
    pub claimer: Address,
    pub amount: Decimal,
    pub timestamp: i64,
    pub block_number: u64,
    pub transaction_hash: crate::models::TxHash,
}

impl_store_entity!(ClaimRecord, EntityKind::Claim);

// =============================================================================
// Day-bucketed metrics
// =============================================================================

/// Per-vault daily snapshot, overwritten (never summed) on later mutations
/// the same day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyVaultMetric {
    pub id: String,
    pub vault: String,
    pub day: i64,
    pub deposits_count: i64,
    pub deposits_volume: Decimal,
    pub withdrawals_count: i64,
    pub withdrawals_volume: Decimal,
    pub total_staked: Decimal,
    pub total_shares: Decimal,
    pub user_count: i64,
    /// Start of the day-bucket (unix seconds).
    pub timestamp: i64,
}

impl DailyVaultMetric {
    pub fn id_for(vault_id: &str, day: i64) -> String {
        format!("{vault_id}-{day}")
    }
}

impl_store_entity!(DailyVaultMetric, EntityKind::DailyVaultMetric);

/// Protocol-wide daily snapshot, same overwrite semantics as
/// [`DailyVaultMetric`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyProtocolMetric {
    pub id: String,
    pub day: i64,
    pub total_tvl: Decimal,
    pub total_vaults: i64,
    pub total_operators: i64,
    pub total_networks: i64,
    pub total_users: i64,
    pub timestamp: i64,
}

impl DailyProtocolMetric {
    pub fn id_for(day: i64) -> String {
        day.to_string()
    }
}

impl_store_entity!(DailyProtocolMetric, EntityKind::DailyProtocolMetric);
