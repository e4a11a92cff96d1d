//! Decoded chain event records - the engine's input contract.
//!
//! The transport layer is responsible for decoding raw logs and delivering
//! these records in canonical order (block number, then log index). The
//! engine never inspects raw encoded data.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// Fixed-size byte newtypes
// =============================================================================

/// Macro to generate fixed-size byte newtypes with common functionality.
///
/// Generates:
/// - `from_hex()` - Parse from hex string (with or without 0x prefix)
/// - `to_hex()` - Convert to 0x-prefixed lowercase hex string
/// - `Display` trait implementation
/// - `From<[u8; N]>` implementation
/// - Serde as a hex string (readable in JSON documents and event logs)
macro_rules! bytes_newtype {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Parse from hex string (with or without 0x prefix).
            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let s = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(s)?;
                let arr: [u8; $len] = bytes
                    .try_into()
                    .map_err(|_| hex::FromHexError::InvalidStringLength)?;
                Ok(Self(arr))
            }

            /// Convert to 0x-prefixed lowercase hex string.
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }

            /// Get the inner bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(D::Error::custom)
            }
        }
    };
}

bytes_newtype!(
    /// 20-byte EVM contract or account address.
    Address,
    20
);

bytes_newtype!(
    /// 32-byte transaction hash.
    TxHash,
    32
);

// =============================================================================
// Event envelope
// =============================================================================

/// Metadata shared by every decoded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMeta {
    /// Hash of the transaction that emitted the event.
    pub tx_hash: TxHash,
    /// Position of the log within the transaction receipt.
    pub log_index: u32,
    /// Block number containing the event.
    pub block_number: u64,
    /// Block timestamp (unix seconds).
    pub timestamp: i64,
    /// Address of the contract that emitted the event.
    pub origin: Address,
    /// Transaction sender.
    pub tx_from: Address,
}

impl EventMeta {
    /// Deterministic id for append-only records: `<tx-hash>-<log-index>`.
    pub fn record_id(&self) -> String {
        format!("{}-{}", self.tx_hash.to_hex(), self.log_index)
    }
}

/// Kinds of events the engine aggregates, used for handler dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NetworkRegistered,
    OperatorRegistered,
    OperatorNetworkOptIn,
    OperatorVaultOptIn,
    VaultCreated,
    Deposit,
    Withdrawal,
    Slash,
    Claim,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::NetworkRegistered => "network_registered",
            EventKind::OperatorRegistered => "operator_registered",
            EventKind::OperatorNetworkOptIn => "operator_network_opt_in",
            EventKind::OperatorVaultOptIn => "operator_vault_opt_in",
            EventKind::VaultCreated => "vault_created",
            EventKind::Deposit => "deposit",
            EventKind::Withdrawal => "withdrawal",
            EventKind::Slash => "slash",
            EventKind::Claim => "claim",
        };
        write!(f, "{name}")
    }
}

/// A decoded event with its metadata, as delivered by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingEvent {
    pub meta: EventMeta,
    pub payload: EventPayload,
}

impl StakingEvent {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

/// Event-specific fields, one variant per kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    NetworkRegistered(NetworkRegistered),
    OperatorRegistered(OperatorRegistered),
    OperatorNetworkOptIn(OperatorNetworkOptIn),
    OperatorVaultOptIn(OperatorVaultOptIn),
    VaultCreated(VaultCreated),
    Deposit(Deposit),
    Withdrawal(Withdrawal),
    Slash(Slash),
    Claim(Claim),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::NetworkRegistered(_) => EventKind::NetworkRegistered,
            EventPayload::OperatorRegistered(_) => EventKind::OperatorRegistered,
            EventPayload::OperatorNetworkOptIn(_) => EventKind::OperatorNetworkOptIn,
            EventPayload::OperatorVaultOptIn(_) => EventKind::OperatorVaultOptIn,
            EventPayload::VaultCreated(_) => EventKind::VaultCreated,
            EventPayload::Deposit(_) => EventKind::Deposit,
            EventPayload::Withdrawal(_) => EventKind::Withdrawal,
            EventPayload::Slash(_) => EventKind::Slash,
            EventPayload::Claim(_) => EventKind::Claim,
        }
    }
}

// =============================================================================
// Per-kind payloads
// =============================================================================

/// A network registered itself with the network registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRegistered {
    pub network: Address,
    pub admin: Address,
}

/// An operator registered itself with the operator registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorRegistered {
    pub operator: Address,
    pub admin: Address,
}

/// An operator toggled its opt-in state for a network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorNetworkOptIn {
    pub operator: Address,
    pub network: Address,
    pub is_opted_in: bool,
}

/// An operator toggled its opt-in state for a vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorVaultOptIn {
    pub operator: Address,
    pub vault: Address,
    pub is_opted_in: bool,
}

/// The vault factory deployed a new vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultCreated {
    pub vault: Address,
    pub collateral: Address,
    pub delegator: Address,
    pub slasher: Address,
    pub admin: Address,
}

/// Collateral deposited into a vault. Emitted by the vault itself, so
/// `meta.origin` identifies the vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    pub depositor: Address,
    pub recipient: Address,
    /// Raw token amount (smallest unit).
    pub amount: u128,
    /// Shares minted for the deposit.
    pub shares: u128,
}

/// Withdrawal requested from a vault, claimable at `epoch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
    pub withdrawer: Address,
    pub claimer: Address,
    pub epoch: u64,
    pub amount: u128,
    pub shares: u128,
}

/// A slasher reduced a vault's staked value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slash {
    pub slasher: Address,
    pub amount: u128,
    /// Timestamp at which the slashed stake was captured, distinct from the
    /// block timestamp of the slash itself.
    pub capture_timestamp: i64,
}

/// Previously withdrawn collateral was claimed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub claimer: Address,
    pub amount: u128,
}
