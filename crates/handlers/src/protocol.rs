//! Protocol singleton - lazily-initialized protocol-wide aggregate.
//!
//! Every handler that changes a protocol-wide count goes through
//! [`ensure_protocol`] rather than caching a reference; the singleton is
//! keyed by a fixed constant id in the entity store, no global variable.

use rust_decimal::Decimal;

use symbiont_core::constants::{
    DELEGATOR_FACTORY_ADDRESS, NETWORK_REGISTRY_ADDRESS, OPERATOR_REGISTRY_ADDRESS, PROTOCOL_ID,
    SLASHER_FACTORY_ADDRESS, VAULT_CONFIGURATOR_ADDRESS, VAULT_FACTORY_ADDRESS,
};
use symbiont_core::entities::Protocol;
use symbiont_core::error::{DomainError, DomainResult};
use symbiont_core::models::Address;
use symbiont_core::ports::{EntityStore, EntityStoreExt};

/// Load the protocol singleton, creating and persisting it on first use.
///
/// If the singleton is absent, all counters start at zero and the contract
/// addresses are seeded from the configured constants, with both timestamps
/// stamped from `timestamp`. If present it is returned unmodified; bumping
/// `updated_at` after a mutation is the caller's responsibility.
pub async fn ensure_protocol(store: &dyn EntityStore, timestamp: i64) -> DomainResult<Protocol> {
    if let Some(protocol) = store.get::<Protocol>(PROTOCOL_ID).await? {
        return Ok(protocol);
    }

    let protocol = Protocol {
        id: PROTOCOL_ID.to_string(),
        vault_factory_address: known_address(VAULT_FACTORY_ADDRESS)?,
        delegator_factory_address: known_address(DELEGATOR_FACTORY_ADDRESS)?,
        slasher_factory_address: known_address(SLASHER_FACTORY_ADDRESS)?,
        network_registry_address: known_address(NETWORK_REGISTRY_ADDRESS)?,
        operator_registry_address: known_address(OPERATOR_REGISTRY_ADDRESS)?,
        vault_configurator_address: known_address(VAULT_CONFIGURATOR_ADDRESS)?,
        total_vaults: 0,
        total_operators: 0,
        total_networks: 0,
        total_tvl: Decimal::ZERO,
        created_at: timestamp,
        updated_at: timestamp,
    };
    store.put(&protocol).await?;

    Ok(protocol)
}

fn known_address(hex: &str) -> DomainResult<Address> {
    Address::from_hex(hex).map_err(|_| DomainError::InvalidAddress(hex.to_string()))
}
