//! Event handlers for the Symbiont aggregation engine.
//!
//! Each module owns one family of protocol events and implements
//! [`symbiont_core::ports::EventHandler`] for it:
//!
//! - [`registration`] - network and operator registration
//! - [`opt_in`] - operator↔network and operator↔vault opt-in toggles
//! - [`vault_factory`] - vault creation and dynamic source registration
//! - [`vault`] - per-vault deposit/withdrawal/slash/claim activity
//!
//! Shared pieces:
//!
//! - [`protocol`] - the lazily-initialized protocol singleton
//! - [`rollup`] - day-bucketed metric snapshots
//!
//! # Wiring
//!
//! ```ignore
//! let mut registry = HandlerRegistry::new();
//! registry.register(Arc::new(NetworkRegistryHandler));
//! registry.register(Arc::new(OperatorRegistryHandler));
//! registry.register(Arc::new(OperatorNetworkOptInHandler));
//! registry.register(Arc::new(OperatorVaultOptInHandler));
//! registry.register(Arc::new(VaultFactoryHandler));
//! registry.register(Arc::new(VaultActivityHandler));
//! ```

pub mod opt_in;
pub mod protocol;
pub mod registration;
pub mod rollup;
pub mod vault;
pub mod vault_factory;

pub use opt_in::{OperatorNetworkOptInHandler, OperatorVaultOptInHandler};
pub use registration::{NetworkRegistryHandler, OperatorRegistryHandler};
pub use vault::VaultActivityHandler;
pub use vault_factory::VaultFactoryHandler;

use std::sync::Arc;

use symbiont_core::ports::HandlerRegistry;

/// Build a registry with every protocol handler wired to its event kinds.
pub fn default_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(NetworkRegistryHandler));
    registry.register(Arc::new(OperatorRegistryHandler));
    registry.register(Arc::new(OperatorNetworkOptInHandler));
    registry.register(Arc::new(OperatorVaultOptInHandler));
    registry.register(Arc::new(VaultFactoryHandler));
    registry.register(Arc::new(VaultActivityHandler));
    registry
}
