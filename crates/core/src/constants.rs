//! Protocol constants and small numeric helpers.
//!
//! Contract addresses are the Symbiotic mainnet deployments; they seed the
//! protocol singleton and the explorer diagnostics.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

/// Fixed id of the protocol singleton entity.
pub const PROTOCOL_ID: &str = "symbiotic";

/// Seconds in one day-bucket.
pub const SECONDS_PER_DAY: i64 = 86_400;

// Known contract addresses (Ethereum mainnet)
pub const VAULT_FACTORY_ADDRESS: &str = "0xAEb6bdd95c502390db8f52c8909F703E9Af6a346";
pub const DELEGATOR_FACTORY_ADDRESS: &str = "0x985Ed57AF9D475f1d83c1c1c8826A0E5A34E8C7B";
pub const SLASHER_FACTORY_ADDRESS: &str = "0x685c2eD7D59814d2a597409058Ee7a92F21e48Fd";
pub const NETWORK_REGISTRY_ADDRESS: &str = "0xC773b1011461e7314CF05f97d95aa8e92C1Fd8aA";
pub const OPERATOR_REGISTRY_ADDRESS: &str = "0xAd817a6Bc954F678451A71363f04150FDD81Af9F";
pub const OPERATOR_NETWORK_OPT_IN_ADDRESS: &str = "0x7133415b33B438843D581013f98A08704316633c";
pub const OPERATOR_VAULT_OPT_IN_ADDRESS: &str = "0xb361894bC06cbBA7Ea8098BF0e32EB1906A5F891";
pub const VAULT_CONFIGURATOR_ADDRESS: &str = "0x29300b1d3150B4E2b12fE80BE72f365E200441EC";

// =============================================================================
// Day buckets
// =============================================================================

/// Day-bucket index for a timestamp: `floor(timestamp / 86400)`.
pub fn day_index(timestamp: i64) -> i64 {
    timestamp.div_euclid(SECONDS_PER_DAY)
}

/// Timestamp of the start of the day-bucket containing `timestamp`.
pub fn day_start(timestamp: i64) -> i64 {
    day_index(timestamp) * SECONDS_PER_DAY
}

// =============================================================================
// Decimal conversion
// =============================================================================

/// Represent a raw on-chain integer amount as a decimal, unscaled.
///
/// Amounts beyond `Decimal`'s 96-bit mantissa are rejected rather than
/// silently truncated.
pub fn decimal_from_raw(amount: u128) -> DomainResult<Decimal> {
    let signed =
        i128::try_from(amount).map_err(|_| DomainError::AmountOutOfRange(amount.to_string()))?;
    Decimal::try_from_i128_with_scale(signed, 0)
        .map_err(|_| DomainError::AmountOutOfRange(amount.to_string()))
}

/// `10^decimals` as a decimal.
pub fn exponent_to_decimal(decimals: u32) -> Decimal {
    let mut bd = Decimal::ONE;
    for _ in 0..decimals {
        bd *= Decimal::TEN;
    }
    bd
}

/// Scale a raw token amount down by the token's decimals.
pub fn convert_token_to_decimal(amount: u128, decimals: u32) -> DomainResult<Decimal> {
    let raw = decimal_from_raw(amount)?;
    if decimals == 0 {
        return Ok(raw);
    }
    Ok(raw / exponent_to_decimal(decimals))
}
