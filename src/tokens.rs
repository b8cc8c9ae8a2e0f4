//! Well-known contract addresses and raw-unit arithmetic
//!
//! Centralizes the per-chain addresses the agent needs (wrapped native token,
//! Uniswap V2 factory, Universal Router, Multicall3, Permit2) and the
//! conversions between on-chain integer amounts and the `f64` ratios used for
//! pricing.

use alloy::primitives::{address, Address, U256};

/// Chain ID constants
pub mod chains {
    pub const ETHEREUM: u64 = 1;
    pub const ARBITRUM: u64 = 42161;
    pub const OPTIMISM: u64 = 10;
    pub const BASE: u64 = 8453;
}

/// Well-known contract addresses per chain
pub mod addresses {
    use super::*;

    // === Wrapped native tokens ===
    pub const WETH_ETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    pub const WETH_ARB: Address = address!("82af49447d8a07e3bd95bd0d56f35241523fbab1");
    pub const WETH_OPT: Address = address!("4200000000000000000000000000000000000006");
    pub const WETH_BASE: Address = address!("4200000000000000000000000000000000000006");

    // === Uniswap V2 factories ===
    pub const V2_FACTORY_ETH: Address = address!("5c69bee701ef814a2b6a3edd4b1652cb9cc5aa6f");
    pub const V2_FACTORY_ARB: Address = address!("f1d7cc64fb4452f05c498126312ebe29f30fbcf9");
    pub const V2_FACTORY_OPT: Address = address!("0c3c1c532f1e39edf36be9fe0be1410313e074bf");
    pub const V2_FACTORY_BASE: Address = address!("8909dc15e40173ff4699343b6eb8132c65e18ec6");

    // === Uniswap Universal Router ===
    pub const UNIVERSAL_ROUTER_ETH: Address = address!("3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad");
    pub const UNIVERSAL_ROUTER_ARB: Address = address!("5e325eda8064b456f4781070c0738d849c824258");
    pub const UNIVERSAL_ROUTER_OPT: Address = address!("cb1355ff08ab38bbce60111f1bb2b784be25d7e8");
    pub const UNIVERSAL_ROUTER_BASE: Address =
        address!("3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad");

    /// Multicall3 is deployed at the same address on every supported chain
    pub const MULTICALL3: Address = address!("ca11bde05977b3631167028862be2a173976ca11");

    /// Permit2, also shared across chains. The Universal Router pulls user
    /// tokens through it.
    pub const PERMIT2: Address = address!("000000000022d473030f116ddee9f6b43ac78ba3");
}

/// One whole token expressed in its smallest unit (`10^decimals`)
pub fn one_unit(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

/// Convert a raw integer amount to `f64`
///
/// Goes through the decimal string so amounts wider than 128 bits still
/// produce a (lossy) finite value instead of truncating.
pub fn u256_to_f64(amount: U256) -> f64 {
    amount.to_string().parse::<f64>().unwrap_or(0.0)
}

/// Convert a non-negative `f64` amount back to a raw integer, rounding down.
///
/// NaN and negative inputs map to zero, values past `u128::MAX` saturate.
pub fn f64_to_u256(amount: f64) -> U256 {
    if !amount.is_finite() || amount <= 0.0 {
        return U256::ZERO;
    }
    if amount >= u128::MAX as f64 {
        return U256::from(u128::MAX);
    }
    U256::from(amount.floor() as u128)
}

/// Multiply a raw amount by a fraction in [0, 1] using fixed-point math
pub fn scale_by_fraction(amount: U256, fraction: f64) -> U256 {
    const PRECISION: u64 = 1_000_000_000;
    let fraction = fraction.clamp(0.0, 1.0);
    let numerator = U256::from((fraction * PRECISION as f64).round() as u64);
    amount * numerator / U256::from(PRECISION)
}

/// Ratio of two raw amounts, `None` when the denominator is zero
pub fn ratio(numerator: U256, denominator: U256) -> Option<f64> {
    if denominator.is_zero() {
        return None;
    }
    Some(u256_to_f64(numerator) / u256_to_f64(denominator))
}

/// Format a U256 value with decimals
pub fn format_units(value: U256, decimals: u8) -> String {
    if value.is_zero() {
        return "0".to_string();
    }

    let divisor = one_unit(decimals);
    let whole = value / divisor;
    let remainder = value % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let remainder_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = remainder_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, trimmed)
        }
    }
}
