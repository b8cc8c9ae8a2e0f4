//! Chain collaborators
//!
//! The agent never talks to a node directly. Reads go through [`ChainReader`],
//! writes through [`Executor`], and events arrive from [`EventSource`]. The
//! alloy-backed implementations live in [`rpc`] and `wallet::executor`;
//! tests substitute in-memory ones.

pub mod contracts;
pub mod events;
pub mod plan;
pub mod rpc;

pub use events::EventSource;
pub use plan::{Plan, PlanStep};
pub use rpc::RpcChain;

use crate::tokens::ratio;
use crate::Result;
use alloy::primitives::{Address, B256, I256, U256};
use async_trait::async_trait;
use serde::Serialize;

/// A new Uniswap V2 pair, as emitted by the factory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairCreated {
    /// `token0` of the pair
    pub base_asset: Address,
    /// `token1` of the pair
    pub counter_asset: Address,
    /// The pair contract
    pub pool: Address,
}

/// A new block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTick {
    pub number: u64,
    /// Block timestamp (unix seconds)
    pub timestamp: u64,
}

/// Pair reserves, base (`reserve0`) first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reserves {
    pub base: U256,
    pub counter: U256,
}

impl Reserves {
    pub fn new(base: U256, counter: U256) -> Self {
        Self { base, counter }
    }

    /// Spot price in base per counter unit, `None` for an empty pool
    pub fn spot_price(&self) -> Option<f64> {
        ratio(self.base, self.counter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// A Permit2 allowance from an owner to a spender for one token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permit2Allowance {
    pub amount: U256,
    /// Unix seconds after which the allowance no longer applies
    pub expiration: u64,
}

impl Permit2Allowance {
    /// Whether `amount` can be pulled by a transaction valid until `deadline`
    pub fn covers(&self, amount: U256, deadline: u64) -> bool {
        self.amount >= amount && self.expiration >= deadline
    }
}

/// Outcome of a submitted plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub tx_hash: Option<B256>,
    pub success: bool,
    /// Change in the signer's native balance across the transaction
    pub balance_delta: I256,
    pub error: Option<String>,
}

impl Submission {
    pub fn succeeded(tx_hash: B256, balance_delta: I256) -> Self {
        Self {
            tx_hash: Some(tx_hash),
            success: true,
            balance_delta,
            error: None,
        }
    }

    pub fn failed(tx_hash: Option<B256>, reason: impl Into<String>) -> Self {
        Self {
            tx_hash,
            success: false,
            balance_delta: I256::ZERO,
            error: Some(reason.into()),
        }
    }
}

/// Read-only chain access
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn token_metadata(&self, asset: Address) -> Result<TokenMetadata>;

    async fn get_reserves(&self, pool: Address) -> Result<Reserves>;

    /// Reserves for many pools in one round-trip, in input order
    async fn batch_get_reserves(&self, pools: &[Address]) -> Result<Vec<Reserves>>;

    async fn balance_of(&self, asset: Address, account: Address) -> Result<U256>;

    async fn native_balance(&self, account: Address) -> Result<U256>;

    /// Plain ERC20 allowance
    async fn allowance(&self, asset: Address, owner: Address, spender: Address) -> Result<U256>;

    /// Allowance `owner` has granted `spender` on the Permit2 contract
    async fn permit2_allowance(
        &self,
        asset: Address,
        owner: Address,
        spender: Address,
    ) -> Result<Permit2Allowance>;
}

/// Signing capability. Its presence is what makes the agent live.
#[async_trait]
pub trait Executor: Send + Sync {
    /// The signing account
    fn account(&self) -> Address;

    /// Contract that executes plans. It spends the account's tokens through
    /// Permit2.
    fn spender(&self) -> Address;

    /// Submit a plan and wait for its receipt
    ///
    /// Transport failures are `Err`; a revert is `Ok` with `success == false`.
    async fn submit(&self, plan: &Plan, deadline: u64, value: U256) -> Result<Submission>;

    /// Send an ERC20 approval and wait until it is mined
    async fn approve(&self, asset: Address, spender: Address, amount: U256) -> Result<()>;

    /// Grant `spender` an unlimited, non-expiring Permit2 allowance on `asset`
    /// and wait until it is mined
    async fn permit2_approve(&self, asset: Address, spender: Address) -> Result<()>;

    /// Broadcast an ERC20 transfer without waiting for confirmation
    async fn transfer(&self, asset: Address, to: Address, amount: U256) -> Result<()>;
}

/// `after - before` as a signed amount, saturating at the `I256` bounds
pub fn signed_delta(before: U256, after: U256) -> I256 {
    if after >= before {
        I256::try_from(after - before).unwrap_or(I256::MAX)
    } else {
        I256::try_from(before - after)
            .map(|d| -d)
            .unwrap_or(I256::MIN)
    }
}
