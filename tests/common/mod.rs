#![allow(dead_code)]

//! In-memory collaborators for driving the agent without a node

use alloy::primitives::{address, Address, I256, U256};
use async_trait::async_trait;
use chrono::Utc;
use pair_sniper::chain::{
    ChainReader, Executor, Permit2Allowance, Plan, PlanStep, Reserves, Submission, TokenMetadata,
};
use pair_sniper::tokens::addresses::PERMIT2;
use pair_sniper::{Config, Error, Position, Result, SentimentModel};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const WETH: Address = address!("00000000000000000000000000000000000000ee");
pub const ACCOUNT: Address = address!("00000000000000000000000000000000000000aa");
pub const ROUTER: Address = address!("00000000000000000000000000000000000000bb");
pub const BACKUP: Address = address!("00000000000000000000000000000000000000cc");

pub const MEME: Address = address!("0000000000000000000000000000000000000011");
pub const MEME_POOL: Address = address!("0000000000000000000000000000000000000021");

pub fn config() -> Config {
    Config {
        reference_asset: Some(WETH),
        audit_log_path: None,
        ..Config::default()
    }
}

pub fn position(symbol: &str, asset: Address, pool: Address, entry_price: f64) -> Position {
    Position {
        symbol: symbol.to_string(),
        entry_price,
        amount: U256::from(1_000u64),
        decimals: 18,
        opened_at: Utc::now(),
        asset,
        pool,
    }
}

pub fn units(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(18u64))
}

#[derive(Default)]
pub struct ChainState {
    pub metadata: HashMap<Address, TokenMetadata>,
    pub reserves: HashMap<Address, Reserves>,
    /// (asset, account) -> balance
    pub balances: HashMap<(Address, Address), U256>,
    /// (asset, owner, spender) -> allowance
    pub allowances: HashMap<(Address, Address, Address), U256>,
    /// (asset, owner, spender) -> Permit2 allowance
    pub permit2_allowances: HashMap<(Address, Address, Address), Permit2Allowance>,
    /// Assets whose balance reads fail
    pub unreadable: HashSet<Address>,
    pub native: U256,
    pub metadata_calls: usize,
    pub batch_calls: usize,
}

/// Chain reader backed by a shared in-memory state
#[derive(Clone, Default)]
pub struct MockChain {
    pub state: Arc<Mutex<ChainState>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(self, asset: Address, name: &str, symbol: &str, decimals: u8) -> Self {
        self.state.lock().unwrap().metadata.insert(
            asset,
            TokenMetadata {
                name: name.to_string(),
                symbol: symbol.to_string(),
                decimals,
            },
        );
        self
    }

    pub fn with_reserves(self, pool: Address, base: u128, counter: u128) -> Self {
        self.set_reserves(pool, base, counter);
        self
    }

    pub fn with_native(self, amount: U256) -> Self {
        self.state.lock().unwrap().native = amount;
        self
    }

    pub fn with_balance(self, asset: Address, account: Address, amount: U256) -> Self {
        self.set_balance(asset, account, amount);
        self
    }

    pub fn set_reserves(&self, pool: Address, base: u128, counter: u128) {
        self.state
            .lock()
            .unwrap()
            .reserves
            .insert(pool, Reserves::new(U256::from(base), U256::from(counter)));
    }

    pub fn set_balance(&self, asset: Address, account: Address, amount: U256) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert((asset, account), amount);
    }

    /// Both approvals the router needs to pull `asset` from `ACCOUNT`
    pub fn with_router_allowance(self, asset: Address) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state
                .allowances
                .insert((asset, ACCOUNT, PERMIT2), U256::MAX);
            state.permit2_allowances.insert(
                (asset, ACCOUNT, ROUTER),
                Permit2Allowance {
                    amount: U256::MAX,
                    expiration: u64::MAX,
                },
            );
        }
        self
    }

    /// Make balance reads of `asset` fail
    pub fn with_unreadable_balance(self, asset: Address) -> Self {
        self.state.lock().unwrap().unreadable.insert(asset);
        self
    }

    pub fn credit(&self, asset: Address, account: Address, amount: U256) {
        let mut state = self.state.lock().unwrap();
        let balance = state.balances.entry((asset, account)).or_default();
        *balance += amount;
    }

    pub fn metadata_calls(&self) -> usize {
        self.state.lock().unwrap().metadata_calls
    }

    pub fn batch_calls(&self) -> usize {
        self.state.lock().unwrap().batch_calls
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn token_metadata(&self, asset: Address) -> Result<TokenMetadata> {
        let mut state = self.state.lock().unwrap();
        state.metadata_calls += 1;
        state
            .metadata
            .get(&asset)
            .cloned()
            .ok_or_else(|| Error::Rpc(format!("unknown token {}", asset)))
    }

    async fn get_reserves(&self, pool: Address) -> Result<Reserves> {
        self.state
            .lock()
            .unwrap()
            .reserves
            .get(&pool)
            .copied()
            .ok_or_else(|| Error::Rpc(format!("unknown pool {}", pool)))
    }

    async fn batch_get_reserves(&self, pools: &[Address]) -> Result<Vec<Reserves>> {
        let mut state = self.state.lock().unwrap();
        state.batch_calls += 1;
        pools
            .iter()
            .map(|pool| {
                state
                    .reserves
                    .get(pool)
                    .copied()
                    .ok_or_else(|| Error::Rpc(format!("unknown pool {}", pool)))
            })
            .collect()
    }

    async fn balance_of(&self, asset: Address, account: Address) -> Result<U256> {
        let state = self.state.lock().unwrap();
        if state.unreadable.contains(&asset) {
            return Err(Error::Rpc("balanceOf timeout".to_string()));
        }
        Ok(state
            .balances
            .get(&(asset, account))
            .copied()
            .unwrap_or_default())
    }

    async fn native_balance(&self, _account: Address) -> Result<U256> {
        Ok(self.state.lock().unwrap().native)
    }

    async fn allowance(&self, asset: Address, owner: Address, spender: Address) -> Result<U256> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .allowances
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn permit2_allowance(
        &self,
        asset: Address,
        owner: Address,
        spender: Address,
    ) -> Result<Permit2Allowance> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .permit2_allowances
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or_default())
    }
}

/// What a submitted plan does
#[derive(Clone)]
pub enum SubmitBehavior {
    /// Lands, moving the native balance by `profit` and crediting `credit`
    Succeed {
        profit: i64,
        credit: Option<(Address, U256)>,
    },
    Revert(String),
    TransportError(String),
}

#[derive(Debug, Clone)]
pub struct RecordedSubmission {
    pub plan: Plan,
    pub deadline: u64,
    pub value: U256,
}

/// Executor that records every call
pub struct MockExecutor {
    chain: MockChain,
    behavior: SubmitBehavior,
    submissions: Mutex<Vec<RecordedSubmission>>,
    approvals: Mutex<Vec<(Address, Address, U256)>>,
    permit2_approvals: Mutex<Vec<(Address, Address)>>,
    transfers: Mutex<Vec<(Address, Address, U256)>>,
}

impl MockExecutor {
    pub fn new(chain: MockChain) -> Self {
        Self {
            chain,
            behavior: SubmitBehavior::Succeed {
                profit: 0,
                credit: None,
            },
            submissions: Mutex::new(Vec::new()),
            approvals: Mutex::new(Vec::new()),
            permit2_approvals: Mutex::new(Vec::new()),
            transfers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_behavior(mut self, behavior: SubmitBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn approvals(&self) -> Vec<(Address, Address, U256)> {
        self.approvals.lock().unwrap().clone()
    }

    pub fn permit2_approvals(&self) -> Vec<(Address, Address)> {
        self.permit2_approvals.lock().unwrap().clone()
    }

    pub fn transfers(&self) -> Vec<(Address, Address, U256)> {
        self.transfers.lock().unwrap().clone()
    }

    /// Whether the router could pull every user-paid swap input through
    /// Permit2 right now
    fn router_can_pull(&self, plan: &Plan, deadline: u64) -> bool {
        let state = self.chain.state.lock().unwrap();
        plan.steps().iter().all(|step| match step {
            PlanStep::V2SwapExactIn {
                amount_in,
                path,
                payer_is_user: true,
                ..
            } => {
                let asset = path[0];
                let erc20 = state
                    .allowances
                    .get(&(asset, ACCOUNT, PERMIT2))
                    .copied()
                    .unwrap_or_default();
                let permit = state
                    .permit2_allowances
                    .get(&(asset, ACCOUNT, ROUTER))
                    .copied()
                    .unwrap_or_default();
                erc20 >= *amount_in && permit.covers(*amount_in, deadline)
            }
            _ => true,
        })
    }
}

#[async_trait]
impl Executor for MockExecutor {
    fn account(&self) -> Address {
        ACCOUNT
    }

    fn spender(&self) -> Address {
        ROUTER
    }

    async fn submit(&self, plan: &Plan, deadline: u64, value: U256) -> Result<Submission> {
        self.submissions.lock().unwrap().push(RecordedSubmission {
            plan: plan.clone(),
            deadline,
            value,
        });

        if !self.router_can_pull(plan, deadline) {
            return Ok(Submission::failed(None, "TRANSFER_FROM_FAILED"));
        }

        match &self.behavior {
            SubmitBehavior::Succeed { profit, credit } => {
                if let Some((asset, amount)) = credit {
                    self.chain.credit(*asset, ACCOUNT, *amount);
                }
                let delta = I256::try_from(*profit).unwrap();
                Ok(Submission::succeeded(Default::default(), delta))
            }
            SubmitBehavior::Revert(reason) => Ok(Submission::failed(None, reason.clone())),
            SubmitBehavior::TransportError(reason) => Err(Error::Rpc(reason.clone())),
        }
    }

    /// Mined on return, like the live executor
    async fn approve(&self, asset: Address, spender: Address, amount: U256) -> Result<()> {
        self.approvals.lock().unwrap().push((asset, spender, amount));
        self.chain
            .state
            .lock()
            .unwrap()
            .allowances
            .insert((asset, ACCOUNT, spender), amount);
        Ok(())
    }

    async fn permit2_approve(&self, asset: Address, spender: Address) -> Result<()> {
        self.permit2_approvals.lock().unwrap().push((asset, spender));
        self.chain.state.lock().unwrap().permit2_allowances.insert(
            (asset, ACCOUNT, spender),
            Permit2Allowance {
                amount: U256::MAX,
                expiration: u64::MAX,
            },
        );
        Ok(())
    }

    async fn transfer(&self, asset: Address, to: Address, amount: U256) -> Result<()> {
        self.transfers.lock().unwrap().push((asset, to, amount));
        Ok(())
    }
}

/// Sentiment model with a canned reply
pub struct FixedSentiment {
    reply: Option<f64>,
    calls: Arc<AtomicUsize>,
}

impl FixedSentiment {
    pub fn new(score: f64) -> Self {
        Self {
            reply: Some(score),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A model that is never reachable
    pub fn unavailable() -> Self {
        Self {
            reply: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl SentimentModel for FixedSentiment {
    async fn score(&self, _name: &str, _symbol: &str) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .ok_or_else(|| Error::ScoringUnavailable("model unreachable".to_string()))
    }
}
