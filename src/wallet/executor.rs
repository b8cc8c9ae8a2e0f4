//! Live executor
//!
//! Signs and submits router plans and ERC20 calls with the configured wallet.
//!
//! SECURITY NOTE:
//! - Plans are simulated from the signer's address before signing
//! - Approvals are mined before the plan that depends on them is simulated
//! - Sweeps are broadcast without waiting for confirmation

use super::simulator::TransactionSimulator;
use super::SecureWallet;
use crate::chain::contracts::{IPermit2, IUniversalRouter, IERC20};
use crate::chain::{signed_delta, Executor, Plan, Submission};
use crate::config::RpcConfig;
use crate::tokens::addresses::PERMIT2;
use crate::{Error, Result};
use alloy::network::Ethereum;
use alloy::primitives::aliases::{U160, U48};
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use async_trait::async_trait;
use tracing::{debug, info, warn};

pub struct LiveExecutor {
    provider: DynProvider,
    account: Address,
    router: Address,
    simulator: TransactionSimulator,
}

impl LiveExecutor {
    /// Build a signing provider for `wallet` against the configured endpoint
    pub fn connect(rpc: &RpcConfig, wallet: &SecureWallet, router: Address) -> Result<Self> {
        let url = rpc.parsed_url()?;
        let provider = ProviderBuilder::new()
            .wallet(wallet.wallet().clone())
            .connect_http(url)
            .erased();

        Ok(Self {
            simulator: TransactionSimulator::new(provider.clone()),
            provider,
            account: wallet.address(),
            router,
        })
    }

    async fn native_balance(&self) -> Result<U256> {
        self.provider
            .get_balance(self.account)
            .await
            .map_err(|e| Error::Rpc(format!("eth_getBalance: {}", e)))
    }

    /// Wait for `pending` to be mined and fail if it reverted
    async fn confirm(
        &self,
        pending: PendingTransactionBuilder<Ethereum>,
        what: &str,
    ) -> Result<()> {
        let tx_hash = *pending.tx_hash();
        debug!(tx = %tx_hash, "Waiting for {}", what);
        let receipt = pending.get_receipt().await.map_err(|e| {
            Error::ExecutionFailed(format!("receipt for {} {}: {}", what, tx_hash, e))
        })?;
        if !receipt.status() {
            return Err(Error::ExecutionFailed(format!("{} reverted in {}", what, tx_hash)));
        }
        Ok(())
    }
}

#[async_trait]
impl Executor for LiveExecutor {
    fn account(&self) -> Address {
        self.account
    }

    fn spender(&self) -> Address {
        self.router
    }

    async fn submit(&self, plan: &Plan, deadline: u64, value: U256) -> Result<Submission> {
        let (commands, inputs) = plan.encode();
        let router = IUniversalRouter::new(self.router, self.provider.clone());
        let call = router
            .execute(commands, inputs, U256::from(deadline))
            .value(value);

        let simulation = self
            .simulator
            .simulate(self.account, self.router, call.calldata().clone(), value)
            .await?;
        if !simulation.success {
            let reason = simulation
                .revert_reason
                .unwrap_or_else(|| "simulation failed".to_string());
            warn!(reason = %reason, "Plan simulation reverted, not submitting");
            return Ok(Submission::failed(None, reason));
        }
        debug!(gas = ?simulation.gas_used, steps = plan.steps().len(), "Plan simulated");

        let before = self.native_balance().await?;

        let pending = call
            .send()
            .await
            .map_err(|e| Error::ExecutionFailed(format!("send execute(): {}", e)))?;
        let tx_hash = *pending.tx_hash();
        info!(tx = %tx_hash, "Submitted plan");

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| Error::ExecutionFailed(format!("receipt for {}: {}", tx_hash, e)))?;
        if !receipt.status() {
            return Ok(Submission::failed(Some(tx_hash), "transaction reverted"));
        }

        let after = self.native_balance().await?;
        Ok(Submission::succeeded(tx_hash, signed_delta(before, after)))
    }

    async fn approve(&self, asset: Address, spender: Address, amount: U256) -> Result<()> {
        let pending = IERC20::new(asset, self.provider.clone())
            .approve(spender, amount)
            .send()
            .await
            .map_err(|e| Error::ExecutionFailed(format!("approve {}: {}", asset, e)))?;
        info!(tx = %pending.tx_hash(), token = %asset, spender = %spender, "Approval sent");
        self.confirm(pending, "approve").await
    }

    async fn permit2_approve(&self, asset: Address, spender: Address) -> Result<()> {
        let pending = IPermit2::new(PERMIT2, self.provider.clone())
            .approve(asset, spender, U160::MAX, U48::MAX)
            .send()
            .await
            .map_err(|e| Error::ExecutionFailed(format!("Permit2 approve {}: {}", asset, e)))?;
        info!(tx = %pending.tx_hash(), token = %asset, spender = %spender, "Permit2 approval sent");
        self.confirm(pending, "Permit2 approve").await
    }

    async fn transfer(&self, asset: Address, to: Address, amount: U256) -> Result<()> {
        let pending = IERC20::new(asset, self.provider.clone())
            .transfer(to, amount)
            .send()
            .await
            .map_err(|e| Error::ExecutionFailed(format!("transfer {}: {}", asset, e)))?;
        info!(tx = %pending.tx_hash(), token = %asset, to = %to, "Transfer broadcast");
        Ok(())
    }
}
