//! alloy-backed chain reader
//!
//! SECURITY NOTE:
//! - This reader is READ-ONLY; it holds no signer
//! - Batched reserve reads go through Multicall3 so N positions cost one call

use super::contracts::{IMulticall3, IPermit2, IUniswapV2Pair, IERC20};
use super::{ChainReader, Permit2Allowance, Reserves, TokenMetadata};
use crate::config::RpcConfig;
use crate::tokens::addresses;
use crate::{Error, Result};
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol_types::SolCall;
use async_trait::async_trait;

pub struct RpcChain {
    provider: DynProvider,
    multicall: Address,
}

impl RpcChain {
    /// Connect over HTTP to the configured RPC endpoint
    pub fn connect(rpc: &RpcConfig) -> Result<Self> {
        let url = rpc.parsed_url()?;
        let provider = ProviderBuilder::new().connect_http(url).erased();
        Ok(Self::from_provider(provider))
    }

    pub fn from_provider(provider: DynProvider) -> Self {
        Self {
            provider,
            multicall: addresses::MULTICALL3,
        }
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }
}

fn rpc_err(context: &str, e: impl std::fmt::Display) -> Error {
    Error::Rpc(format!("{}: {}", context, e))
}

#[async_trait]
impl ChainReader for RpcChain {
    async fn token_metadata(&self, asset: Address) -> Result<TokenMetadata> {
        let token = IERC20::new(asset, self.provider.clone());

        let name = token
            .name()
            .call()
            .await
            .map_err(|e| rpc_err("name()", e))?;
        let symbol = token
            .symbol()
            .call()
            .await
            .map_err(|e| rpc_err("symbol()", e))?;
        let decimals = token
            .decimals()
            .call()
            .await
            .map_err(|e| rpc_err("decimals()", e))?;

        Ok(TokenMetadata {
            name,
            symbol,
            decimals,
        })
    }

    async fn get_reserves(&self, pool: Address) -> Result<Reserves> {
        let pair = IUniswapV2Pair::new(pool, self.provider.clone());
        let reserves = pair
            .getReserves()
            .call()
            .await
            .map_err(|e| rpc_err("getReserves()", e))?;

        Ok(Reserves::new(
            U256::from(reserves.reserve0),
            U256::from(reserves.reserve1),
        ))
    }

    async fn batch_get_reserves(&self, pools: &[Address]) -> Result<Vec<Reserves>> {
        if pools.is_empty() {
            return Ok(Vec::new());
        }

        let calldata = IUniswapV2Pair::getReservesCall {}.abi_encode();
        let calls: Vec<IMulticall3::Call3> = pools
            .iter()
            .map(|pool| IMulticall3::Call3 {
                target: *pool,
                allowFailure: false,
                callData: calldata.clone().into(),
            })
            .collect();

        let multicall = IMulticall3::new(self.multicall, self.provider.clone());
        let results = multicall
            .aggregate3(calls)
            .call()
            .await
            .map_err(|e| rpc_err("aggregate3()", e))?;

        if results.len() != pools.len() {
            return Err(Error::Rpc(format!(
                "multicall returned {} results for {} pools",
                results.len(),
                pools.len()
            )));
        }

        results
            .iter()
            .zip(pools)
            .map(|(result, pool)| {
                let decoded = IUniswapV2Pair::getReservesCall::abi_decode_returns(&result.returnData)
                    .map_err(|e| rpc_err(&format!("decode reserves of {}", pool), e))?;
                Ok(Reserves::new(
                    U256::from(decoded.reserve0),
                    U256::from(decoded.reserve1),
                ))
            })
            .collect()
    }

    async fn balance_of(&self, asset: Address, account: Address) -> Result<U256> {
        IERC20::new(asset, self.provider.clone())
            .balanceOf(account)
            .call()
            .await
            .map_err(|e| rpc_err("balanceOf()", e))
    }

    async fn native_balance(&self, account: Address) -> Result<U256> {
        self.provider
            .get_balance(account)
            .await
            .map_err(|e| rpc_err("eth_getBalance", e))
    }

    async fn allowance(&self, asset: Address, owner: Address, spender: Address) -> Result<U256> {
        IERC20::new(asset, self.provider.clone())
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| rpc_err("allowance()", e))
    }

    async fn permit2_allowance(
        &self,
        asset: Address,
        owner: Address,
        spender: Address,
    ) -> Result<Permit2Allowance> {
        let allowance = IPermit2::new(addresses::PERMIT2, self.provider.clone())
            .allowance(owner, asset, spender)
            .call()
            .await
            .map_err(|e| rpc_err("Permit2 allowance()", e))?;
        Ok(Permit2Allowance {
            amount: U256::from(allowance.amount),
            expiration: allowance.expiration.to::<u64>(),
        })
    }
}
