//! Chain event source
//!
//! Polls the node for new `PairCreated` logs and new block hashes and forwards
//! them, in arrival order, into one bounded channel per stream. The agent's
//! dispatch loop is the only consumer.

use super::contracts::IUniswapV2Factory;
use super::{BlockTick, PairCreated};
use crate::{Error, Result};
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::Filter;
use alloy::sol_types::SolEvent;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

pub struct EventSource {
    provider: DynProvider,
    factory: Address,
}

/// Handles of the two polling tasks
pub struct EventTasks {
    pub pairs: JoinHandle<()>,
    pub blocks: JoinHandle<()>,
}

impl EventTasks {
    pub fn abort(&self) {
        self.pairs.abort();
        self.blocks.abort();
    }
}

impl EventSource {
    pub fn new(provider: DynProvider, factory: Address) -> Self {
        Self { provider, factory }
    }

    /// Install the log and block filters and start forwarding events
    ///
    /// Each task ends when its receiver is dropped.
    pub async fn spawn(
        self,
        pairs_tx: mpsc::Sender<PairCreated>,
        blocks_tx: mpsc::Sender<BlockTick>,
    ) -> Result<EventTasks> {
        let filter = Filter::new()
            .address(self.factory)
            .event_signature(IUniswapV2Factory::PairCreated::SIGNATURE_HASH);

        let log_poller = self
            .provider
            .watch_logs(&filter)
            .await
            .map_err(|e| Error::Rpc(format!("install PairCreated filter: {}", e)))?;
        let block_poller = self
            .provider
            .watch_blocks()
            .await
            .map_err(|e| Error::Rpc(format!("install block filter: {}", e)))?;

        let pairs = tokio::spawn(async move {
            let mut logs = log_poller.into_stream().flat_map(futures::stream::iter);
            while let Some(log) = logs.next().await {
                let decoded = match log.log_decode::<IUniswapV2Factory::PairCreated>() {
                    Ok(decoded) => decoded.inner.data,
                    Err(e) => {
                        warn!(error = %e, "Skipping undecodable PairCreated log");
                        continue;
                    }
                };
                let event = PairCreated {
                    base_asset: decoded.token0,
                    counter_asset: decoded.token1,
                    pool: decoded.pair,
                };
                debug!(pool = %event.pool, "PairCreated");
                if pairs_tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        let provider = self.provider.clone();
        let blocks = tokio::spawn(async move {
            let mut hashes = block_poller.into_stream().flat_map(futures::stream::iter);
            while let Some(hash) = hashes.next().await {
                let block = match provider.get_block_by_hash(hash).await {
                    Ok(Some(block)) => block,
                    Ok(None) => {
                        warn!(hash = %hash, "Block not found, skipping tick");
                        continue;
                    }
                    Err(e) => {
                        error!(hash = %hash, error = %e, "Failed to fetch block");
                        continue;
                    }
                };
                let tick = BlockTick {
                    number: block.header.number,
                    timestamp: block.header.timestamp,
                };
                if blocks_tx.send(tick).await.is_err() {
                    break;
                }
            }
        });

        Ok(EventTasks { pairs, blocks })
    }
}
