//! Trading agent
//!
//! A single owning service: the agent holds the position table and every
//! collaborator, and each event is handled by one `&mut self` method that
//! runs to completion before the next event is taken off the channels.
//!
//! - [`Agent::on_pair_created`] opens positions (`entry`)
//! - [`Agent::on_block`] prices, drops and sells them (`exit`)
//! - [`Agent::shutdown`] sweeps what is left to the backup address (`shutdown`)

mod entry;
mod exit;
mod shutdown;

pub use exit::ExitReport;

use crate::audit::{AuditEntry, AuditLog};
use crate::chain::{BlockTick, ChainReader, Executor, PairCreated};
use crate::config::{Config, StrategyConfig, TradingMode};
use crate::positions::{Position, PositionStore};
use crate::sentiment::SentimentGate;
use crate::{Error, Result};
use alloy::primitives::Address;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Whether the agent can sign
pub enum Execution {
    /// Positions are simulated, nothing is ever submitted
    Monitoring,
    Live(Arc<dyn Executor>),
}

impl Execution {
    pub fn mode(&self) -> TradingMode {
        match self {
            Execution::Monitoring => TradingMode::Monitoring,
            Execution::Live(_) => TradingMode::Live,
        }
    }
}

pub struct Agent {
    reference_asset: Address,
    strategy: StrategyConfig,
    backup_address: Option<Address>,
    state_file: Option<String>,
    chain: Arc<dyn ChainReader>,
    gate: SentimentGate,
    execution: Execution,
    store: PositionStore,
    audit: Option<AuditLog>,
    last_tick: Option<u64>,
}

impl Agent {
    pub fn new(
        config: &Config,
        chain: Arc<dyn ChainReader>,
        gate: SentimentGate,
        execution: Execution,
    ) -> Self {
        Self {
            reference_asset: config.reference_asset(),
            strategy: config.strategy.clone(),
            backup_address: config.backup_address,
            state_file: config.state_file.clone(),
            chain,
            gate,
            execution,
            store: PositionStore::new(),
            audit: None,
            last_tick: None,
        }
    }

    /// Start from previously persisted positions
    pub fn with_store(mut self, store: PositionStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn store(&self) -> &PositionStore {
        &self.store
    }

    pub fn mode(&self) -> TradingMode {
        self.execution.mode()
    }

    /// Handle a new pair
    ///
    /// A sentiment outage only costs this entry and is not an error.
    pub async fn on_pair_created(&mut self, event: PairCreated) -> Result<Option<Position>> {
        match self.try_enter(&event).await {
            Err(Error::ScoringUnavailable(reason)) => {
                warn!(pool = %event.pool, reason = %reason, "Sentiment unavailable, skipping pair");
                Ok(None)
            }
            Ok(Some(position)) => {
                self.persist().await;
                Ok(Some(position))
            }
            other => other,
        }
    }

    /// Handle a new block
    ///
    /// Ticks at or below the last processed block number are ignored, so an
    /// at-least-once source can redeliver without double-closing.
    pub async fn on_block(&mut self, tick: BlockTick) -> Result<HashMap<String, f64>> {
        if self.last_tick.is_some_and(|last| tick.number <= last) {
            debug!(block = tick.number, "Ignoring already processed tick");
            return Ok(HashMap::new());
        }
        self.last_tick = Some(tick.number);

        let open_before = self.store.len();
        let result = self.evaluate(&tick).await;
        if self.store.len() != open_before {
            self.persist().await;
        }
        result
    }

    /// Sweep residual balances and save the position table
    ///
    /// Returns the number of transfers broadcast.
    pub async fn shutdown(&self) -> usize {
        info!(open_positions = self.store.len(), "Shutting down");
        let swept = self.sweep().await;
        self.persist().await;
        swept
    }

    /// Dispatch events until shutdown
    ///
    /// Priority is shutdown, then pair-created, then blocks: pair events are
    /// rare and must not sit behind a backlog of ticks. A failed exit ends the
    /// loop with `ExecutionFailed`; the caller still owns the final sweep.
    pub async fn run<S>(
        &mut self,
        mut pairs: mpsc::Receiver<PairCreated>,
        mut blocks: mpsc::Receiver<BlockTick>,
        shutdown: S,
    ) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut pairs_open = true;
        let mut blocks_open = true;

        info!(
            mode = ?self.mode(),
            reference_asset = %self.reference_asset,
            open_positions = self.store.len(),
            "Agent started"
        );

        loop {
            if !pairs_open && !blocks_open {
                warn!("Event streams closed");
                return Ok(());
            }

            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    return Ok(());
                }

                event = pairs.recv(), if pairs_open => match event {
                    Some(event) => {
                        if let Err(e) = self.on_pair_created(event).await {
                            warn!(pool = %event.pool, error = %e, "Entry aborted");
                        }
                    }
                    None => pairs_open = false,
                },

                tick = blocks.recv(), if blocks_open => match tick {
                    Some(tick) => match self.on_block(tick).await {
                        Ok(_) => {}
                        Err(e @ Error::ExecutionFailed(_)) => {
                            error!(block = tick.number, error = %e, "Exit failed, stopping");
                            return Err(e);
                        }
                        Err(e) => {
                            warn!(block = tick.number, error = %e, "Tick skipped");
                        }
                    },
                    None => blocks_open = false,
                },
            }
        }
    }

    async fn persist(&self) {
        let Some(path) = &self.state_file else {
            return;
        };
        if let Err(e) = self.store.save(path).await {
            warn!(path = %path, error = %e, "Failed to persist positions");
        }
    }

    async fn journal(&self, entry: AuditEntry) {
        if let Some(audit) = &self.audit {
            audit.record(entry).await;
        }
    }
}
