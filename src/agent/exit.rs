use super::entry::execution_failure;
use super::{Agent, Execution};
use crate::audit::{AuditEntry, TradeEvent};
use crate::chain::plan::recipients;
use crate::chain::{BlockTick, Executor, Plan};
use crate::positions::Position;
use crate::tokens::addresses::PERMIT2;
use crate::tokens::{f64_to_u256, format_units, u256_to_f64};
use crate::{Error, Result};
use alloy::primitives::{B256, I256, U256};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one batched exit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExitReport {
    /// Positions sold in the transaction
    pub closed: usize,
    /// Change in the signer's native balance
    pub realized_profit: I256,
    pub tx_hash: Option<B256>,
}

impl Agent {
    /// Price every open position and act on its PnL
    ///
    /// Rug drops are removed from the store before any sale is submitted, in
    /// monitoring mode as well. Profit-takes are only sold when live. Returns
    /// the price observed for each position, minus the ones just sold.
    pub async fn evaluate(&mut self, tick: &BlockTick) -> Result<HashMap<String, f64>> {
        if self.store.is_empty() {
            return Ok(HashMap::new());
        }

        let open = self.store.pools();
        let pools: Vec<_> = open.iter().map(|(_, pool)| *pool).collect();
        let reserves = self.chain.batch_get_reserves(&pools).await?;

        let mut prices = HashMap::with_capacity(open.len());
        let mut take_profit = Vec::new();
        let mut dropped = Vec::new();

        for ((symbol, pool), reserves) in open.into_iter().zip(reserves) {
            let Some(price) = reserves.spot_price() else {
                warn!(symbol = %symbol, pool = %pool, "Pool has no counter reserves, price undefined");
                continue;
            };
            prices.insert(symbol.clone(), price);

            let Some(pnl) = self.store.get(&symbol).and_then(|p| p.pnl(price)) else {
                continue;
            };
            info!(
                block = tick.number,
                symbol = %symbol,
                price,
                pnl_percent = pnl * 100.0,
                "PnL"
            );

            if pnl > self.strategy.profit_take_ratio {
                take_profit.push((symbol, price));
            } else if pnl < self.strategy.rug_drop_ratio {
                dropped.push((symbol, pnl));
            }
        }

        for (symbol, pnl) in dropped {
            if let Some(position) = self.store.remove(&symbol) {
                warn!(symbol = %symbol, pnl, "Dropping position");
                self.journal(
                    AuditEntry::new(TradeEvent::Drop, json!({ "pnl": pnl, "block": tick.number }))
                        .position(&symbol, position.asset),
                )
                .await;
            }
        }

        let executor = match &self.execution {
            Execution::Live(executor) if !take_profit.is_empty() => Arc::clone(executor),
            _ => return Ok(prices),
        };

        self.close_all(executor.as_ref(), &take_profit, tick).await?;
        for (symbol, _) in &take_profit {
            prices.remove(symbol);
        }
        Ok(prices)
    }

    /// Sell `targets` (symbol and last observed price) in one router transaction
    ///
    /// Every target leaves the store before anything is read or sent for it.
    /// If building the plan fails, the targets go back into the store. Once
    /// the plan is submitted they stay closed, so a position is sold at most
    /// once even if the transaction fails.
    pub async fn close_all(
        &mut self,
        executor: &dyn Executor,
        targets: &[(String, f64)],
        tick: &BlockTick,
    ) -> Result<ExitReport> {
        let mut closing = Vec::with_capacity(targets.len());
        for (symbol, price) in targets {
            match self.store.remove(symbol) {
                Some(position) => closing.push((position, *price)),
                None => debug!(symbol = %symbol, "Already closed"),
            }
        }

        let deadline = tick.timestamp + self.strategy.deadline_window_secs;
        let mut plan = Plan::new();
        let mut selling = Vec::new();
        let mut failure = None;

        for (position, price) in &closing {
            match self.prepare_sale(executor, position, *price, deadline).await {
                Ok(Some((amount_in, min_out))) => {
                    plan = plan.v2_swap_exact_in(
                        recipients::ADDRESS_THIS,
                        amount_in,
                        min_out,
                        vec![position.asset, self.reference_asset],
                        true,
                    );
                    selling.push(position.symbol.clone());
                }
                Ok(None) => {}
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(e) = failure {
            let symbols: Vec<_> = closing.iter().map(|(p, _)| p.symbol.clone()).collect();
            warn!(error = %e, symbols = ?symbols, "Exit not submitted, positions restored");
            for (position, _) in closing {
                self.store.insert(position);
            }
            let e = execution_failure(e);
            self.journal(
                AuditEntry::new(
                    TradeEvent::Exit,
                    json!({ "symbols": symbols, "submitted": false }),
                )
                .failed(&e),
            )
            .await;
            return Err(e);
        }

        if plan.swap_count() == 0 {
            return Ok(ExitReport::default());
        }
        let plan = plan.unwrap_weth(recipients::MSG_SENDER, U256::ZERO);

        let outcome = executor
            .submit(&plan, deadline, U256::ZERO)
            .await
            .map_err(execution_failure)
            .and_then(|submission| {
                if submission.success {
                    Ok(submission)
                } else {
                    Err(Error::ExecutionFailed(
                        submission
                            .error
                            .unwrap_or_else(|| "exit reverted".to_string()),
                    ))
                }
            });

        let submission = match outcome {
            Ok(submission) => submission,
            Err(e) => {
                self.journal(
                    AuditEntry::new(TradeEvent::Exit, json!({ "symbols": selling }))
                        .failed(&e),
                )
                .await;
                return Err(e);
            }
        };

        let report = ExitReport {
            closed: selling.len(),
            realized_profit: submission.balance_delta,
            tx_hash: submission.tx_hash,
        };
        info!(
            closed = report.closed,
            realized_profit = %report.realized_profit,
            tx = ?report.tx_hash,
            "Exit complete"
        );
        self.journal(AuditEntry::new(
            TradeEvent::Exit,
            json!({
                "symbols": selling,
                "realized_profit": report.realized_profit.to_string(),
                "tx_hash": report.tx_hash,
            }),
        ))
        .await;

        Ok(report)
    }

    /// Balance to sell and its slippage floor, `None` when there is nothing
    /// to sell. Grants the router a Permit2 allowance first if needed.
    async fn prepare_sale(
        &self,
        executor: &dyn Executor,
        position: &Position,
        price: f64,
        deadline: u64,
    ) -> Result<Option<(U256, U256)>> {
        let account = executor.account();
        let spender = executor.spender();

        let balance = self.chain.balance_of(position.asset, account).await?;
        if balance.is_zero() {
            warn!(symbol = %position.symbol, "Zero balance, nothing to sell");
            return Ok(None);
        }

        let erc20_allowance = self.chain.allowance(position.asset, account, PERMIT2).await?;
        if erc20_allowance < balance {
            info!(symbol = %position.symbol, "Approving Permit2");
            executor.approve(position.asset, PERMIT2, U256::MAX).await?;
        }

        let permit = self
            .chain
            .permit2_allowance(position.asset, account, spender)
            .await?;
        if !permit.covers(balance, deadline) {
            info!(symbol = %position.symbol, spender = %spender, "Granting Permit2 allowance");
            executor.permit2_approve(position.asset, spender).await?;
        }

        let min_out =
            f64_to_u256(u256_to_f64(balance) * price * (1.0 - self.strategy.exit_slippage));
        info!(
            symbol = %position.symbol,
            amount = %format_units(balance, position.decimals),
            price,
            "Selling"
        );
        Ok(Some((balance, min_out)))
    }
}
