use super::{Agent, Execution};
use crate::audit::{AuditEntry, TradeEvent};
use crate::chain::plan::recipients;
use crate::chain::{Executor, PairCreated, Plan, TokenMetadata};
use crate::positions::Position;
use crate::sentiment::Decision;
use crate::tokens::{f64_to_u256, format_units, one_unit, ratio, scale_by_fraction, u256_to_f64};
use crate::{Error, Result};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

impl Agent {
    /// Try to open a position on a newly created pair
    ///
    /// Returns `None` when the pair is skipped. In live mode any failure from
    /// the purchase onward is `ExecutionFailed` and nothing is recorded.
    pub async fn try_enter(&mut self, event: &PairCreated) -> Result<Option<Position>> {
        if event.base_asset != self.reference_asset {
            debug!(
                pool = %event.pool,
                base = %event.base_asset,
                "Pair not quoted in the reference asset"
            );
            return Ok(None);
        }

        let asset = event.counter_asset;
        let metadata = self.chain.token_metadata(asset).await?;
        let reserves = self.chain.get_reserves(event.pool).await?;
        let Some(spot_price) = reserves.spot_price() else {
            warn!(symbol = %metadata.symbol, pool = %event.pool, "Pool has no liquidity yet");
            return Ok(None);
        };

        let confidence = match self.gate.decide(&metadata.name, &metadata.symbol).await? {
            Decision::Reject => {
                info!(symbol = %metadata.symbol, "Sentiment rejected token");
                return Ok(None);
            }
            Decision::Enter { confidence } => confidence,
        };
        info!(
            symbol = %metadata.symbol,
            name = %metadata.name,
            confidence,
            spot_price,
            "Entering position"
        );

        let position = match &self.execution {
            Execution::Monitoring => Position {
                symbol: metadata.symbol.clone(),
                entry_price: spot_price,
                amount: one_unit(metadata.decimals),
                decimals: metadata.decimals,
                opened_at: Utc::now(),
                asset,
                pool: event.pool,
            },
            Execution::Live(executor) => {
                self.buy(executor.as_ref(), event, &metadata, spot_price, confidence)
                    .await?
            }
        };

        self.store.insert(position.clone());
        self.journal(
            AuditEntry::new(
                TradeEvent::Entry,
                json!({
                    "mode": self.mode(),
                    "pool": event.pool,
                    "confidence": confidence,
                    "entry_price": position.entry_price,
                    "amount": position.amount.to_string(),
                }),
            )
            .position(&position.symbol, asset),
        )
        .await;

        Ok(Some(position))
    }

    async fn buy(
        &self,
        executor: &dyn Executor,
        event: &PairCreated,
        metadata: &TokenMetadata,
        spot_price: f64,
        confidence: f64,
    ) -> Result<Position> {
        let asset = event.counter_asset;
        let account = executor.account();

        let capital = self.chain.native_balance(account).await?;
        let purchase = scale_by_fraction(capital, confidence);
        if purchase.is_zero() {
            return Err(Error::ExecutionFailed(format!(
                "no capital to commit ({} available)",
                capital
            )));
        }

        let expected_out = u256_to_f64(purchase) / spot_price;
        let min_out = f64_to_u256(expected_out * (1.0 - self.strategy.entry_slippage));
        let plan = Plan::new()
            .wrap_eth(recipients::ADDRESS_THIS, purchase)
            .v2_swap_exact_in(
                recipients::MSG_SENDER,
                purchase,
                min_out,
                vec![self.reference_asset, asset],
                false,
            );
        let deadline = unix_now() + self.strategy.deadline_window_secs;

        let before = self.chain.balance_of(asset, account).await?;
        let submission = executor
            .submit(&plan, deadline, purchase)
            .await
            .map_err(execution_failure)?;
        if !submission.success {
            let reason = submission
                .error
                .unwrap_or_else(|| "swap reverted".to_string());
            return Err(Error::ExecutionFailed(reason));
        }
        let after = self
            .chain
            .balance_of(asset, account)
            .await
            .map_err(execution_failure)?;

        let bought = after.saturating_sub(before);
        let entry_price = ratio(purchase, bought).ok_or_else(|| {
            Error::ExecutionFailed(format!("swap into {} returned no tokens", metadata.symbol))
        })?;

        info!(
            symbol = %metadata.symbol,
            tx = ?submission.tx_hash,
            spent = %format_units(purchase, 18),
            bought = %format_units(bought, metadata.decimals),
            entry_price,
            "Bought"
        );

        Ok(Position {
            symbol: metadata.symbol.clone(),
            entry_price,
            amount: bought,
            decimals: metadata.decimals,
            opened_at: Utc::now(),
            asset,
            pool: event.pool,
        })
    }
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// Anything that goes wrong once a transaction is in play is an execution failure
pub(super) fn execution_failure(e: Error) -> Error {
    match e {
        Error::ExecutionFailed(_) => e,
        other => Error::ExecutionFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_failure_wraps_other_errors() {
        let wrapped = execution_failure(Error::Rpc("timeout".to_string()));
        assert!(matches!(wrapped, Error::ExecutionFailed(ref m) if m.contains("timeout")));

        let kept = execution_failure(Error::ExecutionFailed("reverted".to_string()));
        assert!(matches!(kept, Error::ExecutionFailed(ref m) if m == "reverted"));
    }
}
