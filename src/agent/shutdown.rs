use super::{Agent, Execution};
use crate::audit::{AuditEntry, TradeEvent};
use serde_json::json;
use tracing::{debug, info, warn};

impl Agent {
    /// Transfer every open position's full balance to the backup address
    ///
    /// Transfers are broadcast without waiting for confirmation and positions
    /// stay in the store. Returns the number of transfers broadcast.
    pub async fn sweep(&self) -> usize {
        let Execution::Live(executor) = &self.execution else {
            debug!("Monitoring mode, nothing to sweep");
            return 0;
        };
        let Some(backup) = self.backup_address else {
            warn!(
                open_positions = self.store.len(),
                "No backup address configured, balances stay in the trading wallet"
            );
            return 0;
        };

        let account = executor.account();
        let mut swept = 0;

        for position in self.store.iter() {
            let balance = match self.chain.balance_of(position.asset, account).await {
                Ok(balance) => balance,
                Err(e) => {
                    warn!(symbol = %position.symbol, error = %e, "Balance read failed, not swept");
                    continue;
                }
            };
            if balance.is_zero() {
                continue;
            }

            match executor.transfer(position.asset, backup, balance).await {
                Ok(()) => {
                    swept += 1;
                    info!(symbol = %position.symbol, to = %backup, amount = %balance, "Swept");
                    self.journal(
                        AuditEntry::new(
                            TradeEvent::Sweep,
                            json!({ "to": backup, "amount": balance.to_string() }),
                        )
                        .position(&position.symbol, position.asset),
                    )
                    .await;
                }
                Err(e) => {
                    warn!(symbol = %position.symbol, error = %e, "Sweep transfer failed");
                }
            }
        }

        swept
    }
}
