//! Pre-flight simulation of router plans
//!
//! Every plan is run through `eth_call` from the signer's address before it is
//! signed, so an obvious revert (expired deadline, slippage, empty balance)
//! costs no gas.
//!
//! SECURITY NOTE:
//! - Read-only; never signs or submits

use crate::{Error, Result};
use alloy::hex;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::TransactionRequest;
use serde::{Deserialize, Serialize};

/// `Error(string)` selector
const ERROR_STRING_SELECTOR: &str = "0x08c379a0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub success: bool,
    pub gas_used: Option<u64>,
    pub revert_reason: Option<String>,
}

impl SimulationResult {
    pub fn success(gas_used: u64) -> Self {
        Self {
            success: true,
            gas_used: Some(gas_used),
            revert_reason: None,
        }
    }

    pub fn failed(reason: String) -> Self {
        Self {
            success: false,
            gas_used: None,
            revert_reason: Some(reason),
        }
    }
}

/// `eth_call`-based simulator
pub struct TransactionSimulator {
    provider: DynProvider,
}

impl TransactionSimulator {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }

    /// Simulate a call and, if it succeeds, estimate its gas
    ///
    /// A revert, which the node reports as a JSON-RPC error response, is
    /// returned in the result. Failing to reach the node at all is an `Err`.
    pub async fn simulate(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
        value: U256,
    ) -> Result<SimulationResult> {
        let tx = TransactionRequest::default()
            .from(from)
            .to(to)
            .input(data.into())
            .value(value);

        match self.provider.call(tx.clone()).await {
            Ok(_) => {
                let gas = self.provider.estimate_gas(tx).await.unwrap_or(0);
                Ok(SimulationResult::success(gas))
            }
            Err(e) if e.is_error_resp() => {
                Ok(SimulationResult::failed(parse_revert_reason(&e.to_string())))
            }
            Err(e) => Err(Error::Rpc(format!("eth_call: {}", e))),
        }
    }
}

/// Pull a human-readable revert reason out of an RPC error message
pub fn parse_revert_reason(error: &str) -> String {
    if !error.contains("execution reverted") {
        return error.to_string();
    }

    if let Some(start) = error.find("revert: ") {
        let reason = &error[start + 8..];
        return match reason.find('"') {
            Some(end) => reason[..end].to_string(),
            None => reason.to_string(),
        };
    }

    if let Some(start) = error.find("0x") {
        let data = &error[start..];
        let end = data
            .find(|c: char| !c.is_ascii_hexdigit() && c != 'x')
            .unwrap_or(data.len());
        let data = &data[..end];

        // selector (10 chars) + offset word + length word
        if data.starts_with(ERROR_STRING_SELECTOR) && data.len() > 138 {
            if let Ok(decoded) = hex::decode(&data[138..]) {
                let text: Vec<u8> = decoded.into_iter().filter(|&b| b != 0).collect();
                if let Ok(s) = String::from_utf8(text) {
                    return s;
                }
            }
        }
        return format!("Reverted with data: {}", data);
    }

    "execution reverted".to_string()
}
