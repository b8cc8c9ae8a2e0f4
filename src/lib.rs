//! Pair Sniper
//!
//! A trading agent that watches a Uniswap V2 factory for new pairs and:
//! - Scores each new token's name and symbol with an LLM sentiment model
//! - Buys in proportion to the model's confidence (or simulates the buy)
//! - Re-prices every open position on each block and sells runaway winners
//! - Sweeps remaining balances to a backup address on shutdown
//!
//! # Security Model
//!
//! - Private keys never leave the wallet module
//! - Every plan is simulated with `eth_call` before it is signed
//! - Without a signer the agent runs in monitoring mode and never submits
//! - Optional JSONL journal of every entry, drop, exit and sweep

pub mod agent;
pub mod audit;
pub mod chain;
pub mod config;
pub mod positions;
pub mod sentiment;
pub mod tokens;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use agent::{Agent, Execution, ExitReport};
pub use config::{Config, Network, RpcConfig, StrategyConfig, TradingMode};
pub use error::{Error, Result};
pub use positions::{Position, PositionStore};
pub use sentiment::{Decision, SentimentGate, SentimentModel};
