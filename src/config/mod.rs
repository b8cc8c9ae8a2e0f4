//! Configuration for the pair sniper

pub mod rpc;

use crate::tokens::{addresses, chains};
use crate::{Error, Result};
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// Re-export RPC config
pub use rpc::RpcConfig;

/// Environment variable holding the sentiment model API key
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Environment variable holding the signer's private key
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Environment overrides applied on top of the file/default config
mod env_vars {
    pub const BACKUP_ADDRESS: &str = "BACKUP_ADDRESS";
    pub const PROFIT_THRESHOLD: &str = "PROFIT_THRESHOLD";
    pub const RUG_THRESHOLD: &str = "RUG_THRESHOLD";
    pub const WETH_ADDRESS: &str = "WETH_ADDRESS";
    pub const TRADING_MODE: &str = "TRADING_MODE";
}

/// Supported blockchain networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Arbitrum,
    Optimism,
    Base,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Ethereum => chains::ETHEREUM,
            Network::Arbitrum => chains::ARBITRUM,
            Network::Optimism => chains::OPTIMISM,
            Network::Base => chains::BASE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Arbitrum => "arbitrum",
            Network::Optimism => "optimism",
            Network::Base => "base",
        }
    }

    /// Wrapped native token every price is quoted against
    pub fn wrapped_native(&self) -> Address {
        match self {
            Network::Ethereum => addresses::WETH_ETH,
            Network::Arbitrum => addresses::WETH_ARB,
            Network::Optimism => addresses::WETH_OPT,
            Network::Base => addresses::WETH_BASE,
        }
    }

    pub fn v2_factory(&self) -> Address {
        match self {
            Network::Ethereum => addresses::V2_FACTORY_ETH,
            Network::Arbitrum => addresses::V2_FACTORY_ARB,
            Network::Optimism => addresses::V2_FACTORY_OPT,
            Network::Base => addresses::V2_FACTORY_BASE,
        }
    }

    pub fn universal_router(&self) -> Address {
        match self {
            Network::Ethereum => addresses::UNIVERSAL_ROUTER_ETH,
            Network::Arbitrum => addresses::UNIVERSAL_ROUTER_ARB,
            Network::Optimism => addresses::UNIVERSAL_ROUTER_OPT,
            Network::Base => addresses::UNIVERSAL_ROUTER_BASE,
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ethereum" | "mainnet" => Ok(Network::Ethereum),
            "arbitrum" => Ok(Network::Arbitrum),
            "optimism" => Ok(Network::Optimism),
            "base" => Ok(Network::Base),
            other => Err(Error::InvalidArgument(format!("Unknown network: {}", other))),
        }
    }
}

/// Whether the agent is allowed to sign and submit transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TradingMode {
    /// Paper trading: positions are simulated, nothing is ever signed
    #[default]
    Monitoring,
    /// Real swaps through the configured signer
    Live,
}

impl FromStr for TradingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "monitoring" | "paper" => Ok(TradingMode::Monitoring),
            "live" => Ok(TradingMode::Live),
            other => Err(Error::Config(format!("Unknown trading mode: {}", other))),
        }
    }
}

/// Entry/exit thresholds and execution bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// PnL ratio above which a position is sold (1000.0 = +100000%)
    pub profit_take_ratio: f64,
    /// PnL ratio below which a position is abandoned without selling
    pub rug_drop_ratio: f64,
    /// Slippage floor applied to entry swaps (0.005 = 0.5%)
    pub entry_slippage: f64,
    /// Slippage floor applied to exit swaps (0.05 = 5%)
    pub exit_slippage: f64,
    /// Validity window for submitted transactions
    pub deadline_window_secs: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            profit_take_ratio: 1000.0,
            rug_drop_ratio: 99.0,
            entry_slippage: 0.005,
            exit_slippage: 0.05,
            deadline_window_secs: 120, // 2 minutes
        }
    }
}

/// Sentiment model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    /// Model identifier sent to the Messages API
    pub model: String,
    pub max_tokens: u32,
    /// Base URL of the Messages API
    pub api_url: String,
    /// Request timeout
    pub timeout_secs: u64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-haiku-20240307".to_string(),
            max_tokens: 1000,
            api_url: "https://api.anthropic.com/v1/messages".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chain to watch
    pub network: Network,
    /// Monitoring (paper) or live trading
    #[serde(default)]
    pub mode: TradingMode,
    /// Override for the reference (base) asset, defaults to the network's WETH
    #[serde(default)]
    pub reference_asset: Option<Address>,
    /// Override for the Uniswap V2 factory
    #[serde(default)]
    pub factory: Option<Address>,
    /// Override for the Universal Router
    #[serde(default)]
    pub router: Option<Address>,
    /// Where residual balances are swept on shutdown
    #[serde(default)]
    pub backup_address: Option<Address>,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    /// Capacity of each event channel between the chain poller and the agent
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Path to persist open positions (optional)
    #[serde(default)]
    pub state_file: Option<String>,
    /// Path to the JSONL trade journal (optional)
    #[serde(default)]
    pub audit_log_path: Option<String>,
}

fn default_event_buffer() -> usize {
    256
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::Ethereum,
            mode: TradingMode::Monitoring,
            reference_asset: None,
            factory: None,
            router: None,
            backup_address: None,
            strategy: StrategyConfig::default(),
            sentiment: SentimentConfig::default(),
            event_buffer: default_event_buffer(),
            state_file: None,
            audit_log_path: Some("trades.jsonl".to_string()),
        }
    }
}

impl Config {
    pub fn reference_asset(&self) -> Address {
        self.reference_asset
            .unwrap_or_else(|| self.network.wrapped_native())
    }

    pub fn factory(&self) -> Address {
        self.factory.unwrap_or_else(|| self.network.v2_factory())
    }

    pub fn router(&self) -> Address {
        self.router.unwrap_or_else(|| self.network.universal_router())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    ///
    /// Empty values are ignored so `BACKUP_ADDRESS=` in a `.env` file behaves
    /// like an unset variable.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get(env_vars::BACKUP_ADDRESS) {
            self.backup_address = Some(parse_address(env_vars::BACKUP_ADDRESS, &value)?);
        }
        if let Some(value) = get(env_vars::WETH_ADDRESS) {
            self.reference_asset = Some(parse_address(env_vars::WETH_ADDRESS, &value)?);
        }
        if let Some(value) = get(env_vars::PROFIT_THRESHOLD) {
            self.strategy.profit_take_ratio = parse_ratio(env_vars::PROFIT_THRESHOLD, &value)?;
        }
        if let Some(value) = get(env_vars::RUG_THRESHOLD) {
            self.strategy.rug_drop_ratio = parse_ratio(env_vars::RUG_THRESHOLD, &value)?;
        }
        if let Some(value) = get(env_vars::TRADING_MODE) {
            self.mode = value.parse()?;
        }
        Ok(())
    }

    /// Reject configurations the agent cannot run with
    pub fn validate(&self) -> Result<()> {
        let s = &self.strategy;
        if !s.profit_take_ratio.is_finite() || !s.rug_drop_ratio.is_finite() {
            return Err(Error::Config("PnL thresholds must be finite".to_string()));
        }
        for (name, value) in [
            ("entry_slippage", s.entry_slippage),
            ("exit_slippage", s.exit_slippage),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be in [0, 1), got {}",
                    name, value
                )));
            }
        }
        if s.deadline_window_secs == 0 {
            return Err(Error::Config(
                "deadline_window_secs must be positive".to_string(),
            ));
        }
        if self.event_buffer == 0 {
            return Err(Error::Config("event_buffer must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_address(key: &str, value: &str) -> Result<Address> {
    Address::from_str(value.trim())
        .map_err(|e| Error::Config(format!("{} is not a valid address: {}", key, e)))
}

fn parse_ratio(key: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|e| Error::Config(format!("{} is not a number: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn config_deserialize_defaults() {
        let value = serde_json::json!({
            "network": "base",
            "event_buffer": 64
        });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.mode, TradingMode::Monitoring);
        assert_eq!(parsed.strategy.profit_take_ratio, 1000.0);
        assert_eq!(parsed.strategy.rug_drop_ratio, 99.0);
        assert_eq!(parsed.strategy.deadline_window_secs, 120);
        assert_eq!(parsed.reference_asset(), addresses::WETH_BASE);
        assert!(parsed.backup_address.is_none());
        assert_eq!(parsed.event_buffer, 64);
    }

    #[test]
    fn config_without_event_buffer_uses_default() {
        let value = serde_json::json!({ "network": "ethereum" });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.event_buffer, 256);
        assert_eq!(parsed.event_buffer, Config::default().event_buffer);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup(&[
                ("BACKUP_ADDRESS", "0x00000000000000000000000000000000000000aa"),
                ("PROFIT_THRESHOLD", "250.5"),
                ("TRADING_MODE", "live"),
            ]))
            .unwrap();

        assert_eq!(
            config.backup_address,
            Some(Address::from_str("0x00000000000000000000000000000000000000aa").unwrap())
        );
        assert_eq!(config.strategy.profit_take_ratio, 250.5);
        assert_eq!(config.strategy.rug_drop_ratio, 99.0);
        assert_eq!(config.mode, TradingMode::Live);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup(&[("BACKUP_ADDRESS", "  ")]))
            .unwrap();
        assert!(config.backup_address.is_none());
    }

    #[test]
    fn invalid_backup_address_is_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup(&[("BACKUP_ADDRESS", "not-an-address")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn weth_override_replaces_network_default() {
        let mut config = Config::default();
        assert_eq!(config.reference_asset(), addresses::WETH_ETH);
        config
            .apply_overrides(lookup(&[(
                "WETH_ADDRESS",
                "0x4200000000000000000000000000000000000006",
            )]))
            .unwrap();
        assert_eq!(config.reference_asset(), addresses::WETH_OPT);
    }

    #[test]
    fn validate_rejects_bad_slippage() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        config.strategy.exit_slippage = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn network_parsing() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Ethereum);
        assert_eq!("Base".parse::<Network>().unwrap(), Network::Base);
        assert!("solana".parse::<Network>().is_err());
    }
}
