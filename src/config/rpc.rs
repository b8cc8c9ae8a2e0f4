//! RPC endpoint configuration
//!
//! Resolution order follows the usual Ethereum tooling conventions:
//! 1. Per-chain env vars (ETH_RPC_URL, ARBITRUM_RPC_URL, etc.) - highest priority
//! 2. ALCHEMY_API_KEY - builds the URL automatically
//! 3. Public RPC fallback - rate limited, for monitoring/testing only
//!
//! ```bash
//! export ETH_RPC_URL="https://eth-mainnet.g.alchemy.com/v2/YOUR_KEY"
//! ```

use crate::config::Network;

/// RPC endpoint for the watched chain
#[derive(Debug, Clone)]
pub struct RpcConfig {
    network: Network,
    url: String,
}

/// Environment variable names
mod env_vars {
    pub const ETH_RPC_URL: &str = "ETH_RPC_URL";
    pub const ARBITRUM_RPC_URL: &str = "ARBITRUM_RPC_URL";
    pub const OPTIMISM_RPC_URL: &str = "OPTIMISM_RPC_URL";
    pub const BASE_RPC_URL: &str = "BASE_RPC_URL";

    pub const ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";
}

/// Public RPC endpoints (rate limited, for testing only)
mod public_rpcs {
    pub const ETHEREUM: &str = "https://eth.llamarpc.com";
    pub const ARBITRUM: &str = "https://arb1.arbitrum.io/rpc";
    pub const OPTIMISM: &str = "https://mainnet.optimism.io";
    pub const BASE: &str = "https://mainnet.base.org";
}

impl RpcConfig {
    /// Resolve the RPC URL for `network` from the process environment
    pub fn from_env(network: Network) -> Self {
        Self::resolve(network, |key| std::env::var(key).ok())
    }

    /// Resolve the RPC URL using an arbitrary variable lookup
    pub fn resolve<F>(network: Network, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let per_chain_var = match network {
            Network::Ethereum => env_vars::ETH_RPC_URL,
            Network::Arbitrum => env_vars::ARBITRUM_RPC_URL,
            Network::Optimism => env_vars::OPTIMISM_RPC_URL,
            Network::Base => env_vars::BASE_RPC_URL,
        };

        if let Some(url) = lookup(per_chain_var) {
            tracing::debug!(var = per_chain_var, "Using per-chain RPC URL");
            return Self { network, url };
        }

        if let Some(key) = lookup(env_vars::ALCHEMY_API_KEY) {
            tracing::info!(network = network.name(), "Building RPC URL from ALCHEMY_API_KEY");
            let subdomain = match network {
                Network::Ethereum => "eth-mainnet",
                Network::Arbitrum => "arb-mainnet",
                Network::Optimism => "opt-mainnet",
                Network::Base => "base-mainnet",
            };
            return Self {
                network,
                url: format!("https://{}.g.alchemy.com/v2/{}", subdomain, key),
            };
        }

        tracing::warn!(
            network = network.name(),
            "No RPC configured, using public RPC (rate limited)"
        );
        let url = match network {
            Network::Ethereum => public_rpcs::ETHEREUM,
            Network::Arbitrum => public_rpcs::ARBITRUM,
            Network::Optimism => public_rpcs::OPTIMISM,
            Network::Base => public_rpcs::BASE,
        };
        Self {
            network,
            url: url.to_string(),
        }
    }

    /// Create with an explicit RPC URL
    pub fn with_url(network: Network, url: impl Into<String>) -> Self {
        Self {
            network,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn chain_id(&self) -> u64 {
        self.network.chain_id()
    }

    /// Parse the URL for alloy's HTTP transport
    pub fn parsed_url(&self) -> crate::Result<url::Url> {
        self.url
            .parse()
            .map_err(|e| crate::Error::Config(format!("Invalid RPC URL {}: {}", self.url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_chain_var_wins() {
        let config = RpcConfig::resolve(Network::Base, |key| match key {
            "BASE_RPC_URL" => Some("https://custom.base".to_string()),
            "ALCHEMY_API_KEY" => Some("key".to_string()),
            _ => None,
        });
        assert_eq!(config.url(), "https://custom.base");
        assert_eq!(config.chain_id(), 8453);
    }

    #[test]
    fn test_alchemy_key_builds_url() {
        let config = RpcConfig::resolve(Network::Arbitrum, |key| match key {
            "ALCHEMY_API_KEY" => Some("abc".to_string()),
            _ => None,
        });
        assert_eq!(config.url(), "https://arb-mainnet.g.alchemy.com/v2/abc");
    }

    #[test]
    fn test_public_rpc_fallback() {
        let config = RpcConfig::resolve(Network::Ethereum, |_| None);
        assert_eq!(config.url(), public_rpcs::ETHEREUM);
        assert!(config.parsed_url().is_ok());
    }
}
