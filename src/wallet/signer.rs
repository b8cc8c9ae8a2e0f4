//! Signing key holder
//!
//! SECURITY: the private key is parsed once into alloy's `PrivateKeySigner`
//! and only ever leaves this module wrapped in an `EthereumWallet`.
//! - Never serialized
//! - Never logged (Debug is redacted)

use crate::config::PRIVATE_KEY_ENV;
use crate::{Error, Result};
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use secrecy::{ExposeSecret, SecretString};

pub struct SecureWallet {
    address: Address,
    wallet: EthereumWallet,
}

impl SecureWallet {
    /// Load the signer from `PRIVATE_KEY`
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(PRIVATE_KEY_ENV).map_err(|_| {
            Error::Wallet(format!(
                "{} not set. Live trading needs a signer; use monitoring mode without one.",
                PRIVATE_KEY_ENV
            ))
        })?;
        Self::from_secret(&SecretString::from(key))
    }

    /// Parse a hex-encoded private key, with or without `0x`
    pub fn from_secret(key: &SecretString) -> Result<Self> {
        let raw = key.expose_secret().trim();
        let raw = raw.strip_prefix("0x").unwrap_or(raw);

        let signer: PrivateKeySigner = raw
            .parse()
            .map_err(|e| Error::Wallet(format!("Invalid private key: {}", e)))?;

        Ok(Self {
            address: signer.address(),
            wallet: EthereumWallet::from(signer),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Signing handle for alloy providers
    pub fn wallet(&self) -> &EthereumWallet {
        &self.wallet
    }
}

impl std::fmt::Debug for SecureWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureWallet")
            .field("address", &self.address)
            .field("signer", &"[REDACTED]")
            .finish()
    }
}
