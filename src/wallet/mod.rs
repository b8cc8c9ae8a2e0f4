//! Wallet management and live execution
//!
//! The private key lives only inside [`SecureWallet`]. Everything that signs
//! goes through [`LiveExecutor`].

mod executor;
mod signer;
pub mod simulator;

pub use executor::LiveExecutor;
pub use signer::SecureWallet;
pub use simulator::{SimulationResult, TransactionSimulator};
