//! Error types for the pair sniper

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The sentiment model could not be reached or replied with something
    /// other than a single number in [0, 1].
    #[error("Sentiment scoring unavailable: {0}")]
    ScoringUnavailable(String),

    /// A submitted transaction reverted or could not be sent.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Position persistence failed: {0}")]
    Persistence(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
