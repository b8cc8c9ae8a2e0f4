//! Sentiment gate
//!
//! Turns a token's name and symbol into a confidence in [0, 1]. Zero means
//! "do not buy"; anything above zero is both the go-decision and the fraction
//! of available capital to commit. Any conservatism lives in the model, not
//! here.

mod anthropic;

pub use anthropic::AnthropicModel;

use crate::{Error, Result};
use async_trait::async_trait;

/// External scoring model
#[async_trait]
pub trait SentimentModel: Send + Sync {
    /// Score a token. Implementations return the raw model output as a number
    /// and fail with `ScoringUnavailable` when the model can't be reached.
    async fn score(&self, name: &str, symbol: &str) -> Result<f64>;
}

/// Outcome of gating a candidate token
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Reject,
    Enter { confidence: f64 },
}

/// Applies the go/no-go policy on top of a [`SentimentModel`]
pub struct SentimentGate {
    model: Box<dyn SentimentModel>,
}

impl SentimentGate {
    pub fn new(model: Box<dyn SentimentModel>) -> Self {
        Self { model }
    }

    /// Raw confidence, validated to lie in [0, 1]
    pub async fn score(&self, name: &str, symbol: &str) -> Result<f64> {
        let confidence = self.model.score(name, symbol).await?;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::ScoringUnavailable(format!(
                "confidence {} outside [0, 1]",
                confidence
            )));
        }
        Ok(confidence)
    }

    pub async fn decide(&self, name: &str, symbol: &str) -> Result<Decision> {
        let confidence = self.score(name, symbol).await?;
        if confidence == 0.0 {
            return Ok(Decision::Reject);
        }
        Ok(Decision::Enter { confidence })
    }
}

/// Parse a model reply that must consist of a single floating point number
pub fn parse_score(reply: &str) -> Result<f64> {
    let trimmed = reply.trim();
    let value: f64 = trimmed.parse().map_err(|_| {
        Error::ScoringUnavailable(format!("unparsable model reply: {:?}", truncate(trimmed)))
    })?;
    if !value.is_finite() {
        return Err(Error::ScoringUnavailable(format!(
            "non-finite model reply: {}",
            trimmed
        )));
    }
    Ok(value)
}

fn truncate(s: &str) -> String {
    if s.chars().count() > 80 {
        format!("{}...", s.chars().take(80).collect::<String>())
    } else {
        s.to_string()
    }
}
