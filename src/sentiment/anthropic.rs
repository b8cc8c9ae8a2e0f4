//! Messages API client for meme sentiment scoring
//!
//! SECURITY NOTE:
//! - The API key is held in a `SecretString` and only exposed when building
//!   the request header
//! - It is never logged or serialized

use super::{parse_score, SentimentModel};
use crate::config::{SentimentConfig, ANTHROPIC_API_KEY_ENV};
use crate::{Error, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str = r#"For the purposes of this conversation, I'd like you to respond with an floating point number between 0 and 1. Your background is that you are a really smart meme trader that is an expert at knowing when a meme is good or bad. If I share with you any meme name and shorthand symbol for that meme, I want you to tell me how strongly you feel it is memetic and will likely get attention. I want you to be conservative in your estimates, with 0.05 as your average guess, using 0 if you don't like it at all, and only using a number close to 1 if you are extremely confident that a meme is likely to go viral. I do not want you to provide any other commentary whatsoever.

I will provide examples in the future using a JSON format that looks like the following:
```json
{
    "name": "<meme name>",
    "symbol": "<shorthand symbol for meme>"
}
```"#;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct TokenPrompt<'a> {
    name: &'a str,
    symbol: &'a str,
}

/// Sentiment model backed by the Anthropic Messages API
pub struct AnthropicModel {
    client: reqwest::Client,
    api_key: SecretString,
    config: SentimentConfig,
}

impl AnthropicModel {
    pub fn new(api_key: SecretString, config: SentimentConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    /// Create from the `ANTHROPIC_API_KEY` environment variable
    pub fn from_env(config: SentimentConfig) -> Result<Self> {
        let key = std::env::var(ANTHROPIC_API_KEY_ENV).map_err(|_| {
            Error::Config(format!(
                "Environment variable {} not set. Required for sentiment scoring.",
                ANTHROPIC_API_KEY_ENV
            ))
        })?;
        Self::new(SecretString::from(key), config)
    }

    fn request_body(&self, name: &str, symbol: &str) -> Result<MessagesRequest<'_>> {
        let content = serde_json::to_string(&TokenPrompt { name, symbol })?;
        Ok(MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: 0.0,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content,
            }],
        })
    }
}

#[async_trait]
impl SentimentModel for AnthropicModel {
    async fn score(&self, name: &str, symbol: &str) -> Result<f64> {
        let body = self.request_body(name, symbol)?;

        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::ScoringUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ScoringUnavailable(format!(
                "model API returned {}",
                status
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::ScoringUnavailable(format!("invalid response body: {}", e)))?;

        let text = parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| Error::ScoringUnavailable("empty model reply".to_string()))?;

        tracing::debug!(symbol = symbol, reply = %text.trim(), "Sentiment model replied");
        parse_score(&text)
    }
}

impl std::fmt::Debug for AnthropicModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicModel")
            .field("model", &self.config.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
