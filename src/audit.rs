//! Trade journal
//!
//! Appends one JSON object per line for every entry, drop, exit and sweep.
//! Journal writes never fail the trade they describe.

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeEvent {
    Entry,
    Drop,
    Exit,
    Sweep,
}

/// One line of the journal
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub event: TradeEvent,
    pub symbol: Option<String>,
    pub asset: Option<Address>,
    pub details: Value,
    pub status: &'static str,
    pub error: Option<String>,
}

impl AuditEntry {
    pub fn new(event: TradeEvent, details: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
            symbol: None,
            asset: None,
            details,
            status: "success",
            error: None,
        }
    }

    pub fn position(mut self, symbol: &str, asset: Address) -> Self {
        self.symbol = Some(symbol.to_string());
        self.asset = Some(asset);
        self
    }

    pub fn failed(mut self, error: impl ToString) -> Self {
        self.status = "error";
        self.error = Some(error.to_string());
        self
    }
}

struct AuditLogWriter {
    path: PathBuf,
}

impl AuditLogWriter {
    fn write(&self, entry: &AuditEntry) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)
    }
}

pub struct AuditLog {
    writer: Mutex<AuditLogWriter>,
}

impl AuditLog {
    /// Journal at `path` (JSONL, created on first write)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            writer: Mutex::new(AuditLogWriter { path: path.into() }),
        }
    }

    pub async fn record(&self, entry: AuditEntry) {
        let writer = self.writer.lock().await;
        if let Err(e) = writer.write(&entry) {
            tracing::warn!(error = %e, "Failed to write audit log entry");
        }
    }
}
