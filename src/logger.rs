//! # Logger Module
//!
//! Appends one [`UsageRecord`] per completed model call to a JSON-Lines file and
//! keeps running totals for the calls made through one logger instance.
//!
//! The logger is an explicit accounting context: create one per voice session,
//! pass it by `&mut` to every call site, drop it when the session ends. Totals
//! are never reconciled against the file's full history.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::{TokenUsage, UsageRecord};
use crate::pricing::{DEFAULT_MODEL, PriceTable};
use crate::utils::{default_usage_log_path, format_count, format_currency, now_utc};

/// Token estimate used by the "log this turn" tool when none is given.
pub const DEFAULT_ESTIMATED_TOKENS: u64 = 1000;

#[derive(Debug)]
pub struct UsageLogger {
    log_path: PathBuf,
    prices: PriceTable,
    total_tokens: u64,
    total_cost: f64,
}

impl UsageLogger {
    /// Logger writing to `~/.claude/projects/voice-agent.jsonl`.
    pub fn new() -> Result<Self> {
        Self::with_path(default_usage_log_path())
    }

    /// Logger writing to `log_path`; parent directories are created eagerly.
    pub fn with_path(log_path: impl Into<PathBuf>) -> Result<Self> {
        let log_path = log_path.into();
        ensure_parent(&log_path)?;
        Ok(Self {
            log_path,
            prices: PriceTable::from_env(),
            total_tokens: 0,
            total_cost: 0.0,
        })
    }

    pub fn with_prices(mut self, prices: PriceTable) -> Self {
        self.prices = prices;
        self
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Record one completed call and append it to the log.
    pub fn log_usage(&mut self, model: &str, usage: TokenUsage) -> Result<UsageRecord> {
        self.log_usage_at(model, usage, now_utc())
    }

    pub fn log_usage_at(
        &mut self,
        model: &str,
        usage: TokenUsage,
        timestamp: DateTime<Utc>,
    ) -> Result<UsageRecord> {
        let cost = self.prices.cost(model, usage.input, usage.output);
        let record = UsageRecord::new(model, usage, cost, timestamp);
        self.append(&record)?;

        self.total_tokens = self.total_tokens.saturating_add(usage.total());
        self.total_cost += cost;

        tracing::info!(
            tokens = usage.total(),
            cost_usd = cost,
            path = %self.log_path.display(),
            "logged usage: {} tokens (${})",
            format_count(usage.total()),
            format_currency(cost)
        );
        Ok(record)
    }

    /// Log a rough per-turn estimate: 60% input, 40% output, default model.
    pub fn log_estimate(&mut self, estimated_tokens: u64) -> Result<UsageRecord> {
        self.log_usage(DEFAULT_MODEL, split_estimate(estimated_tokens))
    }

    fn append(&self, record: &UsageRecord) -> Result<()> {
        ensure_parent(&self.log_path)?;
        let mut line = serde_json::to_string(record).context("serialize usage record")?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("open usage log {}", self.log_path.display()))?;
        // One write per record keeps lines whole under O_APPEND.
        file.write_all(line.as_bytes())
            .with_context(|| format!("append to usage log {}", self.log_path.display()))?;
        Ok(())
    }
}

/// Split an estimated token total into input/output counts (floored 60/40).
pub fn split_estimate(estimated_tokens: u64) -> TokenUsage {
    let n = u128::from(estimated_tokens);
    // Both shares are at most n, so they fit back into u64.
    TokenUsage::new((n * 6 / 10) as u64, (n * 4 / 10) as u64)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create log directory {}", parent.display()))?;
        }
    }
    Ok(())
}
