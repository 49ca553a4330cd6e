//! # Reader Module
//!
//! Loads usage entries from JSON-Lines files for the metrics aggregator.
//!
//! Two line shapes are understood:
//! - flat usage records as written by [`crate::logger::UsageLogger`]
//! - Claude Code transcript lines carrying `message.usage`
//!
//! Lines that are not JSON, have no usable timestamp, or carry no usage are
//! skipped.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::MetricsError;
use crate::models::UsageEntry;
use crate::pricing::PriceTable;
use crate::utils::{claude_project_dirs, parse_utc};

/// Source of usage entries for one aggregation window.
///
/// Implementations return entries in chronological order.
pub trait UsageReader {
    fn load_entries(
        &self,
        data_dir: Option<&Path>,
        hours_back: Option<i64>,
    ) -> Result<Vec<UsageEntry>, MetricsError>;
}

/// Reads every `*.jsonl` file below the data directories.
#[derive(Clone, Debug)]
pub struct JsonlUsageReader {
    prices: PriceTable,
    now: Option<DateTime<Utc>>,
}

impl Default for JsonlUsageReader {
    fn default() -> Self {
        Self {
            prices: PriceTable::from_env(),
            now: None,
        }
    }
}

impl JsonlUsageReader {
    pub fn new(prices: PriceTable) -> Self {
        Self { prices, now: None }
    }

    /// Pin the reference time used for the lookback cutoff.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    fn roots(&self, data_dir: Option<&Path>) -> Result<Vec<PathBuf>, MetricsError> {
        match data_dir {
            Some(dir) if dir.is_dir() => Ok(vec![dir.to_path_buf()]),
            Some(dir) => Err(MetricsError::ReaderUnavailable(dir.to_path_buf())),
            None => Ok(claude_project_dirs()),
        }
    }
}

impl UsageReader for JsonlUsageReader {
    fn load_entries(
        &self,
        data_dir: Option<&Path>,
        hours_back: Option<i64>,
    ) -> Result<Vec<UsageEntry>, MetricsError> {
        let now = self.now.unwrap_or_else(Utc::now);
        // A lookback past the representable range covers everything: no cutoff.
        let cutoff = hours_back
            .filter(|h| *h > 0)
            .and_then(Duration::try_hours)
            .and_then(|d| now.checked_sub_signed(d));

        let mut entries = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for root in self.roots(data_dir)? {
            tracing::debug!(root = %root.display(), "scanning usage files");
            for path in jsonl_files(&root) {
                // File mtime optimization: skip files untouched since the cutoff
                if let Some(cutoff) = cutoff {
                    if let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) {
                        let mtime: DateTime<Utc> = modified.into();
                        if mtime < cutoff {
                            continue;
                        }
                    }
                }
                let file = match File::open(&path) {
                    Ok(f) => f,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable usage file");
                        continue;
                    }
                };
                for line in BufReader::new(file).lines() {
                    let line = match line {
                        Ok(l) => l,
                        Err(_) => continue,
                    };
                    let t = line.trim();
                    if t.is_empty() {
                        continue;
                    }
                    let v: Value = match serde_json::from_str(t) {
                        Ok(v) => v,
                        Err(_) => continue,
                    };
                    if let Some(key) = dedup_key(&v) {
                        if !seen.insert(key) {
                            continue;
                        }
                    }
                    let Some(entry) = parse_entry(&v, &self.prices) else {
                        continue;
                    };
                    if cutoff.is_some_and(|c| entry.ts < c) {
                        continue;
                    }
                    entries.push(entry);
                }
            }
        }

        entries.sort_by_key(|e| e.ts);
        tracing::debug!(count = entries.len(), "loaded usage entries");
        Ok(entries)
    }
}

fn jsonl_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|x| x.to_str()) == Some("jsonl"))
        .collect();
    files.sort();
    files
}

/// Streaming transcripts repeat a message once per content block; the pair of
/// message id and request id identifies the billed call.
fn dedup_key(v: &Value) -> Option<String> {
    let mid = v
        .get("message")
        .and_then(|m| m.get("id"))
        .and_then(|s| s.as_str())?;
    let rid = v
        .get("requestId")
        .or_else(|| v.get("request_id"))
        .and_then(|s| s.as_str())?;
    Some(format!("{mid}:{rid}"))
}

fn u64_field(obj: &Value, keys: &[&str]) -> u64 {
    keys.iter()
        .find_map(|k| obj.get(*k))
        .and_then(|n| n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)))
        .unwrap_or(0)
}

/// Parse one JSON line into a usage entry. Missing numeric fields count as zero.
pub fn parse_entry(v: &Value, prices: &PriceTable) -> Option<UsageEntry> {
    let ts = v.get("timestamp").and_then(|s| s.as_str()).and_then(parse_utc)?;
    let msg = v.get("message").filter(|m| m.is_object());

    let (usage, model) = match msg.and_then(|m| m.get("usage")).filter(|u| u.is_object()) {
        Some(usage) => (
            usage,
            msg.and_then(|m| m.get("model")).and_then(|s| s.as_str()),
        ),
        None => {
            // Flat records must carry at least one billed token field.
            if v.get("input_tokens").is_none() && v.get("output_tokens").is_none() {
                return None;
            }
            (v, v.get("model").and_then(|s| s.as_str()))
        }
    };

    let input = u64_field(usage, &["input_tokens"]);
    let output = u64_field(usage, &["output_tokens"]);
    let cache_create = u64_field(
        usage,
        &["cache_creation_input_tokens", "cache_creation_tokens"],
    );
    let cache_read = u64_field(usage, &["cache_read_input_tokens", "cache_read_tokens"]);

    // A negative or non-numeric recorded cost is priced from tokens instead.
    let cost_usd = v
        .get("cost_usd")
        .or_else(|| v.get("costUSD"))
        .and_then(|n| n.as_f64())
        .filter(|c| c.is_finite() && *c >= 0.0)
        .unwrap_or_else(|| prices.cost(model.unwrap_or(prices.default_model()), input, output));

    let request_id = v
        .get("request_id")
        .or_else(|| v.get("requestId"))
        .and_then(|s| s.as_str())
        .unwrap_or_default()
        .to_string();

    Some(UsageEntry {
        ts,
        model: model.map(|s| s.to_string()),
        cost_usd,
        input,
        output,
        cache_create,
        cache_read,
        request_id,
    })
}
