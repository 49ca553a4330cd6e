//! # Metrics Module
//!
//! Reduces a window of usage entries into one [`MetricsSummary`].
//!
//! ## Window
//!
//! A positive `hours_back` is used verbatim as the window. Otherwise the window
//! is the span between the earliest and latest entry, floored at
//! [`MIN_WINDOW_HOURS`] so near-simultaneous entries do not blow up the burn rate.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::MetricsError;
use crate::models::{MetricsSummary, UsageEntry};
use crate::models::summary::METRICS_SOURCE;
use crate::reader::UsageReader;

/// Name of the environment variable holding the aggregator configuration.
pub const CONFIG_ENV: &str = "CLAUDE_METRICS_CONFIG";

pub const MIN_WINDOW_HOURS: f64 = 0.1;

/// Window reported for an empty result when no positive `hours_back` was given.
pub const EMPTY_WINDOW_HOURS: f64 = 1.0;

/// Aggregator configuration decoded from the `CLAUDE_METRICS_CONFIG` blob.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricsConfig {
    pub data_dir: Option<PathBuf>,
    pub hours_back: Option<i64>,
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    data_dir: Option<String>,
    #[serde(default)]
    hours_back: Option<Value>,
}

impl MetricsConfig {
    /// Parse the JSON blob. Unknown keys are ignored; a missing blob means `{}`.
    pub fn from_json(raw: Option<&str>) -> Result<Self, MetricsError> {
        let raw = raw.unwrap_or("{}");
        let value: Value =
            serde_json::from_str(raw).map_err(|e| MetricsError::InvalidConfig(e.to_string()))?;
        if !value.is_object() {
            return Err(MetricsError::InvalidConfig(
                "expected a JSON object".to_string(),
            ));
        }
        let cfg: RawConfig =
            serde_json::from_value(value).map_err(|e| MetricsError::InvalidConfig(e.to_string()))?;
        let hours_back = match cfg.hours_back {
            None | Some(Value::Null) => None,
            Some(v) => Some(coerce_int(&v)?),
        };
        Ok(Self {
            data_dir: cfg.data_dir.map(PathBuf::from),
            hours_back,
        })
    }

    fn positive_hours(&self) -> Option<i64> {
        self.hours_back.filter(|h| *h > 0)
    }
}

/// Integer conversion for `hours_back`: integers as-is, floats truncated,
/// booleans as 0/1, numeric strings parsed.
fn coerce_int(v: &Value) -> Result<i64, MetricsError> {
    let bad = || MetricsError::InvalidHoursBack(format!("invalid value {v}"));
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
                    .ok_or_else(bad)
            }
        }
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| bad()),
        _ => Err(bad()),
    }
}

/// Reduce `entries` into a summary at `now`.
///
/// Entries are ordered by timestamp before reduction, so `active_session_id`
/// always belongs to the chronologically last entry.
pub fn aggregate(
    entries: &[UsageEntry],
    hours_back: Option<i64>,
    now: DateTime<Utc>,
) -> MetricsSummary {
    let requested = hours_back.filter(|h| *h > 0).map(|h| h as f64);

    if entries.is_empty() {
        return MetricsSummary::empty(now, requested.unwrap_or(EMPTY_WINDOW_HOURS));
    }

    let mut ordered: Vec<&UsageEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| e.ts);

    let mut total_cost = 0.0f64;
    let mut input = 0u64;
    let mut output = 0u64;
    let mut cache_create = 0u64;
    let mut cache_read = 0u64;
    let mut sessions: HashSet<&str> = HashSet::new();

    for e in &ordered {
        total_cost += e.cost_usd;
        // Counts clamp at u64::MAX rather than wrap.
        input = input.saturating_add(e.input);
        output = output.saturating_add(e.output);
        cache_create = cache_create.saturating_add(e.cache_create);
        cache_read = cache_read.saturating_add(e.cache_read);
        if !e.request_id.is_empty() {
            sessions.insert(e.request_id.as_str());
        }
    }

    // Non-empty by the early return above
    let first = ordered[0].ts;
    let last = ordered[ordered.len() - 1];

    let window_hours = requested.unwrap_or_else(|| {
        let span = (last.ts - first).num_milliseconds() as f64 / 3_600_000.0;
        span.max(MIN_WINDOW_HOURS)
    });
    let burn_rate = if window_hours > 0.0 {
        total_cost / window_hours
    } else {
        0.0
    };
    let session_count = if sessions.is_empty() {
        ordered.len()
    } else {
        sessions.len()
    };

    MetricsSummary {
        timestamp: now,
        window_hours,
        burn_rate_per_hour: burn_rate,
        total_cost_usd: total_cost,
        input_tokens: input,
        output_tokens: output,
        cache_creation_tokens: cache_create,
        cache_read_tokens: cache_read,
        total_tokens: input
            .saturating_add(output)
            .saturating_add(cache_create)
            .saturating_add(cache_read),
        session_count,
        active_session_id: Some(last.request_id.clone()).filter(|s| !s.is_empty()),
        last_activity: last.ts,
        source: METRICS_SOURCE.to_string(),
    }
}

/// Load the configured window through `reader` and produce a validated summary.
pub fn collect(
    config: &MetricsConfig,
    reader: &dyn UsageReader,
    now: DateTime<Utc>,
) -> Result<MetricsSummary, MetricsError> {
    let entries = reader.load_entries(config.data_dir.as_deref(), config.positive_hours())?;
    tracing::debug!(
        entries = entries.len(),
        hours_back = ?config.hours_back,
        "aggregating usage window"
    );
    let summary = aggregate(&entries, config.hours_back, now);
    summary.validate()?;
    Ok(summary)
}

/// Serialize a summary as the single output line.
pub fn to_json_line(summary: &MetricsSummary) -> Result<String, MetricsError> {
    serde_json::to_string(summary)
        .map_err(|e| MetricsError::Io(std::io::Error::other(e)))
}
