use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

/// Provenance tag on every aggregated summary.
pub const METRICS_SOURCE: &str = "claude-monitor";

/// Burn-rate snapshot over one window of usage entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    #[serde(with = "crate::utils::utc_z")]
    pub timestamp: DateTime<Utc>,
    pub window_hours: f64,
    pub burn_rate_per_hour: f64,
    pub total_cost_usd: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
    pub total_tokens: u64,
    pub session_count: usize,
    pub active_session_id: Option<String>,
    #[serde(with = "crate::utils::utc_z")]
    pub last_activity: DateTime<Utc>,
    pub source: String,
}

impl MetricsSummary {
    /// Zeroed summary for a window without any entries.
    pub fn empty(now: DateTime<Utc>, window_hours: f64) -> Self {
        Self {
            timestamp: now,
            window_hours,
            burn_rate_per_hour: 0.0,
            total_cost_usd: 0.0,
            input_tokens: 0,
            output_tokens: 0,
            cache_creation_tokens: 0,
            cache_read_tokens: 0,
            total_tokens: 0,
            session_count: 0,
            active_session_id: None,
            last_activity: now,
            source: METRICS_SOURCE.to_string(),
        }
    }

    /// Sanity checks a metrics store applies before accepting a snapshot.
    pub fn validate(&self) -> Result<(), MetricsError> {
        if self.window_hours.is_nan() || self.window_hours <= 0.0 {
            return Err(MetricsError::InvalidSummary(
                "window hours must be greater than zero",
            ));
        }
        if self.total_cost_usd.is_nan() || self.total_cost_usd < 0.0 {
            return Err(MetricsError::InvalidSummary("total cost must be non-negative"));
        }
        if self.burn_rate_per_hour.is_nan() || self.burn_rate_per_hour < 0.0 {
            return Err(MetricsError::InvalidSummary("burn rate must be non-negative"));
        }
        let parts = self
            .input_tokens
            .saturating_add(self.output_tokens)
            .saturating_add(self.cache_creation_tokens)
            .saturating_add(self.cache_read_tokens);
        if parts != self.total_tokens {
            return Err(MetricsError::InvalidSummary(
                "total tokens must equal the sum of token categories",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_summary_is_valid_and_serializes_null_session() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let s = MetricsSummary::empty(now, 6.0);
        assert!(s.validate().is_ok());
        let v = serde_json::to_value(&s).unwrap();
        assert!(v["active_session_id"].is_null());
        assert_eq!(v["last_activity"], "2025-03-01T12:00:00.000000Z");
        assert_eq!(v["source"], "claude-monitor");
    }

    #[test]
    fn validate_rejects_bad_snapshots() {
        let now = Utc::now();
        let mut s = MetricsSummary::empty(now, 0.0);
        assert!(s.validate().is_err());

        s.window_hours = 1.0;
        s.total_cost_usd = -1.0;
        assert!(s.validate().is_err());

        s.total_cost_usd = f64::NAN;
        assert!(s.validate().is_err());

        s.total_cost_usd = 1.0;
        s.input_tokens = 5;
        assert!(s.validate().is_err());
        s.total_tokens = 5;
        assert!(s.validate().is_ok());
    }
}
