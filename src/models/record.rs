use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::UsageEntry;

/// Provenance tag written by the voice agent's usage logger.
pub const VOICE_AGENT_SOURCE: &str = "voice-agent";

/// Token counts for one completed model call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub cache_creation: u64,
    pub cache_read: u64,
}

impl TokenUsage {
    pub fn new(input: u64, output: u64) -> Self {
        Self {
            input,
            output,
            ..Self::default()
        }
    }

    pub fn with_cache(mut self, cache_creation: u64, cache_read: u64) -> Self {
        self.cache_creation = cache_creation;
        self.cache_read = cache_read;
        self
    }

    pub fn total(&self) -> u64 {
        self.input
            .saturating_add(self.output)
            .saturating_add(self.cache_creation)
            .saturating_add(self.cache_read)
    }
}

/// One line of the usage log. Never mutated once written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    #[serde(rename = "uuid", alias = "id")]
    pub id: Uuid,
    #[serde(with = "crate::utils::utc_z")]
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_creation_tokens: u64,
    #[serde(default)]
    pub cache_read_tokens: u64,
    pub cost_usd: f64,
    pub request_id: String,
    pub source: String,
}

impl UsageRecord {
    pub fn new(model: &str, usage: TokenUsage, cost_usd: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            model: model.to_string(),
            input_tokens: usage.input,
            output_tokens: usage.output,
            cache_creation_tokens: usage.cache_creation,
            cache_read_tokens: usage.cache_read,
            cost_usd,
            request_id: request_id_for(timestamp),
            source: VOICE_AGENT_SOURCE.to_string(),
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens
            .saturating_add(self.output_tokens)
            .saturating_add(self.cache_creation_tokens)
            .saturating_add(self.cache_read_tokens)
    }
}

impl From<&UsageRecord> for UsageEntry {
    fn from(r: &UsageRecord) -> Self {
        UsageEntry {
            ts: r.timestamp,
            model: Some(r.model.clone()),
            cost_usd: r.cost_usd,
            input: r.input_tokens,
            output: r.output_tokens,
            cache_create: r.cache_creation_tokens,
            cache_read: r.cache_read_tokens,
            request_id: r.request_id.clone(),
        }
    }
}

/// Synthetic request id with one-second resolution, e.g. `voice-20250102-030405`.
pub fn request_id_for(ts: DateTime<Utc>) -> String {
    format!("voice-{}", ts.format("%Y%m%d-%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn request_id_is_derived_from_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(request_id_for(ts), "voice-20250102-030405");
    }

    #[test]
    fn record_json_uses_uuid_key_and_z_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let record = UsageRecord::new("claude-sonnet-4-5", TokenUsage::new(10, 20), 0.5, ts);
        let v = serde_json::to_value(&record).unwrap();
        assert!(v.get("uuid").is_some());
        assert!(v.get("id").is_none());
        assert_eq!(v["timestamp"], "2025-01-02T03:04:05.000000Z");
        assert_eq!(v["source"], "voice-agent");
        assert_eq!(v["cache_read_tokens"], 0);
    }

    #[test]
    fn record_accepts_id_alias_and_missing_cache_fields() {
        let line = r#"{"id":"6f1c1f9e-2b7a-4a43-9d0e-2f7f4cf1d6aa","timestamp":"2025-01-02T03:04:05Z","model":"m","input_tokens":1,"output_tokens":2,"cost_usd":0.0,"request_id":"r","source":"voice-agent"}"#;
        let record: UsageRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.cache_creation_tokens, 0);
        assert_eq!(record.total_tokens(), 3);
    }
}
