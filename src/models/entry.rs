use chrono::{DateTime, Utc};

/// One usage entry as handed to the aggregator by a reader.
#[derive(Clone, Debug, PartialEq)]
pub struct UsageEntry {
    pub ts: DateTime<Utc>,
    pub model: Option<String>,
    pub cost_usd: f64,
    pub input: u64,
    pub output: u64,
    pub cache_create: u64,
    pub cache_read: u64,
    /// Empty when the source line carried none.
    pub request_id: String,
}

impl UsageEntry {
    pub fn total_tokens(&self) -> u64 {
        self.input
            .saturating_add(self.output)
            .saturating_add(self.cache_create)
            .saturating_add(self.cache_read)
    }
}
