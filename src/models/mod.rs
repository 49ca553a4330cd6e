pub mod entry;
pub mod record;
pub mod summary;

pub use entry::UsageEntry;
pub use record::{TokenUsage, UsageRecord};
pub use summary::MetricsSummary;
