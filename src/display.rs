use std::path::Path;

#[cfg(feature = "colors")]
use owo_colors::OwoColorize;

// Provide a no-op color shim when "colors" feature is disabled
#[cfg(not(feature = "colors"))]
pub mod color_shim {
    use std::fmt::{self, Display, Formatter};

    #[derive(Clone)]
    pub struct Plain(pub String);

    impl Display for Plain {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    pub trait ColorizeShim {
        fn as_str(&self) -> &str;

        fn bright_black(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn yellow(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn green(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bold(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
    }

    impl ColorizeShim for &str {
        fn as_str(&self) -> &str {
            self
        }
    }
    impl ColorizeShim for String {
        fn as_str(&self) -> &str {
            self.as_str()
        }
    }
    impl ColorizeShim for Plain {
        fn as_str(&self) -> &str {
            &self.0
        }
    }
}

#[cfg(not(feature = "colors"))]
use color_shim::ColorizeShim as OwoColorize;

use crate::logger::UsageLogger;
use crate::models::UsageRecord;
use crate::utils::{format_count, format_currency};

/// `📊 Logged usage: 1,000 tokens ($0.0090) → <path>`
pub fn logged_usage_line(record: &UsageRecord, path: &Path) -> String {
    format!(
        "📊 Logged usage: {} tokens (${}) → {}",
        format_count(record.total_tokens()),
        format_currency(record.cost_usd),
        path.display()
    )
}

/// Reply of the "log this turn" tool.
pub fn estimate_reply(estimated_tokens: u64, logger: &UsageLogger) -> String {
    format!(
        "✅ Logged ~{} tokens. Session total: {} tokens (${})",
        estimated_tokens,
        format_count(logger.total_tokens()),
        format_currency(logger.total_cost())
    )
}

pub fn estimate_failure(err: &anyhow::Error) -> String {
    format!("⚠️ Failed to log usage: {err:#}")
}

pub fn print_logged_usage(record: &UsageRecord, logger: &UsageLogger) {
    println!("{}", logged_usage_line(record, logger.log_path()).green());
    println!(
        "{}",
        format!(
            "Session total: {} tokens (${})",
            format_count(logger.total_tokens()),
            format_currency(logger.total_cost())
        )
        .bright_black()
    );
}

pub fn print_estimate_reply(estimated_tokens: u64, logger: &UsageLogger) {
    println!("{}", estimate_reply(estimated_tokens, logger).bold());
}

pub fn print_estimate_failure(err: &anyhow::Error) {
    println!("{}", estimate_failure(err).yellow());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenUsage;
    use chrono::Utc;
    use std::path::PathBuf;

    #[test]
    fn logged_usage_line_shape() {
        let record = UsageRecord::new(
            "claude-sonnet-4-5",
            TokenUsage::new(600, 400),
            0.009,
            Utc::now(),
        );
        let line = logged_usage_line(&record, &PathBuf::from("/tmp/usage.jsonl"));
        assert_eq!(line, "📊 Logged usage: 1,000 tokens ($0.0090) → /tmp/usage.jsonl");
    }

    #[test]
    fn estimate_failure_includes_context() {
        let err = anyhow::anyhow!("disk full").context("append to usage log");
        assert_eq!(
            estimate_failure(&err),
            "⚠️ Failed to log usage: append to usage log: disk full"
        );
    }
}
