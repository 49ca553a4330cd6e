use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

use voice_usage::logger::UsageLogger;
use voice_usage::models::{TokenUsage, UsageRecord};
use voice_usage::pricing::{DEFAULT_MODEL, PriceTable};

fn logger(dir: &TempDir) -> UsageLogger {
    UsageLogger::with_path(dir.path().join("projects/voice-agent.jsonl"))
        .unwrap()
        .with_prices(PriceTable::default())
}

#[test]
fn appends_one_parseable_line_per_call_in_order() {
    let dir = TempDir::new().unwrap();
    let mut logger = logger(&dir);
    let models = ["claude-sonnet-4-5", "claude-3-5-sonnet", "not-in-table", "x"];
    for (i, model) in models.iter().enumerate() {
        logger
            .log_usage(model, TokenUsage::new(100 * (i as u64 + 1), 10))
            .unwrap();
    }

    let content = fs::read_to_string(logger.log_path()).unwrap();
    assert!(content.ends_with('\n'));
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), models.len());
    for (i, line) in lines.iter().enumerate() {
        let v: Value = serde_json::from_str(line).unwrap();
        assert_eq!(v["model"], models[i]);
        assert_eq!(v["input_tokens"], 100 * (i as u64 + 1));
        assert!(v["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}

#[test]
fn records_round_trip_through_the_file() {
    let dir = TempDir::new().unwrap();
    let mut logger = logger(&dir);
    let ts = Utc.with_ymd_and_hms(2025, 9, 30, 23, 59, 58).unwrap();
    let written = logger
        .log_usage_at(
            "claude-3-5-sonnet-20241022",
            TokenUsage::new(1234, 567).with_cache(89, 10),
            ts,
        )
        .unwrap();
    let live = logger.log_usage(DEFAULT_MODEL, TokenUsage::new(1, 2)).unwrap();

    let content = fs::read_to_string(logger.log_path()).unwrap();
    let parsed: Vec<UsageRecord> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(parsed, vec![written, live]);
    assert_eq!(parsed[0].timestamp, ts);
    assert_eq!(parsed[0].source, "voice-agent");
}

#[test]
fn cost_matches_price_formula_and_default_fallback() {
    let dir = TempDir::new().unwrap();
    let mut logger = logger(&dir);
    let prices = PriceTable::default();
    for (input, output) in [(0u64, 0u64), (1, 1), (999_999, 3), (2_500_000, 1_200_000)] {
        let rec = logger.log_usage("some-unknown-model", TokenUsage::new(input, output)).unwrap();
        let price = prices.price_for(DEFAULT_MODEL);
        let expected = input as f64 / 1e6 * price.input + output as f64 / 1e6 * price.output;
        assert!((rec.cost_usd - expected).abs() < 1e-12);

        let default = logger.log_usage(DEFAULT_MODEL, TokenUsage::new(input, output)).unwrap();
        assert_eq!(rec.cost_usd, default.cost_usd);
    }
}
