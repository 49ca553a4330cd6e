use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use std::path::PathBuf;

/// File name of the usage log under `~/.claude/projects`.
pub const USAGE_LOG_FILE: &str = "voice-agent.jsonl";

fn home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~"))
}

/// Default location of the usage log: `~/.claude/projects/voice-agent.jsonl`.
pub fn default_usage_log_path() -> PathBuf {
    home_dir().join(".claude").join("projects").join(USAGE_LOG_FILE)
}

/// Existing Claude `projects` directories, `~/.claude` first, then the XDG config dir.
pub fn claude_project_dirs() -> Vec<PathBuf> {
    let basedirs = directories::BaseDirs::new();
    let home = home_dir();
    let xdg_config = basedirs
        .as_ref()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| home.join(".config"));
    [home.join(".claude"), xdg_config.join("claude")]
        .into_iter()
        .map(|base| base.join("projects"))
        .filter(|p| p.is_dir())
        .collect()
}

/// `agent_config.json` under the platform config dir
/// (`~/Library/Application Support/capycoding` on macOS, `~/.config/capycoding` elsewhere).
pub fn agent_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| {
        b.config_dir()
            .join("capycoding")
            .join("agent_config.json")
    })
}

/// UTC instant as RFC 3339 with a `Z` suffix and microsecond precision.
pub fn format_utc(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time truncated to what [`format_utc`] can represent.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

pub fn format_currency(v: f64) -> String {
    format!("{v:.4}")
}

/// Thousands-separated integer (`12,345`).
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Serde adapter writing `DateTime<Utc>` through [`format_utc`].
pub mod utc_z {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_utc(*ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_utc(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_utc_has_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_utc(ts), "2025-01-02T03:04:05.000000Z");
        assert_eq!(parse_utc(&format_utc(ts)), Some(ts));
    }

    #[test]
    fn test_parse_utc_normalizes_offsets() {
        let parsed = parse_utc("2025-01-02T05:04:05+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap());
        assert!(parse_utc("yesterday").is_none());
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_default_log_path_shape() {
        let p = default_usage_log_path();
        assert!(p.ends_with(".claude/projects/voice-agent.jsonl"));
    }
}
