//! # Config Module
//!
//! Layered agent configuration, later layers win:
//!
//! 1. built-in defaults
//! 2. `agent_config.json` in the platform config directory
//! 3. `.env` in the current directory (read, never exported)
//! 4. process environment
//! 5. explicit overrides (command-line flags)
//!
//! The result is one immutable [`AgentConfig`]; loading never mutates the
//! process environment.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::{agent_config_path, default_usage_log_path};

pub const DEFAULT_SEARCH_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_SEARCH_MAX_RESULTS: usize = 50;

/// On-disk schema of `agent_config.json`. All fields optional.
#[derive(Debug, Default, Deserialize)]
pub struct AgentConfigFile {
    pub livekit_url: Option<String>,
    pub livekit_api_key: Option<String>,
    pub livekit_api_secret: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub codebase_path: Option<String>,
    pub usage_log_path: Option<String>,
    pub search_timeout_ms: Option<u64>,
    pub search_max_results: Option<usize>,
}

/// Values supplied explicitly by the caller; they beat every other layer.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub dotenv_file: Option<PathBuf>,
    pub codebase_path: Option<PathBuf>,
    pub usage_log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub livekit_url: Option<String>,
    pub livekit_api_key: Option<String>,
    pub livekit_api_secret: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub codebase_path: PathBuf,
    pub usage_log_path: PathBuf,
    pub search_timeout: Duration,
    pub search_max_results: usize,
}

impl AgentConfig {
    /// Defaults only: workspace is the current directory.
    pub fn defaults() -> Result<Self> {
        let cwd = std::env::current_dir().context("resolve current directory")?;
        Ok(Self::defaults_in(cwd))
    }

    fn defaults_in(cwd: PathBuf) -> Self {
        Self {
            livekit_url: None,
            livekit_api_key: None,
            livekit_api_secret: None,
            anthropic_api_key: None,
            codebase_path: cwd,
            usage_log_path: default_usage_log_path(),
            search_timeout: Duration::from_millis(DEFAULT_SEARCH_TIMEOUT_MS),
            search_max_results: DEFAULT_SEARCH_MAX_RESULTS,
        }
    }

    /// Resolve every layer against the real process environment.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let file = match overrides.config_file.clone().or_else(agent_config_path) {
            Some(path) => load_config_file(&path),
            None => AgentConfigFile::default(),
        };
        let dotenv_path = overrides
            .dotenv_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(".env"));
        let dotenv = read_dotenv(&dotenv_path);
        let env: HashMap<String, String> = std::env::vars().collect();

        let mut cfg = Self::defaults()?;
        cfg.apply_file(file);
        cfg.apply_vars(&dotenv);
        cfg.apply_vars(&env);
        cfg.apply_overrides(overrides);
        Ok(cfg)
    }

    fn apply_file(&mut self, f: AgentConfigFile) {
        set_opt(&mut self.livekit_url, f.livekit_url);
        set_opt(&mut self.livekit_api_key, f.livekit_api_key);
        set_opt(&mut self.livekit_api_secret, f.livekit_api_secret);
        set_opt(&mut self.anthropic_api_key, f.anthropic_api_key);
        if let Some(p) = f.codebase_path.filter(|p| !p.trim().is_empty()) {
            tracing::info!(path = %p, "using codebase path from config");
            self.codebase_path = PathBuf::from(p);
        }
        if let Some(p) = f.usage_log_path.filter(|p| !p.trim().is_empty()) {
            self.usage_log_path = PathBuf::from(p);
        }
        if let Some(ms) = f.search_timeout_ms {
            self.search_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = f.search_max_results {
            self.search_max_results = n;
        }
    }

    fn apply_vars(&mut self, vars: &HashMap<String, String>) {
        let get = |k: &str| vars.get(k).filter(|v| !v.trim().is_empty()).cloned();
        set_opt(&mut self.livekit_url, get("LIVEKIT_URL"));
        set_opt(&mut self.livekit_api_key, get("LIVEKIT_API_KEY"));
        set_opt(&mut self.livekit_api_secret, get("LIVEKIT_API_SECRET"));
        set_opt(&mut self.anthropic_api_key, get("ANTHROPIC_API_KEY"));
        if let Some(p) = get("VOICE_AGENT_CODEBASE_PATH") {
            self.codebase_path = PathBuf::from(p);
        }
        if let Some(p) = get("VOICE_AGENT_USAGE_LOG") {
            self.usage_log_path = PathBuf::from(p);
        }
        match get("VOICE_AGENT_SEARCH_TIMEOUT_MS").map(|s| s.trim().parse::<u64>()) {
            Some(Ok(ms)) => self.search_timeout = Duration::from_millis(ms),
            Some(Err(e)) => tracing::warn!(error = %e, "ignoring VOICE_AGENT_SEARCH_TIMEOUT_MS"),
            None => {}
        }
        match get("VOICE_AGENT_SEARCH_MAX_RESULTS").map(|s| s.trim().parse::<usize>()) {
            Some(Ok(n)) => self.search_max_results = n,
            Some(Err(e)) => tracing::warn!(error = %e, "ignoring VOICE_AGENT_SEARCH_MAX_RESULTS"),
            None => {}
        }
    }

    fn apply_overrides(&mut self, o: &ConfigOverrides) {
        if let Some(p) = &o.codebase_path {
            self.codebase_path = p.clone();
        }
        if let Some(p) = &o.usage_log_path {
            self.usage_log_path = p.clone();
        }
    }
}

fn set_opt(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Read `agent_config.json`; a missing or broken file yields defaults.
pub fn load_config_file(path: &Path) -> AgentConfigFile {
    if !path.exists() {
        return AgentConfigFile::default();
    }
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded agent config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "could not parse config file, using defaults"
                );
                AgentConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read config file");
            AgentConfigFile::default()
        }
    }
}

fn read_dotenv(path: &Path) -> HashMap<String, String> {
    match dotenvy::from_path_iter(path) {
        Ok(iter) => iter
            .filter_map(|item| match item {
                Ok(pair) => Some(pair),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping .env line");
                    None
                }
            })
            .collect(),
        Err(_) => HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn file_layer_sets_codebase_and_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent_config.json");
        std::fs::write(
            &path,
            r#"{"livekit_url":"wss://example","anthropic_api_key":"sk-file","codebase_path":"/srv/code"}"#,
        )
        .unwrap();
        let mut cfg = AgentConfig::defaults_in(PathBuf::from("/cwd"));
        cfg.apply_file(load_config_file(&path));
        assert_eq!(cfg.livekit_url.as_deref(), Some("wss://example"));
        assert_eq!(cfg.anthropic_api_key.as_deref(), Some("sk-file"));
        assert_eq!(cfg.codebase_path, PathBuf::from("/srv/code"));
    }

    #[test]
    fn empty_codebase_path_keeps_cwd() {
        let mut cfg = AgentConfig::defaults_in(PathBuf::from("/cwd"));
        cfg.apply_file(AgentConfigFile {
            codebase_path: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(cfg.codebase_path, PathBuf::from("/cwd"));
    }

    #[test]
    fn env_beats_file_and_overrides_beat_env() {
        let mut cfg = AgentConfig::defaults_in(PathBuf::from("/cwd"));
        cfg.apply_file(AgentConfigFile {
            anthropic_api_key: Some("sk-file".into()),
            codebase_path: Some("/from/file".into()),
            ..Default::default()
        });
        cfg.apply_vars(&vars(&[
            ("ANTHROPIC_API_KEY", "sk-env"),
            ("VOICE_AGENT_CODEBASE_PATH", "/from/env"),
            ("VOICE_AGENT_SEARCH_MAX_RESULTS", "10"),
            ("VOICE_AGENT_SEARCH_TIMEOUT_MS", "not-a-number"),
        ]));
        assert_eq!(cfg.anthropic_api_key.as_deref(), Some("sk-env"));
        assert_eq!(cfg.codebase_path, PathBuf::from("/from/env"));
        assert_eq!(cfg.search_max_results, 10);
        assert_eq!(cfg.search_timeout, Duration::from_millis(DEFAULT_SEARCH_TIMEOUT_MS));

        cfg.apply_overrides(&ConfigOverrides {
            codebase_path: Some(PathBuf::from("/from/flag")),
            ..Default::default()
        });
        assert_eq!(cfg.codebase_path, PathBuf::from("/from/flag"));
    }

    #[test]
    fn broken_config_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent_config.json");
        std::fs::write(&path, "{ nope").unwrap();
        let f = load_config_file(&path);
        assert!(f.livekit_url.is_none());
        assert!(load_config_file(&dir.path().join("missing.json")).codebase_path.is_none());
    }

    #[test]
    fn dotenv_is_read_without_exporting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "LIVEKIT_API_SECRET=from-dotenv-only\n").unwrap();
        let parsed = read_dotenv(&path);
        assert_eq!(
            parsed.get("LIVEKIT_API_SECRET").map(String::as_str),
            Some("from-dotenv-only")
        );
        assert_ne!(
            std::env::var("LIVEKIT_API_SECRET").ok().as_deref(),
            Some("from-dotenv-only")
        );
        assert!(read_dotenv(&dir.path().join("absent.env")).is_empty());
    }
}
