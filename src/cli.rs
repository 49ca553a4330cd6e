use std::path::PathBuf;

use crate::logger::DEFAULT_ESTIMATED_TOKENS;
use crate::pricing::DEFAULT_MODEL;

#[derive(clap::Parser, Debug)]
#[command(name = "voice_usage", version, about = "Usage accounting and codebase tools for the voice agent")]
pub struct Args {
    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Debug mode: same as -vv
    #[arg(long, env = "CLAUDE_DEBUG", global = true)]
    pub debug: bool,

    /// Agent config file (defaults to <config dir>/capycoding/agent_config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Workspace root for the tool commands (overrides config)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Usage log file (overrides config; default ~/.claude/projects/voice-agent.jsonl)
    #[arg(long, global = true)]
    pub log_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Aggregate a usage window into one JSON summary on stdout
    Metrics {
        /// JSON object with optional `data_dir` and `hours_back`
        #[arg(long = "config-json", env = "CLAUDE_METRICS_CONFIG")]
        config_json: Option<String>,
    },

    /// Append one usage record to the log
    Log {
        /// Model identifier used for pricing
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,

        #[arg(long, default_value_t = 0)]
        input_tokens: u64,

        #[arg(long, default_value_t = 0)]
        output_tokens: u64,

        #[arg(long, default_value_t = 0)]
        cache_creation_tokens: u64,

        #[arg(long, default_value_t = 0)]
        cache_read_tokens: u64,

        /// Print the written record as JSON instead of a summary line
        #[arg(long)]
        json: bool,
    },

    /// Log a rough estimate for one conversation turn (60% input / 40% output)
    LogTurn {
        #[arg(default_value_t = DEFAULT_ESTIMATED_TOKENS)]
        estimated_tokens: u64,
    },

    /// Print a workspace file (first 500 lines)
    ReadFile { path: String },

    /// Case-insensitive literal search across code files
    Search { query: String },

    /// List a workspace directory
    List {
        #[arg(default_value = ".")]
        directory: String,
    },

    /// Show detected project type and available tools
    ProjectInfo,
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }

    /// Log filter directive derived from `-v` / `--debug`.
    pub fn log_filter(&self) -> &'static str {
        let level = if self.debug { self.verbose.max(2) } else { self.verbose };
        match level {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parses_log_subcommand() {
        let args = Args::try_parse_from([
            "voice_usage",
            "log",
            "--input-tokens",
            "10",
            "--output-tokens",
            "5",
        ])
        .unwrap();
        match args.command {
            Command::Log {
                model,
                input_tokens,
                output_tokens,
                cache_read_tokens,
                ..
            } => {
                assert_eq!(model, DEFAULT_MODEL);
                assert_eq!(input_tokens, 10);
                assert_eq!(output_tokens, 5);
                assert_eq!(cache_read_tokens, 0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn verbosity_mapping() {
        let args = Args::try_parse_from(["voice_usage", "-vvv", "project-info"]).unwrap();
        assert_eq!(args.log_filter(), "trace");
        let args = Args::try_parse_from(["voice_usage", "--debug", "project-info"]).unwrap();
        assert_eq!(args.log_filter(), "debug");
    }

    #[test]
    fn log_turn_defaults_estimate() {
        let args = Args::try_parse_from(["voice_usage", "log-turn"]).unwrap();
        assert!(matches!(
            args.command,
            Command::LogTurn { estimated_tokens: DEFAULT_ESTIMATED_TOKENS }
        ));
    }
}
