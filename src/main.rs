use anyhow::{Context, Result};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use voice_usage::cli::{Args, Command};
use voice_usage::config::{AgentConfig, ConfigOverrides};
use voice_usage::display::{print_estimate_failure, print_estimate_reply, print_logged_usage};
use voice_usage::logger::UsageLogger;
use voice_usage::metrics::{MetricsConfig, collect, to_json_line};
use voice_usage::models::TokenUsage;
use voice_usage::reader::JsonlUsageReader;
use voice_usage::utils::now_utc;
use voice_usage::workspace::Workspace;
use voice_usage::workspace::search::RegexSearch;

fn main() -> ExitCode {
    let args = Args::parse();

    // stdout carries command output only; logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn agent_config(args: &Args) -> Result<AgentConfig> {
    let overrides = ConfigOverrides {
        config_file: args.config.clone(),
        dotenv_file: None,
        codebase_path: args.workspace.clone(),
        usage_log_path: args.log_path.clone(),
    };
    let config = AgentConfig::load(&overrides).context("load agent configuration")?;
    tracing::debug!(workspace = %config.codebase_path.display(), "configuration loaded");
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    match &args.command {
        // The aggregator needs no agent configuration.
        Command::Metrics { config_json } => {
            let config = MetricsConfig::from_json(config_json.as_deref())?;
            let summary = collect(&config, &JsonlUsageReader::default(), now_utc())?;
            println!("{}", to_json_line(&summary)?);
        }
        Command::Log {
            model,
            input_tokens,
            output_tokens,
            cache_creation_tokens,
            cache_read_tokens,
            json,
        } => {
            let config = agent_config(&args)?;
            let mut logger = UsageLogger::with_path(&config.usage_log_path)?;
            let usage = TokenUsage::new(*input_tokens, *output_tokens)
                .with_cache(*cache_creation_tokens, *cache_read_tokens);
            let record = logger.log_usage(model, usage)?;
            if *json {
                println!("{}", serde_json::to_string(&record)?);
            } else {
                print_logged_usage(&record, &logger);
            }
        }
        Command::LogTurn { estimated_tokens } => {
            let config = agent_config(&args)?;
            // Best-effort: a failed write never fails the turn.
            let logged = UsageLogger::with_path(&config.usage_log_path)
                .and_then(|mut logger| logger.log_estimate(*estimated_tokens).map(|_| logger));
            match logged {
                Ok(logger) => print_estimate_reply(*estimated_tokens, &logger),
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "usage logging failed");
                    print_estimate_failure(&e);
                }
            }
        }
        Command::ReadFile { path } => {
            let ws = Workspace::new(agent_config(&args)?.codebase_path);
            println!("{}", ws.read_file(path).unwrap_or_else(|e| e.to_string()));
        }
        Command::Search { query } => {
            let config = agent_config(&args)?;
            let ws = Workspace::new(&config.codebase_path);
            let search = RegexSearch::new(config.search_timeout, config.search_max_results);
            println!("{}", ws.search_code(&search, query));
        }
        Command::List { directory } => {
            let ws = Workspace::new(agent_config(&args)?.codebase_path);
            println!("{}", ws.list_files(directory).unwrap_or_else(|e| e.to_string()));
        }
        Command::ProjectInfo => {
            let ws = Workspace::new(agent_config(&args)?.codebase_path);
            println!("{}", ws.project_info());
        }
    }
    Ok(())
}
