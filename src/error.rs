use std::path::PathBuf;

use thiserror::Error;

/// Failures of the metrics aggregator and its usage reader.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid CLAUDE_METRICS_CONFIG: {0}")]
    InvalidConfig(String),

    #[error("hours_back must be an integer: {0}")]
    InvalidHoursBack(String),

    #[error("usage data directory unavailable: {}", .0.display())]
    ReaderUnavailable(PathBuf),

    #[error("failed to read usage data: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid metrics summary: {0}")]
    InvalidSummary(&'static str),
}

/// Failures of the workspace inspection tools. The `Display` text is what the
/// assistant hands back to the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Error: File '{0}' not found")]
    FileNotFound(String),

    #[error("Error: '{0}' is not a file")]
    NotAFile(String),

    #[error("Error: Directory '{0}' not found")]
    DirectoryNotFound(String),

    #[error("Error: '{0}' is not a directory")]
    NotADirectory(String),

    #[error("Error: '{0}' is outside the workspace")]
    OutsideWorkspace(String),

    #[error("Error reading '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error searching: {0}")]
    Search(String),
}
