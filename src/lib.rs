//! # Voice Usage
//!
//! Usage accounting and codebase tools for a voice-driven coding assistant.
//!
//! ## Overview
//!
//! The speech and LLM side of the assistant lives elsewhere. This library covers:
//! - Appending one JSON-Lines usage record per completed model call, with cost
//! - Aggregating a window of usage entries into burn-rate metrics
//! - Filesystem inspection tools handed to the model (read, search, list, project info)
//! - Layered agent configuration
//!
//! ## Features
//!
//! - `colors` (default): Enables terminal color output via owo-colors

/// Command-line argument parsing
pub mod cli;

/// Layered agent configuration
pub mod config;

/// Human-readable output for the CLI
pub mod display;

/// Error types for metrics and workspace tools
pub mod error;

/// Usage log writer with per-session running totals
pub mod logger;

/// Window aggregation into burn-rate summaries
pub mod metrics;

/// Data models for usage records, entries and summaries
pub mod models;

/// Model-specific pricing calculations
pub mod pricing;

/// Usage entry reader over JSON-Lines files
pub mod reader;

/// Utility functions for paths, formatting, and time
pub mod utils;

/// Workspace inspection tools
pub mod workspace;
