//! Literal text search over a directory tree.
//!
//! [`CodeSearch`] is the seam; [`RegexSearch`] walks the tree in-process with a
//! deadline and a cap on the matches kept.

use regex::{Regex, RegexBuilder};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::{DirEntry, WalkDir};

use crate::config::{DEFAULT_SEARCH_MAX_RESULTS, DEFAULT_SEARCH_TIMEOUT_MS};
use crate::error::ToolError;
use crate::workspace::IGNORED_NAMES;

/// Extensions searched when the caller does not narrow them.
pub const DEFAULT_EXTENSIONS: &[&str] = &["py", "rs", "svelte", "ts", "js", "json"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchMatch {
    pub path: PathBuf,
    pub line_number: usize,
    pub line: String,
}

#[derive(Clone, Debug, Default)]
pub struct SearchOutcome {
    /// First `max_results` matches in walk order.
    pub matches: Vec<SearchMatch>,
    /// Every match seen, including those past the cap.
    pub total_matches: usize,
    pub timed_out: bool,
}

impl SearchOutcome {
    pub fn omitted(&self) -> usize {
        self.total_matches.saturating_sub(self.matches.len())
    }
}

pub trait CodeSearch {
    fn search(
        &self,
        query: &str,
        roots: &[PathBuf],
        extensions: &[String],
    ) -> Result<SearchOutcome, ToolError>;
}

/// Case-insensitive literal search.
#[derive(Clone, Debug)]
pub struct RegexSearch {
    pub timeout: Duration,
    pub max_results: usize,
}

impl Default for RegexSearch {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_SEARCH_TIMEOUT_MS),
            max_results: DEFAULT_SEARCH_MAX_RESULTS,
        }
    }
}

impl RegexSearch {
    pub fn new(timeout: Duration, max_results: usize) -> Self {
        Self {
            timeout,
            max_results,
        }
    }
}

/// Lines scanned between deadline checks inside one file.
const DEADLINE_CHECK_LINES: usize = 1024;

#[derive(Clone, Copy, Debug)]
struct Deadline(Option<Instant>);

impl Deadline {
    /// A timeout too large to represent never expires.
    fn after(timeout: Duration) -> Self {
        Self(Instant::now().checked_add(timeout))
    }

    fn expired(&self) -> bool {
        self.0.is_some_and(|d| Instant::now() >= d)
    }
}

fn is_ignored(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|n| IGNORED_NAMES.contains(&n))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

impl CodeSearch for RegexSearch {
    fn search(
        &self,
        query: &str,
        roots: &[PathBuf],
        extensions: &[String],
    ) -> Result<SearchOutcome, ToolError> {
        let pattern: Regex = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .map_err(|e| ToolError::Search(e.to_string()))?;
        let deadline = Deadline::after(self.timeout);
        let mut outcome = SearchOutcome::default();

        for root in roots {
            let walker = WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !is_ignored(e));
            for entry in walker.flatten() {
                if deadline.expired() {
                    outcome.timed_out = true;
                    return Ok(outcome);
                }
                if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
                    continue;
                }
                let Ok(file) = File::open(entry.path()) else {
                    continue;
                };
                self.scan(entry.path(), BufReader::new(file), &pattern, deadline, &mut outcome);
                if outcome.timed_out {
                    return Ok(outcome);
                }
            }
        }
        Ok(outcome)
    }
}

impl RegexSearch {
    fn scan(
        &self,
        path: &Path,
        reader: impl BufRead,
        pattern: &Regex,
        deadline: Deadline,
        outcome: &mut SearchOutcome,
    ) {
        // Non-UTF-8 lines end the file, as binary content would.
        for (idx, line) in reader.lines().map_while(Result::ok).enumerate() {
            if idx % DEADLINE_CHECK_LINES == 0 && deadline.expired() {
                outcome.timed_out = true;
                return;
            }
            if !pattern.is_match(&line) {
                continue;
            }
            outcome.total_matches += 1;
            if outcome.matches.len() < self.max_results {
                outcome.matches.push(SearchMatch {
                    path: path.to_path_buf(),
                    line_number: idx + 1,
                    line,
                });
            }
        }
    }
}
