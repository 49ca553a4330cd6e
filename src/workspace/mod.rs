//! # Workspace Module
//!
//! Filesystem inspection tools the voice assistant exposes to the model. Each
//! tool returns the text handed back to the model; failures render through
//! [`ToolError`]'s `Display`.

pub mod search;

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::ToolError;
use search::{CodeSearch, DEFAULT_EXTENSIONS, SearchOutcome};

/// Files beyond this many lines are truncated by [`Workspace::read_file`].
pub const MAX_READ_LINES: usize = 500;

/// Entry names hidden from listings and skipped by search.
pub const IGNORED_NAMES: &[&str] = &[
    ".git",
    "__pycache__",
    "node_modules",
    "target",
    "dist",
    "build",
    ".venv",
    "env",
];

#[derive(Clone, Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join `rel` onto the root, refusing anything that climbs out of it.
    fn resolve(&self, rel: &str) -> Result<PathBuf, ToolError> {
        let rel_path = Path::new(rel);
        let escapes = rel_path.components().any(|c| {
            matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_))
        });
        if escapes {
            return Err(ToolError::OutsideWorkspace(rel.to_string()));
        }
        Ok(self.root.join(rel_path))
    }

    /// Contents of a file relative to the root, truncated to [`MAX_READ_LINES`].
    pub fn read_file(&self, rel: &str) -> Result<String, ToolError> {
        let full = self.resolve(rel)?;
        if !full.exists() {
            return Err(ToolError::FileNotFound(rel.to_string()));
        }
        if !full.is_file() {
            return Err(ToolError::NotAFile(rel.to_string()));
        }
        let content = fs::read_to_string(&full).map_err(|source| ToolError::Io {
            path: rel.to_string(),
            source,
        })?;
        Ok(format!("Contents of {rel}:\n\n{}", truncate_lines(&content, MAX_READ_LINES)))
    }

    /// Sorted listing of `rel` (`"."` for the root), hiding dot-entries and build output.
    pub fn list_files(&self, rel: &str) -> Result<String, ToolError> {
        let full = self.resolve(rel)?;
        if !full.exists() {
            return Err(ToolError::DirectoryNotFound(rel.to_string()));
        }
        if !full.is_dir() {
            return Err(ToolError::NotADirectory(rel.to_string()));
        }
        let read = fs::read_dir(&full).map_err(|source| ToolError::Io {
            path: rel.to_string(),
            source,
        })?;
        let mut names: Vec<(String, bool)> = read
            .flatten()
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().into_owned();
                if name.starts_with('.') || IGNORED_NAMES.contains(&name.as_str()) {
                    return None;
                }
                let is_dir = e.path().is_dir();
                Some((name, is_dir))
            })
            .collect();
        if names.is_empty() {
            return Ok(format!("Directory '{rel}' is empty"));
        }
        names.sort();
        let items: Vec<String> = names
            .into_iter()
            .map(|(name, is_dir)| {
                if is_dir {
                    format!("📁 {name}/")
                } else {
                    format!("📄 {name}")
                }
            })
            .collect();
        Ok(format!("Contents of {rel}:\n\n{}", items.join("\n")))
    }

    /// Literal search across the workspace with the default extensions.
    pub fn search_code(&self, search: &dyn CodeSearch, query: &str) -> String {
        let extensions: Vec<String> = DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect();
        match search.search(query, std::slice::from_ref(&self.root), &extensions) {
            Ok(outcome) => render_search(query, &outcome),
            Err(e) => e.to_string(),
        }
    }

    pub fn project_info(&self) -> ProjectInfo {
        let has = |name: &str| self.root.join(name).exists();
        let mut detected = Vec::new();
        if has("package.json") {
            detected.push("Node.js/npm");
        }
        if has("Cargo.toml") {
            detected.push("Rust");
        }
        if has("pyproject.toml") || has("setup.py") {
            detected.push("Python");
        }
        if has("go.mod") {
            detected.push("Go");
        }
        if has(".git") {
            detected.push("Git repository");
        }
        ProjectInfo {
            location: self.root.clone(),
            detected,
        }
    }
}

fn truncate_lines(content: &str, max: usize) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    if lines.len() <= max {
        return content.to_string();
    }
    format!(
        "{}\n... (truncated, {} more lines)",
        lines[..max].join("\n"),
        lines.len() - max
    )
}

/// grep-style rendering: `path:line:text`.
pub fn render_search(query: &str, outcome: &SearchOutcome) -> String {
    if outcome.timed_out {
        return "Search timed out".to_string();
    }
    if outcome.matches.is_empty() {
        return format!("No matches found for '{query}'");
    }
    let mut out: Vec<String> = outcome
        .matches
        .iter()
        .map(|m| format!("{}:{}:{}", m.path.display(), m.line_number, m.line))
        .collect();
    if outcome.omitted() > 0 {
        out.push(format!("... ({} more matches)", outcome.omitted()));
    }
    format!("Search results for '{query}':\n\n{}", out.join("\n"))
}

/// Detected project markers for the workspace root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectInfo {
    pub location: PathBuf,
    pub detected: Vec<&'static str>,
}

impl fmt::Display for ProjectInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let detected = if self.detected.is_empty() {
            "Generic project".to_string()
        } else {
            self.detected.join(", ")
        };
        writeln!(f, "Project Workspace")?;
        writeln!(f, "Location: {}", self.location.display())?;
        writeln!(f, "Detected: {detected}")?;
        writeln!(f)?;
        writeln!(f, "I can help you understand and work with this codebase:")?;
        writeln!(f, "- read_file(path): Read any file in the project")?;
        writeln!(f, "- search_code(query): Search for text across all code files")?;
        writeln!(
            f,
            "- list_files(directory): List files in any directory (use \".\" for root)"
        )?;
        writeln!(
            f,
            "- log_conversation_usage(tokens): Log Claude API usage for metrics"
        )?;
        writeln!(f)?;
        write!(
            f,
            "Ask me to read specific files, search for functions, or explore the project structure!"
        )
    }
}
