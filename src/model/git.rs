//! Git history records consumed by the prompt pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Commits listed in the prompt block
const PROMPT_COMMITS: usize = 10;
/// Fragile areas listed in the prompt block
const PROMPT_FRAGILE: usize = 5;

/// Commit author
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// A commit read from history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub author: Author,
    pub timestamp: DateTime<Utc>,
    /// Paths touched by this commit, relative to the repository root
    pub files_changed: Vec<String>,
}

impl Commit {
    pub fn short_sha(&self) -> &str {
        &self.sha[..self.sha.len().min(7)]
    }

    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }
}

/// A file that changes often or attracts many fixes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FragileArea {
    pub file_path: PathBuf,
    pub change_count: usize,
    pub bug_fix_count: usize,
    /// Risk in [0, 1]
    pub risk_score: f64,
}

/// Aggregate change patterns
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ChangePatterns {
    /// Most frequently changed files, most changes first
    pub frequently_changed: Vec<PathBuf>,
}

/// Everything read from a repository's history
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GitContext {
    pub repository_path: Option<PathBuf>,
    pub branch: Option<String>,
    /// Newest first
    pub recent_commits: Vec<Commit>,
    /// Highest risk first
    pub fragile_areas: Vec<FragileArea>,
    pub change_patterns: ChangePatterns,
}

impl GitContext {
    pub fn has_recent_activity(&self) -> bool {
        !self.recent_commits.is_empty()
    }

    /// Plain-text rendering for prompt inclusion; empty when there is nothing to say
    pub fn to_prompt_block(&self) -> String {
        let mut out = String::new();

        if let Some(ref branch) = self.branch {
            out.push_str(&format!("Branch: {}\n", branch));
        }

        if !self.recent_commits.is_empty() {
            out.push_str("Recent commits:\n");
            for commit in self.recent_commits.iter().take(PROMPT_COMMITS) {
                out.push_str(&format!(
                    "- {} {} ({}): {}",
                    commit.short_sha(),
                    commit.timestamp.format("%Y-%m-%d"),
                    commit.author.name,
                    commit.summary()
                ));
                if !commit.files_changed.is_empty() {
                    out.push_str(&format!(" [{}]", commit.files_changed.join(", ")));
                }
                out.push('\n');
            }
        }

        if !self.fragile_areas.is_empty() {
            out.push_str("Fragile areas:\n");
            for area in self.fragile_areas.iter().take(PROMPT_FRAGILE) {
                out.push_str(&format!(
                    "- {} (changes: {}, bug fixes: {}, risk: {:.2})\n",
                    area.file_path.display(),
                    area.change_count,
                    area.bug_fix_count,
                    area.risk_score
                ));
            }
        }

        if !self.change_patterns.frequently_changed.is_empty() {
            let files: Vec<String> = self
                .change_patterns
                .frequently_changed
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            out.push_str(&format!("Frequently changed: {}\n", files.join(", ")));
        }

        out.trim_end().to_string()
    }
}
