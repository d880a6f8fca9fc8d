//! Git history - recent commits, fragile files and past fixes
//!
//! Read-only: nothing here writes to the repository.

use crate::Result;
use crate::model::{Author, ChangePatterns, ClassifiedError, Commit, FragileArea, GitContext};
use chrono::{DateTime, Utc};
use git2::{Repository, Sort};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

/// Commits kept in the context as "recent"
const RECENT_COMMITS: usize = 20;
/// Fragile areas kept in the context
const MAX_FRAGILE_AREAS: usize = 20;
/// Files listed as frequently changed
const MAX_FREQUENT_FILES: usize = 10;
/// Areas at or below this risk are not reported
const FRAGILE_THRESHOLD: f64 = 0.3;
/// Change count at which the churn factor saturates
const CHURN_SATURATION: f64 = 50.0;
const BUG_RATIO_WEIGHT: f64 = 0.6;
const CHURN_WEIGHT: f64 = 0.4;
/// Commits searched for similar past fixes
const FIX_SEARCH_DEPTH: usize = 200;

static BUG_FIX_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(?i)\bfix(es|ed)?\b", r"(?i)\bbug\b", r"(?i)\bresolve[ds]?\b", r"(?i)\bpatch\b"]
        .into_iter()
        .map(|p| Regex::new(p).expect("valid bug-fix pattern"))
        .collect()
});

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word pattern"));

const STOPWORDS: &[&str] = &["the", "a", "an", "is", "was", "are", "in", "on", "at"];

/// Reads history from one repository
pub struct HistoryAnalyzer {
    repo: Repository,
    history_limit: usize,
}

impl HistoryAnalyzer {
    /// Open the repository containing `path`
    pub fn open(path: impl AsRef<Path>, history_limit: usize) -> Result<Self> {
        let repo = Repository::discover(path.as_ref())?;
        debug!(path = ?repo.workdir(), "Opened repository");
        Ok(Self { repo, history_limit })
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Current branch name, if HEAD points at one
    pub fn branch(&self) -> Option<String> {
        self.repo.head().ok()?.shorthand().map(String::from)
    }

    /// Up to `limit` commits reachable from HEAD, newest first
    pub fn commit_history(&self, limit: usize) -> Result<Vec<Commit>> {
        if self.repo.is_empty()? {
            return Ok(Vec::new());
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push_head()?;

        let mut commits = Vec::new();
        for oid in revwalk.take(limit) {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(self.to_commit(&commit)?);
        }
        Ok(commits)
    }

    /// Files with many changes or a high share of fix commits
    pub fn identify_fragile_areas(&self, commits: &[Commit]) -> Vec<FragileArea> {
        let mut changes: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for commit in commits {
            let fix = is_bug_fix(commit);
            for file in &commit.files_changed {
                let entry = changes.entry(file.as_str()).or_default();
                entry.0 += 1;
                if fix {
                    entry.1 += 1;
                }
            }
        }

        let mut areas: Vec<FragileArea> = changes
            .into_iter()
            .map(|(file, (change_count, bug_fix_count))| FragileArea {
                file_path: PathBuf::from(file),
                change_count,
                bug_fix_count,
                risk_score: risk_score(change_count, bug_fix_count),
            })
            .filter(|area| area.risk_score > FRAGILE_THRESHOLD)
            .collect();

        areas.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
        areas.truncate(MAX_FRAGILE_AREAS);
        areas
    }

    pub fn change_patterns(&self, commits: &[Commit]) -> ChangePatterns {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for file in commits.iter().flat_map(|c| &c.files_changed) {
            *counts.entry(file.as_str()).or_default() += 1;
        }

        let mut ordered: Vec<(&str, usize)> = counts.into_iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1));

        ChangePatterns {
            frequently_changed: ordered
                .into_iter()
                .take(MAX_FREQUENT_FILES)
                .map(|(file, _)| PathBuf::from(file))
                .collect(),
        }
    }

    /// Fix commits whose messages share the most keywords with the error
    pub fn find_similar_past_fixes(&self, error: &ClassifiedError, limit: usize) -> Result<Vec<Commit>> {
        let keywords = extract_keywords(&error.raw_message);
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(Commit, usize)> = self
            .commit_history(FIX_SEARCH_DEPTH)?
            .into_iter()
            .filter(is_bug_fix)
            .filter_map(|commit| {
                let message = commit.message.to_lowercase();
                let score = keywords.iter().filter(|k| message.contains(k.as_str())).count();
                (score > 0).then_some((commit, score))
            })
            .collect();

        scored.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(scored.into_iter().take(limit).map(|(commit, _)| commit).collect())
    }

    /// Everything the prompt pipeline uses, from one history read
    pub fn build_context(&self) -> Result<GitContext> {
        let commits = self.commit_history(self.history_limit)?;
        let fragile_areas = self.identify_fragile_areas(&commits);
        let change_patterns = self.change_patterns(&commits);

        info!(
            commits = commits.len(),
            fragile = fragile_areas.len(),
            "Built git context"
        );

        Ok(GitContext {
            repository_path: self.workdir().map(Path::to_path_buf),
            branch: self.branch(),
            recent_commits: commits.into_iter().take(RECENT_COMMITS).collect(),
            fragile_areas,
            change_patterns,
        })
    }

    fn to_commit(&self, commit: &git2::Commit<'_>) -> Result<Commit> {
        let author = commit.author();
        Ok(Commit {
            sha: commit.id().to_string(),
            message: commit.message().unwrap_or("").to_string(),
            author: Author {
                name: author.name().unwrap_or("").to_string(),
                email: author.email().unwrap_or("").to_string(),
            },
            timestamp: DateTime::<Utc>::from_timestamp(commit.time().seconds(), 0).unwrap_or_default(),
            files_changed: self.files_changed(commit)?,
        })
    }

    /// Paths touched relative to the first parent (or the empty tree)
    fn files_changed(&self, commit: &git2::Commit<'_>) -> Result<Vec<String>> {
        let tree = commit.tree()?;
        let parent_tree = match commit.parent(0) {
            Ok(parent) => Some(parent.tree()?),
            Err(_) => None,
        };

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        Ok(diff
            .deltas()
            .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
            .map(|path| path.to_string_lossy().into_owned())
            .collect())
    }
}

/// Whether the message looks like a bug fix
pub fn is_bug_fix(commit: &Commit) -> bool {
    BUG_FIX_PATTERNS.iter().any(|p| p.is_match(&commit.message))
}

/// 0.6 x fix ratio + 0.4 x churn, capped at 1
pub fn risk_score(changes: usize, bug_fixes: usize) -> f64 {
    if changes == 0 {
        return 0.0;
    }
    let bug_ratio = bug_fixes as f64 / changes as f64;
    let churn = (changes as f64 / CHURN_SATURATION).min(1.0);
    (BUG_RATIO_WEIGHT * bug_ratio + CHURN_WEIGHT * churn).min(1.0)
}

fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| w.len() > 3 && !STOPWORDS.contains(w))
        .map(String::from)
        .collect()
}
