//! Git history analysis tests

use git2::{Repository, Signature, Time};
use rootcause::git::{HistoryAnalyzer, is_bug_fix, risk_score};
use rootcause::model::{Author, Commit};
use rootcause::{ErrorClassifier, RawError};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn commit_files(repo: &Repository, files: &[(&str, &str)], message: &str, seconds: i64) {
    let workdir = repo.workdir().unwrap().to_path_buf();
    let mut index = repo.index().unwrap();
    for (path, content) in files {
        std::fs::write(workdir.join(path), content).unwrap();
        index.add_path(Path::new(path)).unwrap();
    }
    index.write().unwrap();

    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let signature = Signature::new("Test Dev", "dev@example.com", &Time::new(seconds, 0)).unwrap();
    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parent_refs)
        .unwrap();
}

/// a.py attracts fixes, b.py only features
fn sample_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();

    commit_files(&repo, &[("a.py", "v1"), ("b.py", "v1")], "Initial commit", 1_000);
    commit_files(&repo, &[("a.py", "v2")], "Fix KeyError in parser", 2_000);
    commit_files(&repo, &[("b.py", "v2")], "Add export feature", 3_000);
    commit_files(&repo, &[("a.py", "v3")], "fixed crash when config missing", 4_000);

    dir
}

fn commit_with_message(message: &str) -> Commit {
    Commit {
        sha: "0123456789abcdef".to_string(),
        message: message.to_string(),
        author: Author {
            name: "Test Dev".to_string(),
            email: "dev@example.com".to_string(),
        },
        timestamp: Default::default(),
        files_changed: Vec::new(),
    }
}

#[test]
fn test_commit_history_newest_first() {
    let dir = sample_repo();
    let analyzer = HistoryAnalyzer::open(dir.path(), 100).unwrap();

    let commits = analyzer.commit_history(10).unwrap();

    let summaries: Vec<&str> = commits.iter().map(|c| c.summary()).collect();
    assert_eq!(
        summaries,
        vec![
            "fixed crash when config missing",
            "Add export feature",
            "Fix KeyError in parser",
            "Initial commit",
        ]
    );
    assert_eq!(commits[0].files_changed, vec!["a.py"]);
    assert_eq!(commits[3].files_changed.len(), 2);
    assert_eq!(commits[0].author.email, "dev@example.com");
    assert_eq!(commits[0].timestamp.timestamp(), 4_000);
    assert_eq!(commits[0].short_sha().len(), 7);
}

#[test]
fn test_commit_history_limit() {
    let dir = sample_repo();
    let analyzer = HistoryAnalyzer::open(dir.path(), 100).unwrap();

    assert_eq!(analyzer.commit_history(2).unwrap().len(), 2);
}

#[test]
fn test_bug_fix_detection() {
    assert!(is_bug_fix(&commit_with_message("Fix KeyError in parser")));
    assert!(is_bug_fix(&commit_with_message("fixes #12")));
    assert!(is_bug_fix(&commit_with_message("Resolved race in cache")));
    assert!(is_bug_fix(&commit_with_message("Patch the loader")));
    assert!(is_bug_fix(&commit_with_message("BUG: wrong default")));
    assert!(!is_bug_fix(&commit_with_message("Add prefix option")));
    assert!(!is_bug_fix(&commit_with_message("Debugging helpers")));
}

#[test]
fn test_risk_score() {
    assert_eq!(risk_score(0, 0), 0.0);
    assert!((risk_score(3, 2) - 0.424).abs() < 1e-9);
    assert!((risk_score(2, 0) - 0.016).abs() < 1e-9);
    assert_eq!(risk_score(100, 100), 1.0);
}

#[test]
fn test_fragile_areas_and_change_patterns() {
    let dir = sample_repo();
    let analyzer = HistoryAnalyzer::open(dir.path(), 100).unwrap();
    let commits = analyzer.commit_history(100).unwrap();

    let fragile = analyzer.identify_fragile_areas(&commits);
    assert_eq!(fragile.len(), 1);
    assert_eq!(fragile[0].file_path, PathBuf::from("a.py"));
    assert_eq!(fragile[0].change_count, 3);
    assert_eq!(fragile[0].bug_fix_count, 2);

    let patterns = analyzer.change_patterns(&commits);
    assert_eq!(
        patterns.frequently_changed,
        vec![PathBuf::from("a.py"), PathBuf::from("b.py")]
    );
}

#[test]
fn test_similar_past_fixes() {
    let dir = sample_repo();
    let analyzer = HistoryAnalyzer::open(dir.path(), 100).unwrap();
    let error = ErrorClassifier::new().classify(&RawError::new("KeyError: 'name' raised by the parser"));

    let similar = analyzer.find_similar_past_fixes(&error, 5).unwrap();

    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].summary(), "Fix KeyError in parser");
}

#[test]
fn test_similar_fixes_without_keywords() {
    let dir = sample_repo();
    let analyzer = HistoryAnalyzer::open(dir.path(), 100).unwrap();
    let error = ErrorClassifier::new().classify(&RawError::new("a b c"));

    assert!(analyzer.find_similar_past_fixes(&error, 5).unwrap().is_empty());
}

#[test]
fn test_build_context() {
    let dir = sample_repo();
    let analyzer = HistoryAnalyzer::open(dir.path().join("."), 100).unwrap();

    let context = analyzer.build_context().unwrap();

    assert!(context.branch.is_some());
    assert!(context.has_recent_activity());
    assert_eq!(context.recent_commits.len(), 4);
    assert_eq!(context.fragile_areas.len(), 1);

    let block = context.to_prompt_block();
    assert!(block.contains("Recent commits:"));
    assert!(block.contains("Fix KeyError in parser [a.py]"));
    assert!(block.contains("Fragile areas:\n- a.py (changes: 3, bug fixes: 2, risk: 0.42)"));
    assert!(block.contains("Frequently changed: a.py, b.py"));
}

#[test]
fn test_empty_repository() {
    let dir = TempDir::new().unwrap();
    Repository::init(dir.path()).unwrap();
    let analyzer = HistoryAnalyzer::open(dir.path(), 100).unwrap();

    let context = analyzer.build_context().unwrap();

    assert!(context.recent_commits.is_empty());
    assert!(context.fragile_areas.is_empty());
    assert!(!context.has_recent_activity());
}
