//! Recursive fuzzy find for deep search.
//!
//! [find] walks the tree below a base directory breadth-first, scores each relative path
//! against the query with [SkimMatcherV2] and keeps the best `max_results`. The walk checks
//! a cancellation flag between directories so a newer query can abandon it early.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{self, AtomicBool};

/// Upper bound on visited entries per query.
const MAX_SCANNED: usize = 200_000;

/// Directories that are never descended into.
#[rustfmt::skip]
const EXCLUDES: &[&str] = &[
    ".git", ".hg", ".svn", ".cargo", "target", "node_modules",
    "venv", ".venv", "__pycache__", ".DS_Store",
];

/// A single scored match.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FindResult {
    path: PathBuf,
    is_dir: bool,
    score: i64,
}

/// Higher score sorts first.
impl Ord for FindResult {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for FindResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FindResult {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    /// Path relative to `base` with forward slashes.
    pub fn relative(&self, base: &Path) -> String {
        let rel = self.path.strip_prefix(base).unwrap_or(&self.path);
        normalize_relative_path(rel)
    }
}

/// Fuzzy-finds `query` below `base_dir`.
///
/// Returns an empty list for an empty query. A cancelled walk returns whatever it had
/// scored so far; the caller discards it anyway.
pub fn find(
    base_dir: &Path,
    query: &str,
    cancel: &Arc<AtomicBool>,
    max_results: usize,
    show_hidden: bool,
) -> io::Result<Vec<FindResult>> {
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let matcher = SkimMatcherV2::default();
    let query = query.replace('\\', "/");
    let mut results = Vec::new();
    let mut queue = VecDeque::from([base_dir.to_path_buf()]);
    let mut scanned = 0usize;

    // The base directory must be readable; errors below it are skipped.
    let mut first = Some(fs::read_dir(base_dir)?);

    while let Some(dir) = queue.pop_front() {
        if cancel.load(atomic::Ordering::Relaxed) {
            tracing::debug!(query = %query, "find cancelled");
            break;
        }
        let read = match first.take() {
            Some(read) => read,
            None => match fs::read_dir(&dir) {
                Ok(read) => read,
                Err(_) => continue,
            },
        };

        for dir_entry in read.flatten() {
            scanned += 1;
            let name = dir_entry.file_name();
            let name = name.to_string_lossy();
            if !show_hidden && name.starts_with('.') {
                continue;
            }
            let Ok(file_type) = dir_entry.file_type() else {
                continue;
            };
            let path = dir_entry.path();
            let is_dir = file_type.is_dir();

            let rel = path.strip_prefix(base_dir).unwrap_or(&path);
            let rel = normalize_relative_path(rel);
            if let Some(score) = matcher.fuzzy_match(&rel, &query) {
                results.push(FindResult {
                    path: path.clone(),
                    is_dir,
                    score,
                });
            }

            if is_dir && !EXCLUDES.contains(&name.as_ref()) {
                queue.push_back(path);
            }
        }

        if scanned >= MAX_SCANNED {
            tracing::debug!(scanned, "find scan limit reached");
            break;
        }
    }

    results.sort_unstable();
    results.truncate(max_results);
    Ok(results)
}

fn normalize_relative_path(path: &Path) -> String {
    let rel = path.to_string_lossy().into_owned();
    #[cfg(windows)]
    {
        rel.replace('\\', "/")
    }
    #[cfg(not(windows))]
    {
        rel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn no_cancel() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn find_scores_nested_paths() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("src/core"))?;
        File::create(dir.path().join("src/core/worker.rs"))?;
        File::create(dir.path().join("README.md"))?;

        let results = find(dir.path(), "worker", &no_cancel(), 10, false)?;
        assert!(!results.is_empty());
        assert_eq!(results[0].relative(dir.path()), "src/core/worker.rs");
        assert!(!results[0].is_dir());
        assert!(results.windows(2).all(|w| w[0].score() >= w[1].score()));
        Ok(())
    }

    #[test]
    fn find_skips_excluded_and_hidden() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("target/debug"))?;
        File::create(dir.path().join("target/debug/needle"))?;
        fs::create_dir_all(dir.path().join(".cache"))?;
        File::create(dir.path().join(".cache/needle"))?;
        File::create(dir.path().join("needle.txt"))?;

        let results = find(dir.path(), "needle", &no_cancel(), 10, false)?;
        let rels: Vec<String> = results.iter().map(|r| r.relative(dir.path())).collect();
        assert_eq!(rels, vec!["needle.txt"]);
        Ok(())
    }

    #[test]
    fn find_respects_limits_and_cancel() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        for i in 0..20 {
            File::create(dir.path().join(format!("file_{i}.log")))?;
        }

        assert_eq!(find(dir.path(), "log", &no_cancel(), 5, false)?.len(), 5);
        assert!(find(dir.path(), "", &no_cancel(), 5, false)?.is_empty());

        let cancelled = Arc::new(AtomicBool::new(true));
        assert!(find(dir.path(), "log", &cancelled, 5, false)?.is_empty());
        Ok(())
    }
}
