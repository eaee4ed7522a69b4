//! Git status primitive.
//!
//! Shells out to the `git` CLI and folds `git status --porcelain=v1` into per-name tags
//! for the entries of one directory. Changes below a subdirectory are propagated up to
//! the subdirectory's own name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Status tag attached to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GitStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
    Untracked,
    Conflict,
}

impl GitStatus {
    /// Single-column marker for the entry list.
    pub fn marker(self) -> char {
        match self {
            GitStatus::Modified => 'M',
            GitStatus::Added => 'A',
            GitStatus::Deleted => 'D',
            GitStatus::Renamed => 'R',
            GitStatus::Untracked => '?',
            GitStatus::Conflict => 'U',
        }
    }

    fn severity(self) -> u8 {
        match self {
            GitStatus::Conflict => 6,
            GitStatus::Deleted => 5,
            GitStatus::Modified => 4,
            GitStatus::Renamed => 3,
            GitStatus::Added => 2,
            GitStatus::Untracked => 1,
        }
    }

    /// Keeps the more severe of two statuses.
    pub fn merge(self, other: GitStatus) -> GitStatus {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

/// Result of a git query for one directory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GitInfo {
    #[default]
    NotRepository,
    Repository {
        branch: String,
        status_by_filename: HashMap<String, GitStatus>,
        is_clean: bool,
    },
}

impl GitInfo {
    pub fn branch(&self) -> Option<&str> {
        match self {
            GitInfo::NotRepository => None,
            GitInfo::Repository { branch, .. } => Some(branch),
        }
    }

    pub fn status_of(&self, name: &str) -> Option<GitStatus> {
        match self {
            GitInfo::NotRepository => None,
            GitInfo::Repository {
                status_by_filename, ..
            } => status_by_filename.get(name).copied(),
        }
    }

    pub fn is_clean(&self) -> bool {
        match self {
            GitInfo::NotRepository => true,
            GitInfo::Repository { is_clean, .. } => *is_clean,
        }
    }
}

/// Source of [GitInfo]. Swappable so the controller can be driven without a `git` binary.
pub trait GitProvider: Send + Sync {
    fn git_info(&self, dir: &Path) -> GitInfo;
}

/// [GitProvider] backed by the `git` executable on `PATH`.
#[derive(Debug, Clone)]
pub struct GitCli {
    git: Option<PathBuf>,
}

impl GitCli {
    pub fn new() -> Self {
        let git = which::which("git").ok();
        if git.is_none() {
            tracing::info!("git not found on PATH, status tags disabled");
        }
        GitCli { git }
    }

    fn run(&self, dir: &Path, args: &[&str]) -> Option<String> {
        let git = self.git.as_ref()?;
        let output = Command::new(git)
            .args(args)
            .current_dir(dir)
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn branch(&self, dir: &Path) -> String {
        let name = self
            .run(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        if name == "HEAD" {
            if let Some(hash) = self.run(dir, &["rev-parse", "--short", "HEAD"]) {
                return format!("detached@{}", hash.trim());
            }
        }
        if name.is_empty() {
            // Fresh repository without commits
            return self
                .run(dir, &["symbolic-ref", "--short", "HEAD"])
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| "HEAD".to_string());
        }
        name
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitProvider for GitCli {
    fn git_info(&self, dir: &Path) -> GitInfo {
        let Some(root) = self.run(dir, &["rev-parse", "--show-toplevel"]) else {
            return GitInfo::NotRepository;
        };
        let root = PathBuf::from(root.trim());
        let Some(porcelain) = self.run(dir, &["status", "--porcelain=v1", "-uall"]) else {
            return GitInfo::NotRepository;
        };

        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let root = root.canonicalize().unwrap_or(root);

        GitInfo::Repository {
            branch: self.branch(&dir),
            is_clean: porcelain.trim().is_empty(),
            status_by_filename: statuses_for_dir(&porcelain, &root, &dir),
        }
    }
}

/// Maps porcelain v1 output onto the names directly inside `dir`.
pub fn statuses_for_dir(
    porcelain: &str,
    repo_root: &Path,
    dir: &Path,
) -> HashMap<String, GitStatus> {
    let mut out: HashMap<String, GitStatus> = HashMap::new();

    for line in porcelain.lines() {
        let mut chars = line.chars();
        let (Some(index), Some(worktree)) = (chars.next(), chars.next()) else {
            continue;
        };
        let Some(raw_path) = line.get(3..) else {
            continue;
        };
        let Some(status) = parse_status(index, worktree) else {
            continue;
        };

        let path = raw_path.rsplit(" -> ").next().unwrap_or(raw_path);
        let path = path.trim_matches('"');
        let absolute = repo_root.join(path);

        let Ok(relative) = absolute.strip_prefix(dir) else {
            continue;
        };
        let Some(first) = relative.components().next() else {
            continue;
        };
        let name = first.as_os_str().to_string_lossy().into_owned();

        out.entry(name)
            .and_modify(|s| *s = s.merge(status))
            .or_insert(status);
    }
    out
}

fn parse_status(index: char, worktree: char) -> Option<GitStatus> {
    if index == 'U'
        || worktree == 'U'
        || (index == 'A' && worktree == 'A')
        || (index == 'D' && worktree == 'D')
    {
        return Some(GitStatus::Conflict);
    }
    match (index, worktree) {
        ('?', _) => Some(GitStatus::Untracked),
        ('R', _) | (_, 'R') => Some(GitStatus::Renamed),
        ('A', _) => Some(GitStatus::Added),
        ('D', _) | (_, 'D') => Some(GitStatus::Deleted),
        ('M', _) | (_, 'M') => Some(GitStatus::Modified),
        _ => None,
    }
}
