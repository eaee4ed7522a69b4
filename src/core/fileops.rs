//! File operation orchestrator.
//!
//! Runs one [FileOperation] against a [FileSystem] and reports per-item outcomes in a
//! [BatchReport]. Batches never stop at the first failure: every item is attempted and the
//! report carries both lists. Nothing is overwritten or auto-renamed; an occupied
//! destination is a per-item failure.

use crate::core::fm::Entry;
use crate::core::fs::FileSystem;
use crate::error::RoveError;

use std::path::{Path, PathBuf};

/// Operations the file-op worker can perform.
#[derive(Debug, Clone)]
pub enum FileOperation {
    /// Copies or moves a clipboard snapshot into `dest_dir`.
    Paste {
        entries: Vec<Entry>,
        dest_dir: PathBuf,
        cut: bool,
    },
    Delete(Vec<PathBuf>),
    Rename {
        from: PathBuf,
        to: PathBuf,
    },
    Create {
        path: PathBuf,
        is_dir: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Copy,
    Move,
    Delete,
    Rename,
    CreateFile,
    CreateDir,
}

impl OpKind {
    fn past_tense(self) -> &'static str {
        match self {
            OpKind::Copy => "Pasted",
            OpKind::Move => "Moved",
            OpKind::Delete => "Deleted",
            OpKind::Rename => "Renamed",
            OpKind::CreateFile | OpKind::CreateDir => "Created",
        }
    }
}

/// Aggregate outcome of one operation.
///
/// `succeeded` holds source paths (for paste and delete) or the affected path (for rename
/// and create). `focus` is the first name in the current directory the cursor should land on
/// after the refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub kind: OpKind,
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub focus: Option<String>,
}

impl BatchReport {
    fn new(kind: OpKind) -> Self {
        BatchReport {
            kind,
            succeeded: Vec::new(),
            failed: Vec::new(),
            focus: None,
        }
    }

    fn fail(&mut self, path: &Path, reason: impl Into<String>) {
        self.failed.push((path.to_path_buf(), reason.into()));
    }

    fn focus_on(&mut self, path: &Path) {
        if self.focus.is_none() {
            self.focus = path.file_name().map(|n| n.to_string_lossy().into_owned());
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// One-line summary for the message slot.
    pub fn summary(&self) -> String {
        let verb = self.kind.past_tense();
        match (self.failed.as_slice(), self.total()) {
            ([], 1) => match self.succeeded.first().and_then(|p| p.file_name()) {
                Some(name) => format!("{verb} {}", name.to_string_lossy()),
                None => format!("{verb} 1 item"),
            },
            ([], n) => format!("{verb} {n} items"),
            ([(path, reason)], 1) => format!("{}: {reason}", display_name(path)),
            ([(path, reason), rest @ ..], n) => {
                let more = if rest.is_empty() {
                    String::new()
                } else {
                    format!(" (+{} more)", rest.len())
                };
                format!(
                    "{verb} {} of {n}; {}: {reason}{more}",
                    self.succeeded.len(),
                    display_name(path)
                )
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Rejects names that are empty or would escape the current directory.
pub fn validate_name(name: &str) -> Result<(), RoveError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RoveError::validation("Name cannot be empty"));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(RoveError::validation(format!("Invalid name: {trimmed}")));
    }
    if trimmed.contains('/') || trimmed.contains(std::path::MAIN_SEPARATOR) {
        return Err(RoveError::validation("Name cannot contain a path separator"));
    }
    Ok(())
}

/// Runs `op` to completion and reports every item.
pub fn execute(fs: &dyn FileSystem, op: FileOperation) -> BatchReport {
    match op {
        FileOperation::Paste {
            entries,
            dest_dir,
            cut,
        } => paste(fs, &entries, &dest_dir, cut),
        FileOperation::Delete(paths) => delete(fs, &paths),
        FileOperation::Rename { from, to } => rename(fs, &from, &to),
        FileOperation::Create { path, is_dir } => create(fs, &path, is_dir),
    }
}

fn paste(fs: &dyn FileSystem, entries: &[Entry], dest_dir: &Path, cut: bool) -> BatchReport {
    let mut report = BatchReport::new(if cut { OpKind::Move } else { OpKind::Copy });

    for entry in entries {
        let src = entry.path();
        let Some(name) = src.file_name() else {
            report.fail(src, "invalid source path");
            continue;
        };
        let dest = dest_dir.join(name);

        if fs.exists(&dest) {
            report.fail(src, RoveError::TargetExists(dest).to_string());
            continue;
        }
        if entry.is_dir() && dest.starts_with(src) {
            report.fail(src, "cannot paste a directory into itself");
            continue;
        }

        let result = if cut {
            fs.move_path(src, &dest)
        } else {
            fs.copy(src, &dest)
        };
        match result {
            Ok(()) => {
                report.focus_on(&dest);
                report.succeeded.push(src.to_path_buf());
            }
            Err(e) => report.fail(src, e.to_string()),
        }
    }

    tracing::info!(
        kind = ?report.kind,
        ok = report.succeeded.len(),
        failed = report.failed.len(),
        dest = %dest_dir.display(),
        "paste finished"
    );
    report
}

fn delete(fs: &dyn FileSystem, paths: &[PathBuf]) -> BatchReport {
    let mut report = BatchReport::new(OpKind::Delete);
    for path in paths {
        match fs.delete(path) {
            Ok(()) => report.succeeded.push(path.clone()),
            Err(e) => report.fail(path, e.to_string()),
        }
    }
    tracing::info!(
        ok = report.succeeded.len(),
        failed = report.failed.len(),
        "delete finished"
    );
    report
}

fn rename(fs: &dyn FileSystem, from: &Path, to: &Path) -> BatchReport {
    let mut report = BatchReport::new(OpKind::Rename);
    if fs.exists(to) {
        report.fail(to, RoveError::TargetExists(to.to_path_buf()).to_string());
        return report;
    }
    match fs.rename(from, to) {
        Ok(()) => {
            report.focus_on(to);
            report.succeeded.push(to.to_path_buf());
        }
        Err(e) => report.fail(from, e.to_string()),
    }
    report
}

fn create(fs: &dyn FileSystem, path: &Path, is_dir: bool) -> BatchReport {
    let mut report = BatchReport::new(if is_dir {
        OpKind::CreateDir
    } else {
        OpKind::CreateFile
    });
    if fs.exists(path) {
        report.fail(path, RoveError::TargetExists(path.to_path_buf()).to_string());
        return report;
    }
    let result = if is_dir {
        fs.mkdir(path)
    } else {
        fs.create_file(path)
    };
    match result {
        Ok(()) => {
            report.focus_on(path);
            report.succeeded.push(path.to_path_buf());
        }
        Err(e) => report.fail(path, e.to_string()),
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fs::LocalFs;
    use std::fs;
    use tempfile::tempdir;

    fn entry(path: PathBuf) -> Result<Entry, std::io::Error> {
        Entry::from_path(path)
    }

    #[test]
    fn paste_continues_past_collision() -> Result<(), Box<dyn std::error::Error>> {
        let src = tempdir()?;
        let dest = tempdir()?;
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(src.path().join(name), name)?;
        }
        fs::write(dest.path().join("b.txt"), "already here")?;

        let entries = ["a.txt", "b.txt", "c.txt"]
            .iter()
            .map(|n| entry(src.path().join(n)))
            .collect::<Result<Vec<_>, _>>()?;
        let report = execute(
            &LocalFs,
            FileOperation::Paste {
                entries,
                dest_dir: dest.path().to_path_buf(),
                cut: false,
            },
        );

        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, src.path().join("b.txt"));
        assert!(report.failed[0].1.starts_with("Target exists"));
        assert_eq!(report.focus.as_deref(), Some("a.txt"));
        assert_eq!(fs::read_to_string(dest.path().join("b.txt"))?, "already here");
        assert_eq!(fs::read_to_string(dest.path().join("c.txt"))?, "c.txt");
        assert!(report.summary().starts_with("Pasted 2 of 3"));
        Ok(())
    }

    #[test]
    fn cut_of_vanished_source_fails_only_that_item() -> Result<(), Box<dyn std::error::Error>> {
        let src = tempdir()?;
        let dest = tempdir()?;
        fs::write(src.path().join("keep.txt"), "k")?;
        fs::write(src.path().join("gone.txt"), "g")?;
        let entries = vec![
            entry(src.path().join("gone.txt"))?,
            entry(src.path().join("keep.txt"))?,
        ];
        fs::remove_file(src.path().join("gone.txt"))?;

        let report = execute(
            &LocalFs,
            FileOperation::Paste {
                entries,
                dest_dir: dest.path().to_path_buf(),
                cut: true,
            },
        );
        assert_eq!(report.kind, OpKind::Move);
        assert_eq!(report.succeeded, vec![src.path().join("keep.txt")]);
        assert_eq!(report.failed.len(), 1);
        assert!(!src.path().join("keep.txt").exists());
        assert!(dest.path().join("keep.txt").exists());
        Ok(())
    }

    #[test]
    fn directory_cannot_be_pasted_into_itself() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let folder = dir.path().join("folder");
        fs::create_dir(&folder)?;

        let report = execute(
            &LocalFs,
            FileOperation::Paste {
                entries: vec![entry(folder.clone())?],
                dest_dir: folder.clone(),
                cut: false,
            },
        );
        assert!(!report.is_success());
        assert!(report.succeeded.is_empty());
        Ok(())
    }

    #[test]
    fn rename_and_create_refuse_occupied_targets() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "a")?;
        fs::write(&b, "b")?;

        let report = execute(
            &LocalFs,
            FileOperation::Rename {
                from: a.clone(),
                to: b.clone(),
            },
        );
        assert!(!report.is_success());
        assert_eq!(fs::read_to_string(&a)?, "a");
        assert_eq!(fs::read_to_string(&b)?, "b");

        let report = execute(
            &LocalFs,
            FileOperation::Create {
                path: b.clone(),
                is_dir: true,
            },
        );
        assert!(report.summary().contains("Target exists"));

        let new_dir = dir.path().join("new");
        let report = execute(
            &LocalFs,
            FileOperation::Create {
                path: new_dir.clone(),
                is_dir: true,
            },
        );
        assert!(report.is_success());
        assert_eq!(report.summary(), "Created new");
        assert!(new_dir.is_dir());
        Ok(())
    }

    #[test]
    fn delete_reports_each_path() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let file = dir.path().join("x.txt");
        let tree = dir.path().join("tree");
        fs::write(&file, "x")?;
        fs::create_dir_all(tree.join("inner"))?;

        let report = execute(
            &LocalFs,
            FileOperation::Delete(vec![file.clone(), tree.clone(), dir.path().join("nope")]),
        );
        assert_eq!(report.succeeded, vec![file.clone(), tree.clone()]);
        assert_eq!(report.failed.len(), 1);
        assert!(!file.exists());
        assert!(!tree.exists());
        Ok(())
    }

    #[test]
    fn validate_name_rules() {
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("notes.md").is_ok());
    }
}
