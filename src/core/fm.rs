//! Directory listing and the [Entry] model for rove.
//!
//! Provides the Entry struct which is used throughout rove.
//! Entries are immutable snapshots produced by [list_directory]: a reload replaces the
//! whole list, and attaching git state produces new entries via [Entry::with_git_status].

use crate::core::formatter::format_attributes;
use crate::core::git::GitStatus;

use std::cmp::Ordering;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// The kind of filesystem object an [Entry] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    Symlink,
}

/// A single record in a directory listing.
///
/// Symlinks keep [EntryKind::Symlink] but remember whether their target is a
/// directory, so they sort and navigate like one.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    name: String,
    lowercase_name: String,
    path: PathBuf,
    kind: EntryKind,
    target_is_dir: bool,
    hidden: bool,
    size: Option<u64>,
    modified: Option<SystemTime>,
    created: Option<SystemTime>,
    permissions: Option<String>,
    extension: Option<String>,
    git_status: Option<GitStatus>,
}

impl Entry {
    /// Builds a bare entry without metadata. Used by tests and by callers that
    /// already know the kind.
    pub fn new(path: PathBuf, kind: EntryKind) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let extension = if kind == EntryKind::Directory {
            None
        } else {
            Path::new(&name)
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
        };
        Entry {
            lowercase_name: name.to_lowercase(),
            hidden: name.starts_with('.'),
            target_is_dir: kind == EntryKind::Directory,
            name,
            path,
            kind,
            size: None,
            modified: None,
            created: None,
            permissions: None,
            extension,
            git_status: None,
        }
    }

    /// Reads the metadata of `path` without following a final symlink.
    pub fn from_path(path: PathBuf) -> io::Result<Self> {
        let meta = fs::symlink_metadata(&path)?;
        Ok(Self::from_metadata(path, &meta))
    }

    fn from_metadata(path: PathBuf, meta: &Metadata) -> Self {
        let ft = meta.file_type();
        let kind = if ft.is_symlink() {
            EntryKind::Symlink
        } else if ft.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        let mut entry = Entry::new(path, kind);
        if kind == EntryKind::Symlink {
            entry.target_is_dir = fs::metadata(&entry.path).is_ok_and(|m| m.is_dir());
        }
        if kind != EntryKind::Directory {
            entry.size = Some(meta.len());
        }
        entry.modified = meta.modified().ok();
        entry.created = meta.created().ok();
        entry.permissions = Some(format_attributes(meta));
        entry
    }

    /// Returns a copy of this entry carrying the given git status.
    pub fn with_git_status(&self, status: Option<GitStatus>) -> Self {
        Entry {
            git_status: status,
            ..self.clone()
        }
    }

    // Accessors

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn lowercase_name(&self) -> &str {
        &self.lowercase_name
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// True for directories and for symlinks pointing at one.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.target_is_dir
    }

    #[inline]
    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    #[inline]
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    #[inline]
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    #[inline]
    pub fn created(&self) -> Option<SystemTime> {
        self.created
    }

    #[inline]
    pub fn permissions(&self) -> Option<&str> {
        self.permissions.as_deref()
    }

    #[inline]
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    #[inline]
    pub fn git_status(&self) -> Option<GitStatus> {
        self.git_status
    }
}

/// Orders entries directories first, then by case-insensitive name.
///
/// Ties on the lowercase name fall back to the raw name so the order is total.
pub fn compare_entries(a: &Entry, b: &Entry) -> Ordering {
    match (a.is_dir(), b.is_dir()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .lowercase_name
            .cmp(&b.lowercase_name)
            .then_with(|| a.name.cmp(&b.name)),
    }
}

/// Sorts entries in place with [compare_entries].
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(compare_entries);
}

/// Reads the contents of the provided directory.
///
/// Unreadable individual entries are skipped. Hidden (dot) entries are dropped unless
/// `show_hidden` is set. The result is always sorted directories first, then by
/// case-insensitive name.
pub fn list_directory(path: &Path, show_hidden: bool) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::with_capacity(256);

    for dir_entry in fs::read_dir(path)? {
        let Ok(dir_entry) = dir_entry else {
            continue;
        };
        let Ok(meta) = fs::symlink_metadata(dir_entry.path()) else {
            continue;
        };

        let entry = Entry::from_metadata(dir_entry.path(), &meta);
        if !show_hidden && entry.is_hidden() {
            continue;
        }
        entries.push(entry);
    }

    sort_entries(&mut entries);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rng;
    use rand::seq::SliceRandom;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name()).collect()
    }

    #[test]
    fn list_directory_sorts_dirs_first() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        File::create(dir.path().join("b.txt"))?;
        fs::create_dir(dir.path().join("A"))?;
        File::create(dir.path().join("a.txt"))?;

        let entries = list_directory(dir.path(), false)?;
        assert_eq!(names(&entries), vec!["A", "a.txt", "b.txt"]);
        assert!(entries[0].is_dir());
        assert_eq!(entries[1].path(), dir.path().join("a.txt"));
        Ok(())
    }

    #[test]
    fn list_directory_hides_dotfiles_unless_asked() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        File::create(dir.path().join(".env"))?;
        File::create(dir.path().join("main.rs"))?;

        assert_eq!(names(&list_directory(dir.path(), false)?), vec!["main.rs"]);
        assert_eq!(
            names(&list_directory(dir.path(), true)?),
            vec![".env", "main.rs"]
        );
        Ok(())
    }

    #[test]
    fn list_directory_fails_for_missing_path() {
        let result = list_directory(Path::new("/path/does/not/exist"), true);
        assert!(result.is_err());
    }

    #[test]
    fn sort_is_stable_under_shuffle() {
        let mut entries: Vec<Entry> = ["zeta", "Alpha", "beta", "Gamma"]
            .iter()
            .map(|n| Entry::new(PathBuf::from("/x").join(n), EntryKind::File))
            .chain(
                ["src", "Docs"]
                    .iter()
                    .map(|n| Entry::new(PathBuf::from("/x").join(n), EntryKind::Directory)),
            )
            .collect();

        for _ in 0..20 {
            entries.shuffle(&mut rng());
            sort_entries(&mut entries);
            assert_eq!(
                names(&entries),
                vec!["Docs", "src", "Alpha", "beta", "Gamma", "zeta"]
            );
        }
    }

    #[test]
    fn entry_metadata_is_populated() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("notes.md"), "hello")?;

        let entry = Entry::from_path(dir.path().join("notes.md"))?;
        assert_eq!(entry.kind(), EntryKind::File);
        assert_eq!(entry.size(), Some(5));
        assert_eq!(entry.extension(), Some("md"));
        assert!(entry.permissions().is_some());
        assert!(entry.git_status().is_none());

        let tagged = entry.with_git_status(Some(GitStatus::Modified));
        assert_eq!(tagged.git_status(), Some(GitStatus::Modified));
        assert_eq!(tagged.name(), entry.name());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_directory_sorts_as_directory() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::create_dir(dir.path().join("real"))?;
        File::create(dir.path().join("aaa.txt"))?;
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link"))?;

        let entries = list_directory(dir.path(), false)?;
        assert_eq!(names(&entries), vec!["link", "real", "aaa.txt"]);
        assert!(entries[0].is_symlink());
        assert!(entries[0].is_dir());
        Ok(())
    }
}
