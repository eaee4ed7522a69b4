//! Filesystem collaborator.
//!
//! Workers only touch the disk through [FileSystem], so tests can hand them a double that
//! counts calls or injects failures. [LocalFs] is the real implementation.

use crate::core::fm::{self, Entry};
use crate::core::formatter::{self, PreviewContent};
use crate::utils::copy_recursive;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

pub trait FileSystem: Send + Sync {
    /// Sorted listing, directories first then case-insensitive name.
    fn list_directory(&self, path: &Path, show_hidden: bool) -> io::Result<Vec<Entry>>;

    fn read_preview(&self, path: &Path, max_bytes: usize) -> io::Result<PreviewContent>;

    /// True when anything (including a dangling symlink) occupies `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Copies a file, or a directory recursively.
    fn copy(&self, src: &Path, dest: &Path) -> io::Result<()>;

    /// Moves `src` to `dest`, falling back to copy-then-delete across devices.
    fn move_path(&self, src: &Path, dest: &Path) -> io::Result<()>;

    /// Removes a file, symlink or directory tree. Irreversible.
    fn delete(&self, path: &Path) -> io::Result<()>;

    fn mkdir(&self, path: &Path) -> io::Result<()>;

    /// Creates an empty file; fails if `path` is occupied.
    fn create_file(&self, path: &Path) -> io::Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn list_directory(&self, path: &Path, show_hidden: bool) -> io::Result<Vec<Entry>> {
        fm::list_directory(path, show_hidden)
    }

    fn read_preview(&self, path: &Path, max_bytes: usize) -> io::Result<PreviewContent> {
        formatter::read_preview(path, max_bytes)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn copy(&self, src: &Path, dest: &Path) -> io::Result<()> {
        copy_recursive(src, dest)
    }

    fn move_path(&self, src: &Path, dest: &Path) -> io::Result<()> {
        match fs::rename(src, dest) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                tracing::debug!(src = %src.display(), "rename crosses devices, copying");
                copy_recursive(src, dest)?;
                self.delete(src)
            }
            Err(e) => Err(e),
        }
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        let meta = fs::symlink_metadata(path)?;
        if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    }

    fn mkdir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn create_file(&self, path: &Path) -> io::Result<()> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map(|_| ())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_file_refuses_existing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("note.txt");
        LocalFs.create_file(&path)?;
        assert!(LocalFs.exists(&path));
        let err = LocalFs.create_file(&path).err().ok_or("second create succeeded")?;
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        Ok(())
    }

    #[test]
    fn copy_and_delete_directory_tree() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested"))?;
        fs::write(src.join("nested/a.txt"), "a")?;

        let dest = dir.path().join("dest");
        LocalFs.copy(&src, &dest)?;
        assert_eq!(fs::read_to_string(dest.join("nested/a.txt"))?, "a");

        LocalFs.delete(&src)?;
        assert!(!LocalFs.exists(&src));
        assert!(LocalFs.exists(&dest));
        Ok(())
    }

    #[test]
    fn move_path_renames() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let from = dir.path().join("from.txt");
        let to = dir.path().join("to.txt");
        fs::write(&from, "payload")?;

        LocalFs.move_path(&from, &to)?;
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to)?, "payload");

        assert!(LocalFs.move_path(&from, &to).is_err());
        Ok(())
    }
}
