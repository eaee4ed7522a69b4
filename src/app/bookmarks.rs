//! Named directory bookmarks.
//!
//! Seeded from the `[bookmarks]` config table and edited with `bookmark add|remove`.
//! Changes live for the session only.

use crate::error::{Result, RoveError};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bookmarks {
    marks: BTreeMap<String, PathBuf>,
}

impl Bookmarks {
    pub fn new(marks: BTreeMap<String, PathBuf>) -> Self {
        Self { marks }
    }

    /// Rejects names that could not be typed back as a single command argument.
    pub fn check_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(RoveError::validation("Bookmark name cannot be empty"));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(RoveError::validation("Bookmark name cannot contain spaces"));
        }
        Ok(())
    }

    /// Adds or replaces a bookmark.
    pub fn add(&mut self, name: &str, path: PathBuf) -> Result<()> {
        Self::check_name(name)?;
        self.marks.insert(name.to_string(), path);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<PathBuf> {
        self.marks
            .remove(name)
            .ok_or_else(|| RoveError::validation(format!("No bookmark named '{name}'")))
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.marks.get(name).map(PathBuf::as_path)
    }

    /// Bookmark at `index` in name order.
    pub fn nth(&self, index: usize) -> Option<(&str, &Path)> {
        self.iter().nth(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> + '_ {
        self.marks.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}
