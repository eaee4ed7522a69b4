//! Core runtime logic for rove.
//!
//! The non-UI engine pieces:
//! - [fm]: directory listing and [Entry] snapshots.
//! - [formatter]: attribute, size and time formatting plus the preview reader.
//! - [fs]: the [FileSystem] collaborator and its local implementation.
//! - [git]: git status via the `git` CLI.
//! - [fileops]: batch file operations with per-item reports.
//! - [find]: recursive fuzzy search.
//! - [proc]: shell commands.
//! - [worker]: background threads and their tagged messages.
//! - [terminal]: terminal setup/teardown and the main event loop.

pub mod fileops;
pub mod find;
pub mod fm;
pub mod formatter;
pub mod fs;
pub mod git;
pub mod proc;
pub mod terminal;
pub mod worker;

pub use fm::{Entry, EntryKind, list_directory};
pub use formatter::{
    PreviewContent, format_attributes, format_file_size, format_file_time, read_preview,
    sanitize_to_exact_width,
};
pub use fs::{FileSystem, LocalFs};
pub use git::{GitCli, GitInfo, GitProvider, GitStatus};
