//! Miscellaneous utility functions for rove.
//!
//! - [cli]: argument parsing and the non-interactive flags.
//! - [helpers]: home path handling, path resolution, recursive copy and the editor hand-off.

pub mod cli;
pub mod helpers;

pub use helpers::{
    copy_recursive, expand_home_path, get_home, open_in_editor, resolve_path, shorten_home_path,
};
