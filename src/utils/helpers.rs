//! Helpers for rove.
//!
//! Home directory handling ("~" expansion and shortening), recursive copy for the
//! filesystem collaborator, and handing the terminal over to an external editor.

use crate::config::Editor;

use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::{fs, io};

/// The user's home directory.
pub fn get_home() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Expands a leading `~` to the home directory.
pub fn expand_home_path(input: &str) -> PathBuf {
    let input = input.trim();
    if input == "~" {
        return get_home().unwrap_or_else(|| PathBuf::from(input));
    }
    if let Some(rest) = input
        .strip_prefix("~/")
        .or_else(|| input.strip_prefix(&format!("~{MAIN_SEPARATOR}")))
        && let Some(home) = get_home()
    {
        return home.join(rest);
    }
    PathBuf::from(input)
}

/// Resolves a user-typed path against `base`: `~` is expanded, relative paths are joined,
/// and `.`/`..` components are folded lexically.
pub fn resolve_path(base: &Path, input: &str) -> PathBuf {
    let expanded = expand_home_path(input);
    let joined = if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Shortens the home directory prefix to "~" for display.
pub fn shorten_home_path<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();
    if let Some(home_dir) = get_home()
        && let Ok(stripped) = path.strip_prefix(&home_dir)
    {
        if stripped.as_os_str().is_empty() {
            return "~".to_string();
        }
        return format!("~{}{}", MAIN_SEPARATOR, stripped.display());
    }
    path.display().to_string()
}

/// Recursively copies files and directories from `src` to `dest`.
///
/// Symlinks are followed. The destination must not exist for directories to merge safely;
/// callers check for collisions first.
pub fn copy_recursive(src: &Path, dest: &Path) -> io::Result<()> {
    if src.is_dir() {
        fs::create_dir(dest)?;
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &dest.join(entry.file_name()))?;
        }
    } else {
        fs::copy(src, dest)?;
    }
    Ok(())
}

/// Opens a file in the configured editor.
///
/// Leaves raw mode and the alternate screen while the editor runs and restores both on
/// return, whatever the editor's exit status.
pub fn open_in_editor(editor: &Editor, file_path: &Path) -> io::Result<()> {
    use crossterm::{
        cursor, execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };

    let mut stdout = io::stdout();
    disable_raw_mode()?;
    execute!(stdout, LeaveAlternateScreen, cursor::Show)?;

    let mut parts = editor.cmd().split_whitespace();
    let program = parts.next().unwrap_or("vi");
    let status = std::process::Command::new(program)
        .args(parts)
        .arg(file_path)
        .status();

    execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
    enable_raw_mode()?;

    match status {
        Ok(s) if s.success() => Ok(()),
        Ok(s) => Err(io::Error::other(format!("{program} exited with {s}"))),
        Err(e) => Err(e),
    }
}
