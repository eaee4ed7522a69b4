//! External process helpers.
//!
//! [run_shell] backs the `shell` / `!` command: it runs a line through the platform shell in
//! the current directory, captures output and condenses it into a [ShellOutput] for the
//! message slot.

use std::path::Path;
use std::process::Command;

/// Outcome of a shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ShellOutput {
    /// First non-empty output line, stdout preferred on success and stderr on failure.
    pub fn headline(&self) -> String {
        let first_line = |s: &str| {
            s.lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(str::to_string)
        };

        if self.success {
            first_line(&self.stdout).unwrap_or_else(|| "Command finished".to_string())
        } else {
            first_line(&self.stderr)
                .or_else(|| first_line(&self.stdout))
                .unwrap_or_else(|| match self.exit_code {
                    Some(code) => format!("Command failed with exit code {code}"),
                    None => "Command terminated by signal".to_string(),
                })
        }
    }
}

/// Runs `command` with `sh -c` (or `cmd /C` on Windows) in `cwd`.
pub fn run_shell(command: &str, cwd: &Path) -> std::io::Result<ShellOutput> {
    let output = if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", command]).current_dir(cwd).output()?
    } else {
        Command::new("sh").args(["-c", command]).current_dir(cwd).output()?
    };

    Ok(ShellOutput {
        success: output.status.success(),
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
