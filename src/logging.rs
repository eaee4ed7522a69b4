//! Tracing setup for rove.
//!
//! The TUI owns stdout and stderr, so events go to a daily rolling file under the state
//! directory (`$XDG_STATE_HOME/rove`, falling back to the cache directory). The filter is
//! read from `ROVE_LOG` and defaults to `info`.

use std::fs;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const LOG_ENV: &str = "ROVE_LOG";
const LOG_PREFIX: &str = "rove.log";

/// Directory the log files are written to, if one can be determined.
pub fn log_dir() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .map(|dir| dir.join("rove"))
}

/// Installs the global subscriber. Call once near the start of `main`.
///
/// Returns the appender guard; dropping it flushes and stops the writer thread. Returns
/// `None` when no log directory is usable, in which case logging stays disabled.
pub fn init() -> Option<WorkerGuard> {
    let dir = log_dir()?;
    if let Err(e) = fs::create_dir_all(&dir) {
        eprintln!("[rove] logging disabled: cannot create {}: {e}", dir.display());
        return None;
    }

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, LOG_PREFIX));
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    if tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .is_err()
    {
        // another subscriber is already installed
        return None;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), dir = %dir.display(), "logging started");
    Some(guard)
}
