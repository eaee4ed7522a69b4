//! Unified error type for rove.
//!
//! Worker primitives return `std::io::Result`; everything that crosses into the session
//! (command handlers, file operation validation, config loading) speaks [RoveError].

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RoveError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Git error: {0}")]
    Git(String),

    /// User input rejected before anything was touched.
    #[error("{0}")]
    Validation(String),

    #[error("Target exists: {}", .0.display())]
    TargetExists(PathBuf),

    #[error("{0}")]
    Command(String),
}

pub type Result<T> = std::result::Result<T, RoveError>;

impl RoveError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn git(msg: impl Into<String>) -> Self {
        Self::Git(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// Text shown in the message slot.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
