//! Application state for rove.
//!
//! [AppState] is the committed snapshot the renderer reads. It only changes through
//! [AppState::apply], which consumes the state and an [Event] and returns the next state
//! plus the [Effect]s the controller must run. Effects are the only way out of the reducer:
//! worker tasks, command lines, editor hand-off and quitting.
//!
//! The reducer itself lives in the handlers module.

use crate::app::bookmarks::Bookmarks;
use crate::app::clipboard::Clipboard;
use crate::app::commands::CommandOutcome;
use crate::app::keymap::Action;
use crate::app::mode::Mode;
use crate::app::preview::PreviewState;
use crate::app::session::Session;
use crate::config::{Config, Settings};
use crate::core::worker::{WorkerResponse, WorkerTask};

use crossterm::event::KeyEvent;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

/// How long an info message stays up.
pub const INFO_TTL: Duration = Duration::from_secs(3);
/// How long an error message stays up.
pub const ERROR_TTL: Duration = Duration::from_secs(6);
/// Command lines kept for history walking.
pub const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// The single user-visible message slot.
///
/// The expiry clock starts at the first tick after the message is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub severity: Severity,
    pub shown_since: Option<Instant>,
}

impl Message {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Info,
            shown_since: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Error,
            shown_since: None,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        let ttl = match self.severity {
            Severity::Info => INFO_TTL,
            Severity::Error => ERROR_TTL,
        };
        self.shown_since
            .is_some_and(|since| now.saturating_duration_since(since) >= ttl)
    }
}

/// Deep search bookkeeping outside the mode payload.
#[derive(Debug, Default)]
pub struct FindState {
    pub(super) request_id: u64,
    pub(super) cancel: Option<Arc<AtomicBool>>,
}

/// Inputs to the reducer.
#[derive(Debug)]
pub enum Event {
    /// Raw key outside normal mode.
    Key(KeyEvent),
    /// Resolved normal-mode action.
    Action(Action),
    Navigate(PathBuf),
    Refresh { focus: Option<String> },
    Resize { rows: usize },
    Tick(Instant),
    Worker(WorkerResponse),
    CommandFinished(CommandOutcome),
    ApplySettings(Settings),
    Rename { from: PathBuf, to: PathBuf },
    Create { path: PathBuf, is_dir: bool },
    BookmarkAdd { name: String, path: PathBuf },
    BookmarkRemove(String),
    Shell(String),
    SetSearch(String),
    /// The external editor returned; the error text if it failed.
    EditorClosed(std::result::Result<(), String>),
}

/// Side effects requested by the reducer.
#[derive(Debug)]
pub enum Effect {
    Task(WorkerTask),
    RunCommand(String),
    OpenEditor(PathBuf),
    Quit,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub(super) session: Session,
    pub(super) preview: PreviewState,
    pub(super) mode: Mode,
    pub(super) clipboard: Option<Clipboard>,
    pub(super) bookmarks: Bookmarks,
    pub(super) settings: Settings,
    pub(super) message: Option<Message>,
    pub(super) find: FindState,
    pub(super) history: Vec<String>,
    pub(super) op_request_id: u64,
    pub(super) shell_request_id: u64,
    pub(super) busy: usize,
    pub(super) should_quit: bool,
}

impl AppState {
    pub fn new(config: &Config, start: PathBuf) -> Self {
        Self {
            session: Session::new(start),
            settings: config.settings().clone(),
            bookmarks: Bookmarks::new(config.bookmarks().clone()),
            ..Self::default()
        }
    }

    // Getters / Accessors

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[inline]
    pub fn preview(&self) -> &PreviewState {
        &self.preview
    }

    #[inline]
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    #[inline]
    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    #[inline]
    pub fn bookmarks(&self) -> &Bookmarks {
        &self.bookmarks
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    #[inline]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Number of file operations and shell commands still running.
    #[inline]
    pub fn busy(&self) -> usize {
        self.busy
    }

    #[inline]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// False while any directory, git, preview or background operation is outstanding.
    pub fn is_idle(&self) -> bool {
        self.busy == 0
            && !self.session.is_loading()
            && !self.session.is_git_loading()
            && !self.preview.is_loading()
    }

    pub(super) fn info(&mut self, text: impl Into<String>) {
        self.message = Some(Message::info(text));
    }

    pub(super) fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!(message = %text, "error surfaced");
        self.message = Some(Message::error(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_expiry_starts_on_first_tick() {
        let start = Instant::now();
        let mut msg = Message::info("Copied 1 item");
        assert!(!msg.is_expired(start + Duration::from_secs(60)));
        msg.shown_since = Some(start);
        assert!(!msg.is_expired(start + Duration::from_secs(1)));
        assert!(msg.is_expired(start + INFO_TTL));

        let mut err = Message::error("denied");
        err.shown_since = Some(start);
        assert!(!err.is_expired(start + INFO_TTL));
        assert!(err.is_expired(start + ERROR_TTL));
    }
}
