//! Mode state machine for rove.
//!
//! [Mode] is the top-level modal state. It only changes through [Mode::transition] with an
//! explicit [ModeEvent]; transitions that make no sense from the current mode are rejected
//! and leave it untouched. A successful transition may carry a [ModeOutcome] telling the
//! reducer what the user decided (a confirmed delete, a submitted name, a command line).
//!
//! Also home of [LineInput], the editable line shared by every text-taking mode.

use crate::core::find::FindResult;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fmt;
use std::path::PathBuf;

/// What a text input prompt is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPurpose {
    Rename,
    NewFile,
    NewDirectory,
    BookmarkName,
}

impl InputPurpose {
    pub fn prompt(self) -> &'static str {
        match self {
            InputPurpose::Rename => "Rename to",
            InputPurpose::NewFile => "New file",
            InputPurpose::NewDirectory => "New directory",
            InputPurpose::BookmarkName => "Bookmark name",
        }
    }
}

/// Action waiting behind a yes/no prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingConfirm {
    Delete(Vec<PathBuf>),
}

/// Deep search overlay state.
#[derive(Debug, Clone, Default)]
pub struct DeepSearch {
    pub input: LineInput,
    pub results: Vec<FindResult>,
    pub selected: usize,
}

impl DeepSearch {
    pub fn selected_result(&self) -> Option<&FindResult> {
        self.results.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.results.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

#[derive(Debug, Clone, Default)]
pub enum Mode {
    #[default]
    Normal,
    Search {
        input: LineInput,
    },
    DeepSearch(DeepSearch),
    Command {
        input: LineInput,
        /// Position while walking the history, `None` when editing a fresh line.
        history_index: Option<usize>,
    },
    Confirm {
        prompt: String,
        pending: PendingConfirm,
    },
    TextInput {
        purpose: InputPurpose,
        input: LineInput,
    },
    Help {
        scroll: usize,
    },
    Bookmarks {
        selected: usize,
    },
}

/// Mode without payload, for comparisons and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Normal,
    Search,
    DeepSearch,
    Command,
    Confirm,
    TextInput,
    Help,
    Bookmarks,
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModeKind::Normal => "normal",
            ModeKind::Search => "search",
            ModeKind::DeepSearch => "deepSearch",
            ModeKind::Command => "command",
            ModeKind::Confirm => "confirm",
            ModeKind::TextInput => "textInput",
            ModeKind::Help => "help",
            ModeKind::Bookmarks => "bookmarks",
        };
        f.write_str(name)
    }
}

/// Named transition events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeEvent {
    EnterSearch { query: String },
    EnterDeepSearch,
    EnterCommand,
    EnterHelp,
    EnterBookmarks,
    RequestConfirm { prompt: String, pending: PendingConfirm },
    RequestInput { purpose: InputPurpose, initial: String },
    Cancel,
    ConfirmSubmit(bool),
    InputSubmit(String),
    ReturnToNormal,
}

impl ModeEvent {
    fn name(&self) -> &'static str {
        match self {
            ModeEvent::EnterSearch { .. } => "enterSearch",
            ModeEvent::EnterDeepSearch => "enterDeepSearch",
            ModeEvent::EnterCommand => "enterCommand",
            ModeEvent::EnterHelp => "enterHelp",
            ModeEvent::EnterBookmarks => "enterBookmarks",
            ModeEvent::RequestConfirm { .. } => "requestConfirm",
            ModeEvent::RequestInput { .. } => "requestInput",
            ModeEvent::Cancel => "cancel",
            ModeEvent::ConfirmSubmit(_) => "confirmSubmit",
            ModeEvent::InputSubmit(_) => "inputSubmit",
            ModeEvent::ReturnToNormal => "returnToNormal",
        }
    }
}

/// What the user decided, reported alongside the new mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeOutcome {
    Confirmed(PendingConfirm),
    Declined,
    Input { purpose: InputPurpose, value: String },
    Command(String),
    SearchCommitted,
    SearchCancelled,
    DeepSearchClosed,
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub mode: Mode,
    pub outcome: Option<ModeOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{event} is not allowed in {from} mode")]
pub struct IllegalTransition {
    pub from: ModeKind,
    pub event: &'static str,
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Normal => ModeKind::Normal,
            Mode::Search { .. } => ModeKind::Search,
            Mode::DeepSearch(_) => ModeKind::DeepSearch,
            Mode::Command { .. } => ModeKind::Command,
            Mode::Confirm { .. } => ModeKind::Confirm,
            Mode::TextInput { .. } => ModeKind::TextInput,
            Mode::Help { .. } => ModeKind::Help,
            Mode::Bookmarks { .. } => ModeKind::Bookmarks,
        }
    }

    #[inline]
    pub fn is_normal(&self) -> bool {
        matches!(self, Mode::Normal)
    }

    /// The editable line of the current mode, if it has one.
    pub fn input(&self) -> Option<&LineInput> {
        match self {
            Mode::Search { input }
            | Mode::Command { input, .. }
            | Mode::TextInput { input, .. } => Some(input),
            Mode::DeepSearch(ds) => Some(&ds.input),
            _ => None,
        }
    }

    pub fn input_mut(&mut self) -> Option<&mut LineInput> {
        match self {
            Mode::Search { input }
            | Mode::Command { input, .. }
            | Mode::TextInput { input, .. } => Some(input),
            Mode::DeepSearch(ds) => Some(&mut ds.input),
            _ => None,
        }
    }

    /// Computes the next mode for `event`.
    ///
    /// Entering any non-normal mode is only legal from normal. Cancel is legal from every
    /// non-normal mode, ConfirmSubmit only from confirm, InputSubmit only from the line
    /// editing modes. ReturnToNormal is always legal.
    pub fn transition(&self, event: ModeEvent) -> Result<Transition, IllegalTransition> {
        let illegal = |event: &ModeEvent| IllegalTransition {
            from: self.kind(),
            event: event.name(),
        };
        let to_normal = |outcome: Option<ModeOutcome>| Transition {
            mode: Mode::Normal,
            outcome,
        };
        let enter = |mode: Mode| Transition {
            mode,
            outcome: None,
        };

        match (self, event) {
            (Mode::Normal, ModeEvent::EnterSearch { query }) => Ok(enter(Mode::Search {
                input: LineInput::new(query),
            })),
            (Mode::Normal, ModeEvent::EnterDeepSearch) => {
                Ok(enter(Mode::DeepSearch(DeepSearch::default())))
            }
            (Mode::Normal, ModeEvent::EnterCommand) => Ok(enter(Mode::Command {
                input: LineInput::default(),
                history_index: None,
            })),
            (Mode::Normal, ModeEvent::EnterHelp) => Ok(enter(Mode::Help { scroll: 0 })),
            (Mode::Normal, ModeEvent::EnterBookmarks) => {
                Ok(enter(Mode::Bookmarks { selected: 0 }))
            }
            (Mode::Normal, ModeEvent::RequestConfirm { prompt, pending }) => {
                Ok(enter(Mode::Confirm { prompt, pending }))
            }
            (Mode::Normal, ModeEvent::RequestInput { purpose, initial }) => {
                Ok(enter(Mode::TextInput {
                    purpose,
                    input: LineInput::new(initial),
                }))
            }

            (_, ModeEvent::ReturnToNormal) => Ok(to_normal(None)),

            (Mode::Normal, event @ ModeEvent::Cancel) => Err(illegal(&event)),
            (Mode::Search { .. }, ModeEvent::Cancel) => {
                Ok(to_normal(Some(ModeOutcome::SearchCancelled)))
            }
            (Mode::DeepSearch(_), ModeEvent::Cancel) => {
                Ok(to_normal(Some(ModeOutcome::DeepSearchClosed)))
            }
            (Mode::Confirm { .. }, ModeEvent::Cancel) => {
                Ok(to_normal(Some(ModeOutcome::Declined)))
            }
            (_, ModeEvent::Cancel) => Ok(to_normal(None)),

            (Mode::Confirm { pending, .. }, ModeEvent::ConfirmSubmit(yes)) => {
                Ok(to_normal(Some(if yes {
                    ModeOutcome::Confirmed(pending.clone())
                } else {
                    ModeOutcome::Declined
                })))
            }

            (Mode::Search { .. }, ModeEvent::InputSubmit(_)) => {
                Ok(to_normal(Some(ModeOutcome::SearchCommitted)))
            }
            (Mode::DeepSearch(_), ModeEvent::InputSubmit(_)) => {
                Ok(to_normal(Some(ModeOutcome::DeepSearchClosed)))
            }
            (Mode::Command { .. }, ModeEvent::InputSubmit(line)) => {
                Ok(to_normal(Some(ModeOutcome::Command(line))))
            }
            (Mode::TextInput { purpose, .. }, ModeEvent::InputSubmit(value)) => {
                Ok(to_normal(Some(ModeOutcome::Input {
                    purpose: *purpose,
                    value,
                })))
            }

            (_, event) => Err(illegal(&event)),
        }
    }
}

/// Result of feeding a key to a [LineInput].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEdit {
    /// Text changed.
    Changed,
    /// Only the cursor moved.
    Moved,
    /// Key is not an editing key.
    Ignored,
}

/// Single-line text buffer with a cursor (byte offset, always on a char boundary).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineInput {
    buffer: String,
    cursor: usize,
}

impl LineInput {
    pub fn new(initial: impl Into<String>) -> Self {
        let buffer = initial.into();
        let cursor = buffer.len();
        LineInput { buffer, cursor }
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.buffer
    }

    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replaces the text and puts the cursor at the end.
    pub fn set(&mut self, value: impl Into<String>) {
        self.buffer = value.into();
        self.cursor = self.buffer.len();
    }

    pub fn insert(&mut self, ch: char) {
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn backspace(&mut self) -> bool {
        match self.buffer[..self.cursor].char_indices().next_back() {
            Some((prev, _)) => {
                self.buffer.remove(prev);
                self.cursor = prev;
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor < self.buffer.len() {
            self.buffer.remove(self.cursor);
            true
        } else {
            false
        }
    }

    pub fn left(&mut self) {
        if let Some((prev, _)) = self.buffer[..self.cursor].char_indices().next_back() {
            self.cursor = prev;
        }
    }

    pub fn right(&mut self) {
        if let Some(ch) = self.buffer[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.buffer.len();
    }

    /// Applies an editing key: printable characters, Backspace, Delete, Left, Right, Home,
    /// End, and Ctrl+u to clear the line.
    pub fn handle_key(&mut self, key: &KeyEvent) -> LineEdit {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('u') if ctrl => {
                if self.buffer.is_empty() {
                    LineEdit::Ignored
                } else {
                    self.set(String::new());
                    LineEdit::Changed
                }
            }
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.insert(c);
                LineEdit::Changed
            }
            KeyCode::Backspace => {
                if self.backspace() {
                    LineEdit::Changed
                } else {
                    LineEdit::Moved
                }
            }
            KeyCode::Delete => {
                if self.delete() {
                    LineEdit::Changed
                } else {
                    LineEdit::Moved
                }
            }
            KeyCode::Left => {
                self.left();
                LineEdit::Moved
            }
            KeyCode::Right => {
                self.right();
                LineEdit::Moved
            }
            KeyCode::Home => {
                self.home();
                LineEdit::Moved
            }
            KeyCode::End => {
                self.end();
                LineEdit::Moved
            }
            _ => LineEdit::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn entering_modes_only_from_normal() -> Result<(), IllegalTransition> {
        let search = Mode::Normal.transition(ModeEvent::EnterSearch {
            query: String::new(),
        })?;
        assert_eq!(search.mode.kind(), ModeKind::Search);

        let confirm = Mode::Normal.transition(ModeEvent::RequestConfirm {
            prompt: "Delete?".into(),
            pending: PendingConfirm::Delete(vec![]),
        })?;
        let err = confirm
            .mode
            .transition(ModeEvent::EnterSearch {
                query: String::new(),
            })
            .err();
        assert_eq!(
            err,
            Some(IllegalTransition {
                from: ModeKind::Confirm,
                event: "enterSearch"
            })
        );
        assert!(search.mode.transition(ModeEvent::EnterCommand).is_err());
        Ok(())
    }

    #[test]
    fn confirm_reports_decision() -> Result<(), IllegalTransition> {
        let pending = PendingConfirm::Delete(vec![PathBuf::from("/tmp/x")]);
        let confirm = Mode::Confirm {
            prompt: "Delete 1 item?".into(),
            pending: pending.clone(),
        };

        let yes = confirm.transition(ModeEvent::ConfirmSubmit(true))?;
        assert!(yes.mode.is_normal());
        assert_eq!(yes.outcome, Some(ModeOutcome::Confirmed(pending)));

        let no = confirm.transition(ModeEvent::ConfirmSubmit(false))?;
        assert_eq!(no.outcome, Some(ModeOutcome::Declined));

        let esc = confirm.transition(ModeEvent::Cancel)?;
        assert_eq!(esc.outcome, Some(ModeOutcome::Declined));

        assert!(confirm.transition(ModeEvent::InputSubmit("y".into())).is_err());
        Ok(())
    }

    #[test]
    fn submit_outcomes_per_mode() -> Result<(), IllegalTransition> {
        let text = Mode::Normal.transition(ModeEvent::RequestInput {
            purpose: InputPurpose::Rename,
            initial: "old.txt".into(),
        })?;
        assert_eq!(text.mode.input().map(LineInput::value), Some("old.txt"));
        let done = text.mode.transition(ModeEvent::InputSubmit("new.txt".into()))?;
        assert_eq!(
            done.outcome,
            Some(ModeOutcome::Input {
                purpose: InputPurpose::Rename,
                value: "new.txt".into()
            })
        );

        let cmd = Mode::Normal.transition(ModeEvent::EnterCommand)?;
        let run = cmd.mode.transition(ModeEvent::InputSubmit("cd /".into()))?;
        assert_eq!(run.outcome, Some(ModeOutcome::Command("cd /".into())));

        let search = Mode::Normal.transition(ModeEvent::EnterSearch {
            query: "ab".into(),
        })?;
        let cancelled = search.mode.transition(ModeEvent::Cancel)?;
        assert_eq!(cancelled.outcome, Some(ModeOutcome::SearchCancelled));
        Ok(())
    }

    #[test]
    fn cancel_from_normal_is_rejected_return_is_not() {
        assert!(Mode::Normal.transition(ModeEvent::Cancel).is_err());
        assert!(Mode::Normal.transition(ModeEvent::ConfirmSubmit(true)).is_err());
        assert!(Mode::Normal.transition(ModeEvent::ReturnToNormal).is_ok());
        assert!(
            Mode::Help { scroll: 3 }
                .transition(ModeEvent::ReturnToNormal)
                .is_ok_and(|t| t.mode.is_normal())
        );
    }

    #[test]
    fn line_input_edits_multibyte() {
        let mut input = LineInput::new("añb");
        input.left();
        input.left();
        assert_eq!(input.handle_key(&key(KeyCode::Backspace)), LineEdit::Changed);
        assert_eq!(input.value(), "ñb");
        assert_eq!(input.handle_key(&key(KeyCode::Delete)), LineEdit::Changed);
        assert_eq!(input.value(), "b");
        assert_eq!(input.handle_key(&key(KeyCode::Char('é'))), LineEdit::Changed);
        assert_eq!(input.value(), "éb");
        input.end();
        input.right();
        assert_eq!(input.cursor(), "éb".len());
        assert_eq!(
            input.handle_key(&KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL)),
            LineEdit::Changed
        );
        assert_eq!(input.value(), "");
        assert_eq!(input.handle_key(&key(KeyCode::Enter)), LineEdit::Ignored);
    }
}
