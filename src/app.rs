//! Application layer for rove.
//!
//! - [mode]: the modal state machine and the shared line editor.
//! - [keymap]: key combinations to logical [Action]s.
//! - [session]: current directory, listing, filter, cursor and multi-selection.
//! - [preview]: preview of the entry under the cursor.
//! - [clipboard] / [bookmarks]: small pieces of session state.
//! - [state] / [handlers]: [AppState] and its reducer.
//! - [commands]: the `:` command interpreter.
//! - [controller]: runs effects, owns the workers and feeds responses back.

pub mod bookmarks;
pub mod clipboard;
pub mod commands;
pub mod controller;
pub mod keymap;
pub mod mode;
pub mod preview;
pub mod session;
pub mod state;

mod handlers;

pub use controller::Controller;
pub use keymap::{Action, Keymap};
pub use mode::{Mode, ModeKind};
pub use session::Session;
pub use state::{AppState, Effect, Event};
