//! The reducer for rove.
//!
//! This module implements [AppState::apply] and the per-mode key handling, action handling
//! and worker response handling behind it. Everything here mutates the owned state and
//! pushes [Effect]s; nothing here touches the filesystem or the terminal.

use crate::app::clipboard::{ClipOp, Clipboard};
use crate::app::commands::CommandOutcome;
use crate::app::keymap::Action;
use crate::app::mode::{
    InputPurpose, LineEdit, Mode, ModeEvent, ModeKind, ModeOutcome, PendingConfirm, Transition,
};
use crate::app::session::LoadOutcome;
use crate::app::state::{AppState, Effect, Event, HISTORY_LIMIT};
use crate::config::Settings;
use crate::core::fileops::{self, BatchReport, FileOperation, OpKind};
use crate::core::worker::{WorkerResponse, WorkerTask};
use crate::error::{Result, RoveError};
use crate::utils::{get_home, shorten_home_path};

use crossterm::event::{KeyCode::*, KeyEvent, KeyModifiers};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

type Effects = Vec<Effect>;

impl AppState {
    /// Applies one event and returns the next state with the effects to run.
    ///
    /// After every event the preview is brought in line with the cursor.
    pub fn apply(mut self, event: Event) -> (Self, Effects) {
        let mut fx = Effects::new();
        match event {
            Event::Key(key) => self.handle_mode_key(key, &mut fx),
            Event::Action(action) => self.handle_action(action, &mut fx),
            Event::Navigate(path) => self.navigate(path, None, &mut fx),
            Event::Refresh { focus } => self.refresh(focus, &mut fx),
            Event::Resize { rows } => self.session.set_viewport(rows),
            Event::Tick(now) => self.tick(now),
            Event::Worker(response) => self.handle_response(response, &mut fx),
            Event::CommandFinished(outcome) => self.finish_command(outcome),
            Event::ApplySettings(settings) => self.apply_settings(settings, &mut fx),
            Event::Rename { from, to } => {
                self.submit_op(FileOperation::Rename { from, to }, &mut fx)
            }
            Event::Create { path, is_dir } => {
                self.submit_op(FileOperation::Create { path, is_dir }, &mut fx)
            }
            Event::BookmarkAdd { name, path } => match self.bookmarks.add(&name, path) {
                Ok(()) => self.info(format!("Bookmarked '{name}'")),
                Err(e) => self.error(e.user_message()),
            },
            Event::BookmarkRemove(name) => match self.bookmarks.remove(&name) {
                Ok(_) => self.info(format!("Removed bookmark '{name}'")),
                Err(e) => self.error(e.user_message()),
            },
            Event::Shell(command) => self.run_shell(command, &mut fx),
            Event::SetSearch(query) => self.session.set_search_query(&query),
            Event::EditorClosed(result) => {
                if let Err(e) = result {
                    self.error(format!("Editor failed: {e}"));
                }
                self.refresh(None, &mut fx);
            }
        }
        self.sync_preview(&mut fx);
        (self, fx)
    }

    /// Checks a name for a new or renamed entry in the current directory.
    ///
    /// Returns the full target path. Nothing is mutated on failure.
    pub fn validate_new_name(&self, name: &str) -> Result<PathBuf> {
        fileops::validate_name(name)?;
        let name = name.trim();
        let target = self.session.current_path().join(name);
        if self.session.entries().iter().any(|e| e.name() == name) {
            return Err(RoveError::TargetExists(target));
        }
        Ok(target)
    }

    // Mode plumbing

    fn transition(&mut self, event: ModeEvent) -> Option<ModeOutcome> {
        match self.mode.transition(event) {
            Ok(Transition { mode, outcome }) => {
                self.mode = mode;
                outcome
            }
            Err(e) => {
                tracing::debug!(error = %e, "mode transition rejected");
                None
            }
        }
    }

    fn edit_line(&mut self, key: &KeyEvent) -> Option<String> {
        let input = self.mode.input_mut()?;
        (input.handle_key(key) == LineEdit::Changed).then(|| input.value().to_string())
    }

    fn line_value(&self) -> String {
        self.mode
            .input()
            .map(|i| i.value().to_string())
            .unwrap_or_default()
    }

    // Per-mode key handling

    fn handle_mode_key(&mut self, key: KeyEvent, fx: &mut Effects) {
        match self.mode.kind() {
            // Normal mode keys are resolved to actions by the controller.
            ModeKind::Normal => {}
            ModeKind::Search => self.search_key(key),
            ModeKind::DeepSearch => self.deep_search_key(key, fx),
            ModeKind::Command => self.command_key(key, fx),
            ModeKind::Confirm => self.confirm_key(key, fx),
            ModeKind::TextInput => self.text_input_key(key, fx),
            ModeKind::Help => self.help_key(key),
            ModeKind::Bookmarks => self.bookmarks_key(key, fx),
        }
    }

    fn search_key(&mut self, key: KeyEvent) {
        match key.code {
            Enter => {
                let value = self.line_value();
                self.transition(ModeEvent::InputSubmit(value));
            }
            Esc => {
                if let Some(ModeOutcome::SearchCancelled) = self.transition(ModeEvent::Cancel) {
                    self.session.set_search_query("");
                }
            }
            _ => {
                if let Some(query) = self.edit_line(&key) {
                    self.session.set_search_query(&query);
                }
            }
        }
    }

    fn deep_search_key(&mut self, key: KeyEvent, fx: &mut Effects) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            Esc => {
                self.cancel_find();
                self.transition(ModeEvent::Cancel);
            }
            Enter => {
                let picked = match &self.mode {
                    Mode::DeepSearch(ds) => ds.selected_result().map(|r| r.path().to_path_buf()),
                    _ => None,
                };
                self.cancel_find();
                let value = self.line_value();
                self.transition(ModeEvent::InputSubmit(value));
                if let Some(path) = picked
                    && let Some(parent) = path.parent()
                {
                    let focus = path.file_name().map(|n| n.to_string_lossy().into_owned());
                    self.navigate(parent.to_path_buf(), focus, fx);
                }
            }
            Up | BackTab => self.move_find_cursor(false),
            Down | Tab => self.move_find_cursor(true),
            Char('p') if ctrl => self.move_find_cursor(false),
            Char('n') if ctrl => self.move_find_cursor(true),
            _ => {
                if let Some(query) = self.edit_line(&key) {
                    self.start_find(query, fx);
                }
            }
        }
    }

    fn move_find_cursor(&mut self, down: bool) {
        if let Mode::DeepSearch(ds) = &mut self.mode {
            if down {
                ds.select_next();
            } else {
                ds.select_prev();
            }
        }
    }

    fn command_key(&mut self, key: KeyEvent, fx: &mut Effects) {
        match key.code {
            Enter => {
                let line = self.line_value();
                if let Some(ModeOutcome::Command(line)) =
                    self.transition(ModeEvent::InputSubmit(line))
                    && !line.trim().is_empty()
                {
                    self.push_history(&line);
                    fx.push(Effect::RunCommand(line));
                }
            }
            Esc => {
                self.transition(ModeEvent::Cancel);
            }
            Up => self.walk_history(true),
            Down => self.walk_history(false),
            _ => {
                if self.edit_line(&key).is_some()
                    && let Mode::Command { history_index, .. } = &mut self.mode
                {
                    *history_index = None;
                }
            }
        }
    }

    fn push_history(&mut self, line: &str) {
        if self.history.last().map(String::as_str) != Some(line) {
            self.history.push(line.to_string());
        }
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }

    fn walk_history(&mut self, back: bool) {
        let len = self.history.len();
        let Mode::Command {
            input,
            history_index,
        } = &mut self.mode
        else {
            return;
        };
        if len == 0 {
            return;
        }
        let next = match (*history_index, back) {
            (None, true) => Some(len - 1),
            (Some(i), true) => Some(i.saturating_sub(1)),
            (Some(i), false) if i + 1 < len => Some(i + 1),
            (_, false) => None,
        };
        *history_index = next;
        input.set(next.map(|i| self.history[i].clone()).unwrap_or_default());
    }

    fn confirm_key(&mut self, key: KeyEvent, fx: &mut Effects) {
        let answer = match key.code {
            Char('y') | Char('Y') => true,
            Char('n') | Char('N') | Esc => false,
            _ => return,
        };
        match self.transition(ModeEvent::ConfirmSubmit(answer)) {
            Some(ModeOutcome::Confirmed(PendingConfirm::Delete(paths))) => {
                self.submit_op(FileOperation::Delete(paths), fx);
            }
            Some(ModeOutcome::Declined) => self.info("Delete cancelled"),
            _ => {}
        }
    }

    fn text_input_key(&mut self, key: KeyEvent, fx: &mut Effects) {
        match key.code {
            Enter => {
                let value = self.line_value();
                if let Some(ModeOutcome::Input { purpose, value }) =
                    self.transition(ModeEvent::InputSubmit(value))
                {
                    self.submit_input(purpose, value, fx);
                }
            }
            Esc => {
                self.transition(ModeEvent::Cancel);
            }
            _ => {
                self.edit_line(&key);
            }
        }
    }

    fn submit_input(&mut self, purpose: InputPurpose, value: String, fx: &mut Effects) {
        let value = value.trim().to_string();
        match purpose {
            InputPurpose::Rename => {
                let Some(from) = self.session.selected_path().map(Path::to_path_buf) else {
                    return;
                };
                if from.file_name().is_some_and(|n| n == value.as_str()) {
                    return;
                }
                match self.validate_new_name(&value) {
                    Ok(to) => self.submit_op(FileOperation::Rename { from, to }, fx),
                    Err(e) => self.error(e.user_message()),
                }
            }
            InputPurpose::NewFile | InputPurpose::NewDirectory => {
                match self.validate_new_name(&value) {
                    Ok(path) => {
                        let is_dir = purpose == InputPurpose::NewDirectory;
                        self.submit_op(FileOperation::Create { path, is_dir }, fx);
                    }
                    Err(e) => self.error(e.user_message()),
                }
            }
            InputPurpose::BookmarkName => {
                let path = self.session.current_path().to_path_buf();
                match self.bookmarks.add(&value, path) {
                    Ok(()) => self.info(format!("Bookmarked '{value}'")),
                    Err(e) => self.error(e.user_message()),
                }
            }
        }
    }

    fn help_key(&mut self, key: KeyEvent) {
        let max = Action::ALL.len().saturating_sub(1);
        match key.code {
            Esc | Char('q') | Char('?') => {
                self.transition(ModeEvent::ReturnToNormal);
            }
            Char('j') | Down => {
                if let Mode::Help { scroll } = &mut self.mode {
                    *scroll = (*scroll + 1).min(max);
                }
            }
            Char('k') | Up => {
                if let Mode::Help { scroll } = &mut self.mode {
                    *scroll = scroll.saturating_sub(1);
                }
            }
            _ => {}
        }
    }

    fn bookmarks_key(&mut self, key: KeyEvent, fx: &mut Effects) {
        let Mode::Bookmarks { selected } = self.mode else {
            return;
        };
        let len = self.bookmarks.len();
        match key.code {
            Esc | Char('q') => {
                self.transition(ModeEvent::ReturnToNormal);
            }
            Char('j') | Down => self.mode = Mode::Bookmarks {
                selected: (selected + 1).min(len.saturating_sub(1)),
            },
            Char('k') | Up => self.mode = Mode::Bookmarks {
                selected: selected.saturating_sub(1),
            },
            Enter => {
                let target = self.bookmarks.nth(selected).map(|(_, p)| p.to_path_buf());
                self.transition(ModeEvent::ReturnToNormal);
                if let Some(path) = target {
                    self.navigate(path, None, fx);
                }
            }
            Char('d') => {
                let Some(name) = self.bookmarks.nth(selected).map(|(n, _)| n.to_string()) else {
                    return;
                };
                if self.bookmarks.remove(&name).is_ok() {
                    self.info(format!("Removed bookmark '{name}'"));
                }
                self.mode = Mode::Bookmarks {
                    selected: selected.min(self.bookmarks.len().saturating_sub(1)),
                };
            }
            _ => {}
        }
    }

    // Normal mode actions

    fn handle_action(&mut self, action: Action, fx: &mut Effects) {
        if !self.mode.is_normal() {
            tracing::debug!(?action, mode = %self.mode.kind(), "action ignored outside normal");
            return;
        }
        let page_size = self.settings.page_size;
        match action {
            Action::MoveUp => self.session.move_selection(-1),
            Action::MoveDown => self.session.move_selection(1),
            Action::PageUp => self.session.page_move(-1, page_size),
            Action::PageDown => self.session.page_move(1, page_size),
            Action::MoveToTop => self.session.move_to_top(),
            Action::MoveToBottom => self.session.move_to_bottom(),

            Action::GoParent => {
                let current = self.session.current_path();
                if let Some(parent) = current.parent() {
                    let focus = current.file_name().map(|n| n.to_string_lossy().into_owned());
                    self.navigate(parent.to_path_buf(), focus, fx);
                }
            }
            Action::EnterSelected => {
                let Some(entry) = self.session.selected_entry() else {
                    return;
                };
                let path = entry.path().to_path_buf();
                if entry.is_dir() {
                    self.navigate(path, None, fx);
                } else {
                    fx.push(Effect::OpenEditor(path));
                }
            }
            Action::GoHome => match get_home() {
                Some(home) => self.navigate(home, None, fx),
                None => self.error("Home directory not found"),
            },

            Action::ToggleSelection => {
                if let Some(path) = self.session.selected_path().map(Path::to_path_buf) {
                    self.session.toggle_selection(&path);
                    self.session.move_selection(1);
                }
            }
            Action::SelectAll => self.session.select_all(),
            Action::ClearSelection => self.session.clear_selection(),

            Action::Search => {
                let query = self.session.query().to_string();
                self.transition(ModeEvent::EnterSearch { query });
            }
            Action::DeepSearch => {
                self.transition(ModeEvent::EnterDeepSearch);
            }
            Action::Command => {
                self.transition(ModeEvent::EnterCommand);
            }
            Action::Help => {
                self.transition(ModeEvent::EnterHelp);
            }
            Action::Bookmarks => {
                self.transition(ModeEvent::EnterBookmarks);
            }

            Action::Copy => self.fill_clipboard(ClipOp::Copy),
            Action::Cut => self.fill_clipboard(ClipOp::Cut),
            Action::Paste => self.paste(fx),
            Action::Delete => self.request_delete(fx),
            Action::Rename => {
                if let Some(name) = self.session.selected_entry().map(|e| e.name().to_string()) {
                    self.transition(ModeEvent::RequestInput {
                        purpose: InputPurpose::Rename,
                        initial: name,
                    });
                }
            }
            Action::NewFile => self.request_input(InputPurpose::NewFile, String::new()),
            Action::NewDirectory => self.request_input(InputPurpose::NewDirectory, String::new()),
            Action::AddBookmark => {
                let name = self
                    .session
                    .current_path()
                    .file_name()
                    .map(|n| n.to_string_lossy().replace(char::is_whitespace, "_"))
                    .unwrap_or_default();
                self.request_input(InputPurpose::BookmarkName, name);
            }

            Action::Open => {
                if let Some(path) = self.session.selected_path() {
                    fx.push(Effect::OpenEditor(path.to_path_buf()));
                }
            }
            Action::Refresh => self.refresh(None, fx),
            Action::ToggleHidden => {
                self.settings.show_hidden = !self.settings.show_hidden;
                let state = if self.settings.show_hidden {
                    "shown"
                } else {
                    "hidden"
                };
                self.info(format!("Hidden files {state}"));
                self.refresh(None, fx);
            }
            Action::PreviewUp => self.preview.scroll_by(-1),
            Action::PreviewDown => self.preview.scroll_by(1),
            Action::ClearFilter => {
                if !self.session.query().is_empty() {
                    self.session.set_search_query("");
                }
                self.message = None;
            }
            Action::Quit => {
                self.should_quit = true;
                fx.push(Effect::Quit);
            }
        }
    }

    fn request_input(&mut self, purpose: InputPurpose, initial: String) {
        self.transition(ModeEvent::RequestInput { purpose, initial });
    }

    fn fill_clipboard(&mut self, op: ClipOp) {
        let targets = self.session.action_targets();
        if targets.is_empty() {
            return;
        }
        let verb = match op {
            ClipOp::Copy => "Copied",
            ClipOp::Cut => "Cut",
        };
        self.info(format!("{verb} {}", describe_count(targets.len())));
        self.clipboard = Some(Clipboard::new(op, targets));
    }

    /// Pastes the clipboard into the current directory. The clipboard is consumed
    /// whatever the per-item outcome.
    fn paste(&mut self, fx: &mut Effects) {
        let Some(clip) = self.clipboard.take() else {
            self.info("Clipboard is empty");
            return;
        };
        let op = FileOperation::Paste {
            cut: clip.is_cut(),
            entries: clip.into_entries(),
            dest_dir: self.session.current_path().to_path_buf(),
        };
        self.submit_op(op, fx);
    }

    fn request_delete(&mut self, fx: &mut Effects) {
        let targets = self.session.action_targets();
        let paths: Vec<PathBuf> = targets.iter().map(|e| e.path().to_path_buf()).collect();
        if paths.is_empty() {
            return;
        }
        if !self.settings.confirm_delete {
            self.submit_op(FileOperation::Delete(paths), fx);
            return;
        }
        let what = match targets.as_slice() {
            [single] => format!("'{}'", single.name()),
            _ => describe_count(targets.len()),
        };
        self.transition(ModeEvent::RequestConfirm {
            prompt: format!("Delete {what}? (y/n)"),
            pending: PendingConfirm::Delete(paths),
        });
    }

    // Requests

    fn navigate(&mut self, path: PathBuf, focus: Option<String>, fx: &mut Effects) {
        let task = self
            .session
            .navigate(path, self.settings.show_hidden, focus);
        fx.push(Effect::Task(task));
    }

    fn refresh(&mut self, focus: Option<String>, fx: &mut Effects) {
        if let Some(task) = self.session.refresh(self.settings.show_hidden, focus) {
            fx.push(Effect::Task(task));
        }
    }

    fn submit_op(&mut self, op: FileOperation, fx: &mut Effects) {
        self.op_request_id = self.op_request_id.wrapping_add(1);
        self.busy += 1;
        fx.push(Effect::Task(WorkerTask::FileOp {
            op,
            request_id: self.op_request_id,
        }));
    }

    fn run_shell(&mut self, command: String, fx: &mut Effects) {
        self.shell_request_id = self.shell_request_id.wrapping_add(1);
        self.busy += 1;
        fx.push(Effect::Task(WorkerTask::Shell {
            command,
            cwd: self.session.current_path().to_path_buf(),
            request_id: self.shell_request_id,
        }));
    }

    fn start_find(&mut self, query: String, fx: &mut Effects) {
        self.cancel_find();
        self.find.request_id = self.find.request_id.wrapping_add(1);
        if query.trim().is_empty() {
            if let Mode::DeepSearch(ds) = &mut self.mode {
                ds.results.clear();
                ds.selected = 0;
            }
            return;
        }
        let cancel = Arc::new(AtomicBool::new(false));
        self.find.cancel = Some(Arc::clone(&cancel));
        fx.push(Effect::Task(WorkerTask::FindRecursive {
            base_dir: self.session.current_path().to_path_buf(),
            query,
            max_results: self.settings.max_find_results,
            show_hidden: self.settings.show_hidden,
            cancel,
            request_id: self.find.request_id,
        }));
    }

    fn cancel_find(&mut self) {
        if let Some(cancel) = self.find.cancel.take() {
            cancel.store(true, Ordering::Relaxed);
        }
    }

    fn sync_preview(&mut self, fx: &mut Effects) {
        let max_bytes = self.settings.preview_max_bytes;
        if let Some(task) = self
            .preview
            .request(self.session.selected_entry(), max_bytes)
        {
            fx.push(Effect::Task(task));
        }
    }

    // Responses

    fn handle_response(&mut self, response: WorkerResponse, fx: &mut Effects) {
        match response {
            WorkerResponse::DirectoryLoaded {
                path,
                result,
                focus,
                request_id,
            } => match self
                .session
                .apply_listing(&path, request_id, result, focus.as_deref())
            {
                LoadOutcome::Committed => {
                    fx.push(Effect::Task(self.session.request_git()));
                    self.preview.invalidate();
                    // A refresh under an open search keeps the typed filter.
                    if let Mode::Search { input } = &self.mode {
                        let query = input.value().to_string();
                        self.session.set_search_query(&query);
                        if let Some(name) = focus {
                            self.session.focus_name(&name);
                        }
                    }
                }
                LoadOutcome::Stale => {}
                LoadOutcome::Failed(e) => {
                    self.error(format!("Cannot open {}: {e}", shorten_home_path(&path)));
                }
            },

            WorkerResponse::GitLoaded {
                path,
                info,
                request_id,
            } => {
                self.session.apply_git(&path, request_id, info);
            }

            WorkerResponse::PreviewLoaded {
                path,
                result,
                request_id,
            } => {
                self.preview
                    .apply(&path, request_id, result, self.session.selected_path());
            }

            WorkerResponse::FindResults {
                query,
                results,
                request_id,
                ..
            } => {
                let current = request_id == self.find.request_id;
                match &mut self.mode {
                    Mode::DeepSearch(ds) if current && ds.input.value() == query => {
                        ds.results = results;
                        ds.selected = 0;
                    }
                    _ => tracing::debug!(request_id, "stale find results"),
                }
            }

            WorkerResponse::OperationComplete { report, .. } => {
                self.busy = self.busy.saturating_sub(1);
                self.finish_op(report, fx);
            }

            WorkerResponse::ShellComplete {
                command, result, ..
            } => {
                self.busy = self.busy.saturating_sub(1);
                match result {
                    Ok(out) if out.success => self.info(out.headline()),
                    Ok(out) => self.error(out.headline()),
                    Err(e) => self.error(format!("{command}: {e}")),
                }
                self.refresh(None, fx);
            }
        }
    }

    fn finish_op(&mut self, report: BatchReport, fx: &mut Effects) {
        let summary = report.summary();
        if report.is_success() {
            self.info(summary);
        } else {
            self.error(summary);
        }
        if matches!(report.kind, OpKind::Move | OpKind::Delete) {
            self.session.unmark(&report.succeeded);
        }
        self.refresh(report.focus, fx);
    }

    fn finish_command(&mut self, outcome: CommandOutcome) {
        if let Some(err) = outcome.error {
            self.error(err);
        } else if let Some(msg) = outcome.message {
            self.info(msg);
        }
    }

    fn apply_settings(&mut self, settings: Settings, fx: &mut Effects) {
        let hidden_changed = settings.show_hidden != self.settings.show_hidden;
        self.settings = settings;
        if hidden_changed {
            // A pending navigation was issued with the old filter; reissue it.
            match self.session.pending_navigation().map(Path::to_path_buf) {
                Some(path) => self.navigate(path, None, fx),
                None => self.refresh(None, fx),
            }
        }
    }

    fn tick(&mut self, now: Instant) {
        let expired = match &mut self.message {
            Some(msg) if msg.shown_since.is_none() => {
                msg.shown_since = Some(now);
                false
            }
            Some(msg) => msg.is_expired(now),
            None => false,
        };
        if expired {
            self.message = None;
        }
    }
}

fn describe_count(n: usize) -> String {
    if n == 1 {
        "1 item".to_string()
    } else {
        format!("{n} items")
    }
}
