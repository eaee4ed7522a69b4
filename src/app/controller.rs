//! Controller for rove.
//!
//! Owns the [AppState], the [Keymap] and the [Workers]. Every input goes through
//! [Controller::dispatch]: the state is taken out, reduced, put back, and the returned
//! effects are executed. Worker responses are fed back as events by [Controller::tick].

use crate::app::commands::{self, CommandContext};
use crate::app::keymap::Keymap;
use crate::app::state::{AppState, Effect, Event};
use crate::config::{Config, Editor};
use crate::core::fs::FileSystem;
use crate::core::git::GitProvider;
use crate::core::worker::Workers;

use crossterm::event::KeyEvent;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct Controller {
    state: AppState,
    keymap: Keymap,
    workers: Workers,
    editor: Editor,
    pending_open: Option<PathBuf>,
}

impl Controller {
    /// Builds the controller and starts loading `start`.
    pub fn new(
        config: &Config,
        start: PathBuf,
        fs: Arc<dyn FileSystem>,
        git: Arc<dyn GitProvider>,
    ) -> Self {
        let mut controller = Self {
            state: AppState::new(config, start.clone()),
            keymap: Keymap::from_keys(config.keys()),
            workers: Workers::spawn(fs, git),
            editor: config.editor().clone(),
            pending_open: None,
        };
        if let Some(conflict) = controller.keymap.conflicts().first() {
            let more = controller.keymap.conflicts().len() - 1;
            let suffix = if more > 0 {
                format!(" (+{more} more, see rv --keybinds)")
            } else {
                String::new()
            };
            controller.state.error(format!("Keymap: {conflict}{suffix}"));
        }
        controller.dispatch(Event::Navigate(start));
        controller
    }

    // Getters / Accessors

    #[inline]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[inline]
    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    #[inline]
    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    #[inline]
    pub fn current_path(&self) -> &Path {
        self.state.session().current_path()
    }

    /// Routes a key: normal mode resolves it through the keymap, every other mode gets the
    /// raw key.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.state.mode().is_normal() {
            if let Some(action) = self.keymap.resolve(&key) {
                self.dispatch(Event::Action(action));
            }
        } else {
            self.dispatch(Event::Key(key));
        }
    }

    pub fn dispatch(&mut self, event: Event) {
        let state = std::mem::take(&mut self.state);
        let (next, effects) = state.apply(event);
        self.state = next;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Task(task) => self.workers.submit(task),
            Effect::RunCommand(line) => {
                let outcome = commands::execute(&line, self);
                if let Some(err) = &outcome.error {
                    tracing::info!(command = %line, error = %err, "command failed");
                }
                self.dispatch(Event::CommandFinished(outcome));
            }
            Effect::OpenEditor(path) => self.pending_open = Some(path),
            Effect::Quit => tracing::info!("quit requested"),
        }
    }

    /// Applies every waiting worker response and advances the message clock.
    ///
    /// Returns true if anything visible changed.
    pub fn tick(&mut self) -> bool {
        let rx = self.workers.response_rx().clone();
        let mut changed = false;
        while let Ok(response) = rx.try_recv() {
            self.dispatch(Event::Worker(response));
            changed = true;
        }
        let had_message = self.state.message().is_some();
        self.dispatch(Event::Tick(Instant::now()));
        changed || had_message != self.state.message().is_some()
    }

    /// Blocks until no request is outstanding or `timeout` passes. Returns whether the
    /// state settled.
    pub fn pump_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let rx = self.workers.response_rx().clone();
        while !self.state.is_idle() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            if let Ok(response) = rx.recv_timeout(remaining) {
                self.dispatch(Event::Worker(response));
            }
        }
        true
    }

    /// The file the reducer asked to open in the editor, if any.
    pub fn take_open_request(&mut self) -> Option<PathBuf> {
        self.pending_open.take()
    }
}

impl CommandContext for Controller {
    fn state(&self) -> &AppState {
        &self.state
    }

    fn dispatch(&mut self, event: Event) {
        Controller::dispatch(self, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::mode::ModeKind;
    use crate::core::fs::LocalFs;
    use crate::core::git::GitInfo;

    use crossterm::event::{KeyCode, KeyModifiers};
    use std::{error, fs};
    use tempfile::tempdir;

    struct NoGit;

    impl GitProvider for NoGit {
        fn git_info(&self, _dir: &Path) -> GitInfo {
            GitInfo::NotRepository
        }
    }

    fn press(c: &mut Controller, code: KeyCode) {
        c.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn keys_route_by_mode() -> Result<(), Box<dyn error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.txt"), "a")?;
        fs::write(dir.path().join("b.txt"), "b")?;

        let mut c = Controller::new(
            &Config::default(),
            dir.path().to_path_buf(),
            Arc::new(LocalFs),
            Arc::new(NoGit),
        );
        assert!(c.pump_until_idle(Duration::from_secs(5)));
        assert_eq!(c.state().session().entries().len(), 2);

        press(&mut c, KeyCode::Char('j'));
        assert_eq!(c.state().session().selected_index(), 1);

        press(&mut c, KeyCode::Char(':'));
        assert_eq!(c.state().mode().kind(), ModeKind::Command);
        // 'j' is text in command mode.
        press(&mut c, KeyCode::Char('j'));
        assert_eq!(c.state().session().selected_index(), 1);
        press(&mut c, KeyCode::Esc);
        assert!(c.state().mode().is_normal());

        press(&mut c, KeyCode::Enter);
        assert_eq!(c.take_open_request(), Some(dir.path().join("b.txt")));
        assert_eq!(c.take_open_request(), None);
        Ok(())
    }

    #[test]
    fn typed_command_runs_through_interpreter() -> Result<(), Box<dyn error::Error>> {
        let dir = tempdir()?;
        let mut c = Controller::new(
            &Config::default(),
            dir.path().to_path_buf(),
            Arc::new(LocalFs),
            Arc::new(NoGit),
        );
        assert!(c.pump_until_idle(Duration::from_secs(5)));

        press(&mut c, KeyCode::Char(':'));
        for ch in "mkdir logs".chars() {
            press(&mut c, KeyCode::Char(ch));
        }
        press(&mut c, KeyCode::Enter);
        assert!(c.pump_until_idle(Duration::from_secs(5)));

        assert!(dir.path().join("logs").is_dir());
        assert_eq!(
            c.state().session().selected_entry().map(|e| e.name()),
            Some("logs")
        );
        assert_eq!(c.state().history(), ["mkdir logs"]);
        Ok(())
    }
}
