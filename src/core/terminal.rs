//! Terminal rendering and event loop for rove.
//!
//! Handles setup/teardown of raw mode and the alternate screen, redraws, and hands key and
//! resize events to the [Controller].

use crate::app::{Controller, Event as AppEvent};
use crate::ui;
use crate::utils::open_in_editor;

use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::Rect;

use std::{io, time::Duration};

/// Initializes the terminal in raw mode and alternate screen and runs the main event loop.
///
/// Blocks until quit. Returns an error if terminal setup or teardown fails.
pub fn run_terminal(controller: &mut Controller) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, controller);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, Show)?;
    result
}

/// Main event loop: applies worker responses, draws when something changed, polls input.
fn event_loop<B: Backend>(terminal: &mut Terminal<B>, controller: &mut Controller) -> io::Result<()>
where
    io::Error: From<<B as Backend>::Error>,
{
    let mut dirty = true;
    loop {
        dirty |= controller.tick();
        dirty |= sync_viewport(terminal, controller)?;

        if controller.state().should_quit() {
            break;
        }

        if dirty {
            terminal.draw(|f| ui::render(f, controller.state(), controller.keymap()))?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    controller.handle_key(key);
                    if let Some(path) = controller.take_open_request() {
                        let result =
                            open_in_editor(controller.editor(), &path).map_err(|e| e.to_string());
                        // full clear/reset
                        terminal.clear()?;
                        controller.dispatch(AppEvent::EditorClosed(result));
                    }
                    dirty = true;
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }
    }
    Ok(())
}

/// Tells the session how many list rows fit. Returns true if that changed.
fn sync_viewport<B: Backend>(
    terminal: &mut Terminal<B>,
    controller: &mut Controller,
) -> io::Result<bool>
where
    io::Error: From<<B as Backend>::Error>,
{
    let size = terminal.size()?;
    let rows = ui::list_rows(Rect::new(0, 0, size.width, size.height));
    if rows == controller.state().session().viewport() {
        return Ok(false);
    }
    controller.dispatch(AppEvent::Resize { rows });
    Ok(true)
}
