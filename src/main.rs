//! main.rs
//! Entry point for rove

use rove_tui::app::Controller;
use rove_tui::config::Config;
use rove_tui::core::{GitCli, LocalFs, terminal};
use rove_tui::logging;
use rove_tui::utils::cli::{CliAction, handle_args};
use rove_tui::utils::expand_home_path;

use std::path::PathBuf;
use std::sync::Arc;

fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let mut stdout = std::io::stdout();
        let _ = crossterm::execute!(
            stdout,
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show
        );

        eprintln!("\n[rove] Error occurred: {}", info);

        #[cfg(debug_assertions)]
        {
            let bt = std::backtrace::Backtrace::force_capture();
            eprintln!("\nStack Backtrace:\n{}", bt);
        }
    }));

    let action = handle_args();

    if let CliAction::Exit = action {
        return Ok(());
    }

    let _log_guard = logging::init();
    let config = Config::load();

    let start = match action {
        CliAction::RunAppAtPath(path_arg) => match resolve_start_dir(&path_arg) {
            Some(target) => target,
            None => {
                eprintln!("\n[rove] Error: Path '{}' cannot be opened.", path_arg);
                std::process::exit(1);
            }
        },
        _ => std::env::current_dir()?,
    };
    tracing::info!(path = %start.display(), "starting");

    let mut controller = Controller::new(
        &config,
        start,
        Arc::new(LocalFs),
        Arc::new(GitCli::new()),
    );
    terminal::run_terminal(&mut controller)?;

    if controller.state().settings().exit_to_cwd {
        println!("{}", controller.current_path().display());
    }
    Ok(())
}

/// Expands `~`, canonicalizes, and keeps the result only if it is a directory.
fn resolve_start_dir(arg: &str) -> Option<PathBuf> {
    let path = expand_home_path(arg).canonicalize().ok()?;
    path.is_dir().then_some(path)
}
