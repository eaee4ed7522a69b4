//! Command-line argument parsing and help for rove.
//!
//! `rv` with no arguments opens the current directory; `rv PATH` opens PATH. The remaining
//! flags print something or write the default config and exit.

use crate::app::keymap::Keymap;
use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    RunApp,
    RunAppAtPath(String),
    Init,
    Keybinds,
    Help,
    Version,
    Invalid(String),
    Exit,
}

/// Parses arguments (without the program name).
pub fn parse_args<I, S>(args: I) -> CliAction
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    match args.as_slice() {
        [] => CliAction::RunApp,
        [arg] => match arg.as_str() {
            "-v" | "--version" => CliAction::Version,
            "-h" | "--help" => CliAction::Help,
            "--keybinds" | "--keys" => CliAction::Keybinds,
            "--init" => CliAction::Init,
            a if !a.starts_with('-') && !a.trim().is_empty() => {
                CliAction::RunAppAtPath(a.to_string())
            }
            a => CliAction::Invalid(format!("Unknown argument: {a}")),
        },
        _ => CliAction::Invalid("rove accepts only one argument at a time.".to_string()),
    }
}

/// Parses the process arguments and handles every flag that does not start the TUI.
///
/// Returns [CliAction::RunApp], [CliAction::RunAppAtPath] or [CliAction::Exit].
pub fn handle_args() -> CliAction {
    match parse_args(std::env::args().skip(1)) {
        action @ (CliAction::RunApp | CliAction::RunAppAtPath(_)) => return action,
        CliAction::Version => println!("rove {}", env!("CARGO_PKG_VERSION")),
        CliAction::Help => print_help(),
        CliAction::Keybinds => print_keybinds(&Config::load()),
        CliAction::Init => {
            let path = Config::default_path();
            match Config::generate_default(&path) {
                Ok(()) => println!("Default config generated at {}", path.display()),
                Err(e) => eprintln!("Error: {e}"),
            }
        }
        CliAction::Invalid(msg) => {
            eprintln!("Error: {msg}");
            eprintln!("Usage: rv [PATH] or rv [OPTION]. Try --help.");
        }
        CliAction::Exit => {}
    }
    CliAction::Exit
}

fn print_help() {
    println!(
        r#"rove - a keyboard-driven terminal file browser

USAGE:
  rv [PATH]

PATH:
  Directory to open (defaults to the current directory)

OPTIONS:
      --init              Generate the default configuration file
      --keybinds          Print the effective key bindings
  -h, --help              Print help information
  -v, --version           Print the version

ENVIRONMENT:
  ROVE_CONFIG             Override the config file path
  ROVE_LOG                Log filter, e.g. "debug" or "rove_tui=trace""#
    );
}

fn print_keybinds(config: &Config) {
    let keymap = Keymap::from_keys(config.keys());
    println!("{:<20} {:<28} DESCRIPTION", "ACTION", "KEYS");
    for (action, keys) in keymap.bindings() {
        println!("{:<20} {:<28} {}", action.name(), keys, action.description());
    }
    for conflict in keymap.conflicts() {
        println!("warning: {conflict}");
    }
}
