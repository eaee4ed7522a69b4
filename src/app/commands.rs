//! Command interpreter for rove.
//!
//! A typed line is split into words (single or double quotes group a word, so `rename ""`
//! passes one empty argument), the first word is looked up case-insensitively in [COMMANDS]
//! by name or alias, and the handler runs against a [CommandContext]. Handlers only read
//! state and dispatch events; they never edit entries themselves. Every failure comes back
//! as a [CommandOutcome] with `success == false`.

use crate::app::bookmarks::Bookmarks;
use crate::app::keymap::Action;
use crate::app::state::{AppState, Event};
use crate::config::Settings;
use crate::error::{Result, RoveError};
use crate::utils::{resolve_path, shorten_home_path};

use std::path::PathBuf;

/// Result of one command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl CommandOutcome {
    pub fn ok(message: Option<String>) -> Self {
        Self {
            success: true,
            message,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// What a handler can reach.
pub trait CommandContext {
    fn state(&self) -> &AppState;

    fn dispatch(&mut self, event: Event);

    fn navigate(&mut self, path: PathBuf) {
        self.dispatch(Event::Navigate(path));
    }

    fn refresh(&mut self) {
        self.dispatch(Event::Refresh { focus: None });
    }
}

/// Parsed arguments of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub args: Vec<String>,
    /// Raw text after the command word, untouched by quote handling.
    pub rest: String,
}

type Handler = fn(&Invocation, &mut dyn CommandContext) -> Result<Option<String>>;

pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub summary: &'static str,
    handler: Handler,
}

impl CommandSpec {
    fn matches(&self, word: &str) -> bool {
        self.name.eq_ignore_ascii_case(word)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(word))
    }
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "cd",
        aliases: &["goto"],
        usage: "cd [path]",
        summary: "Change directory (home without a path)",
        handler: cmd_cd,
    },
    CommandSpec {
        name: "mkdir",
        aliases: &["md", "newdir"],
        usage: "mkdir <name>",
        summary: "Create a directory",
        handler: cmd_mkdir,
    },
    CommandSpec {
        name: "touch",
        aliases: &["new", "nf"],
        usage: "touch <name>",
        summary: "Create an empty file",
        handler: cmd_touch,
    },
    CommandSpec {
        name: "rename",
        aliases: &["mv", "ren"],
        usage: "rename <new_name>",
        summary: "Rename the entry under the cursor",
        handler: cmd_rename,
    },
    CommandSpec {
        name: "bookmark",
        aliases: &["bm", "mark"],
        usage: "bookmark add|remove|list|go [name]",
        summary: "Manage bookmarks",
        handler: cmd_bookmark,
    },
    CommandSpec {
        name: "set",
        aliases: &["config"],
        usage: "set [key] [value]",
        summary: "Show or change a setting",
        handler: cmd_set,
    },
    CommandSpec {
        name: "open",
        aliases: &["o", "edit"],
        usage: "open",
        summary: "Open the entry under the cursor in the editor",
        handler: cmd_open,
    },
    CommandSpec {
        name: "yank",
        aliases: &["y", "copy"],
        usage: "yank",
        summary: "Copy targets to the clipboard",
        handler: cmd_yank,
    },
    CommandSpec {
        name: "cut",
        aliases: &["x"],
        usage: "cut",
        summary: "Cut targets to the clipboard",
        handler: cmd_cut,
    },
    CommandSpec {
        name: "paste",
        aliases: &["p"],
        usage: "paste",
        summary: "Paste the clipboard here",
        handler: cmd_paste,
    },
    CommandSpec {
        name: "delete",
        aliases: &["rm", "del"],
        usage: "delete",
        summary: "Delete targets",
        handler: cmd_delete,
    },
    CommandSpec {
        name: "select",
        aliases: &["sel"],
        usage: "select all|none",
        summary: "Mark every entry or clear the marks",
        handler: cmd_select,
    },
    CommandSpec {
        name: "search",
        aliases: &["filter"],
        usage: "search [query]",
        summary: "Filter the listing (clears without a query)",
        handler: cmd_search,
    },
    CommandSpec {
        name: "refresh",
        aliases: &["r", "reload"],
        usage: "refresh",
        summary: "Reload the current directory",
        handler: cmd_refresh,
    },
    CommandSpec {
        name: "home",
        aliases: &["~"],
        usage: "home",
        summary: "Go to the home directory",
        handler: cmd_home,
    },
    CommandSpec {
        name: "shell",
        aliases: &["!", "sh"],
        usage: "shell <command>",
        summary: "Run a shell command in the current directory",
        handler: cmd_shell,
    },
    CommandSpec {
        name: "help",
        aliases: &["h", "?"],
        usage: "help [command]",
        summary: "Show key bindings or a command's usage",
        handler: cmd_help,
    },
    CommandSpec {
        name: "quit",
        aliases: &["q", "exit"],
        usage: "quit",
        summary: "Quit rove",
        handler: cmd_quit,
    },
];

/// Finds a command by name or alias, ignoring case.
pub fn lookup(word: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|c| c.matches(word))
}

/// Runs one command line.
pub fn execute(line: &str, ctx: &mut dyn CommandContext) -> CommandOutcome {
    let (word, invocation) = match parse(line) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => return CommandOutcome::ok(None),
        Err(e) => return CommandOutcome::failure(e.user_message()),
    };
    let Some(spec) = lookup(&word) else {
        return CommandOutcome::failure(format!("Unknown command: {word}"));
    };
    tracing::debug!(command = spec.name, args = ?invocation.args, "running command");
    match (spec.handler)(&invocation, ctx) {
        Ok(message) => CommandOutcome::ok(message),
        Err(e) => CommandOutcome::failure(e.user_message()),
    }
}

/// Splits a line into the command word and its invocation. `None` for a blank line.
///
/// A leading `!` is the shell command even without a following space.
pub fn parse(line: &str) -> Result<Option<(String, Invocation)>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if let Some(rest) = line.strip_prefix('!') {
        let rest = rest.trim().to_string();
        let args = tokenize(&rest)?;
        return Ok(Some(("!".to_string(), Invocation { args, rest })));
    }

    let mut words = tokenize(line)?;
    if words.is_empty() {
        return Ok(None);
    }
    let word = words.remove(0);
    let rest = line
        .split_once(char::is_whitespace)
        .map(|(_, r)| r.trim().to_string())
        .unwrap_or_default();
    Ok(Some((word, Invocation { args: words, rest })))
}

/// Whitespace-separated words; quotes group and may produce empty words.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_word = true;
            }
            None if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(ch);
                in_word = true;
            }
        }
    }
    if quote.is_some() {
        return Err(RoveError::validation("Unterminated quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn usage(spec_name: &str) -> RoveError {
    let usage = lookup(spec_name).map_or(spec_name, |c| c.usage);
    RoveError::validation(format!("Usage: {usage}"))
}

/// The single argument, or a usage error.
fn single_arg<'a>(inv: &'a Invocation, name: &str) -> Result<&'a str> {
    match inv.args.as_slice() {
        [arg] if !arg.trim().is_empty() => Ok(arg.as_str()),
        _ => Err(usage(name)),
    }
}

fn no_args(inv: &Invocation, name: &str) -> Result<()> {
    if inv.args.is_empty() {
        Ok(())
    } else {
        Err(usage(name))
    }
}

// Handlers

fn cmd_cd(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    let target = match inv.args.as_slice() {
        [] => "~",
        [path] => path.as_str(),
        _ => return Err(usage("cd")),
    };
    let path = resolve_path(ctx.state().session().current_path(), target);
    if !path.is_dir() {
        return Err(RoveError::validation(format!(
            "Not a directory: {}",
            shorten_home_path(&path)
        )));
    }
    ctx.navigate(path);
    Ok(None)
}

fn create(
    inv: &Invocation,
    ctx: &mut dyn CommandContext,
    name: &str,
    is_dir: bool,
) -> Result<Option<String>> {
    let arg = single_arg(inv, name)?;
    let path = ctx.state().validate_new_name(arg)?;
    ctx.dispatch(Event::Create { path, is_dir });
    Ok(None)
}

fn cmd_mkdir(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    create(inv, ctx, "mkdir", true)
}

fn cmd_touch(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    create(inv, ctx, "touch", false)
}

fn cmd_rename(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    let name = single_arg(inv, "rename")?;
    let Some(from) = ctx.state().session().selected_path().map(PathBuf::from) else {
        return Err(RoveError::validation("Nothing selected"));
    };
    if from.file_name().is_some_and(|n| n == name.trim()) {
        return Ok(None);
    }
    let to = ctx.state().validate_new_name(name)?;
    ctx.dispatch(Event::Rename { from, to });
    Ok(None)
}

fn cmd_bookmark(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    let (sub, name) = match inv.args.as_slice() {
        [sub] => (sub.to_lowercase(), None),
        [sub, name] => (sub.to_lowercase(), Some(name.as_str())),
        _ => return Err(usage("bookmark")),
    };
    match (sub.as_str(), name) {
        ("add", name) => {
            let current = ctx.state().session().current_path().to_path_buf();
            let name = match name {
                Some(n) => n.to_string(),
                None => current
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| RoveError::validation("Usage: bookmark add <name>"))?,
            };
            Bookmarks::check_name(&name)?;
            ctx.dispatch(Event::BookmarkAdd {
                name,
                path: current,
            });
            Ok(None)
        }
        ("remove" | "rm", Some(name)) => {
            if ctx.state().bookmarks().get(name).is_none() {
                return Err(RoveError::validation(format!("No bookmark named '{name}'")));
            }
            ctx.dispatch(Event::BookmarkRemove(name.to_string()));
            Ok(None)
        }
        ("list" | "ls", None) => {
            let marks = ctx.state().bookmarks();
            if marks.is_empty() {
                return Ok(Some("No bookmarks".to_string()));
            }
            let listed: Vec<String> = marks
                .iter()
                .map(|(n, p)| format!("{n}={}", shorten_home_path(p)))
                .collect();
            Ok(Some(listed.join("  ")))
        }
        ("go", Some(name)) => {
            let Some(path) = ctx.state().bookmarks().get(name).map(PathBuf::from) else {
                return Err(RoveError::validation(format!("No bookmark named '{name}'")));
            };
            ctx.navigate(path);
            Ok(None)
        }
        _ => Err(usage("bookmark")),
    }
}

fn cmd_set(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    let current = ctx.state().settings();
    match inv.args.as_slice() {
        [] => {
            let all: Vec<String> = Settings::KEYS
                .iter()
                .filter_map(|k| current.get(k).map(|v| format!("{k}={v}")))
                .collect();
            Ok(Some(all.join("  ")))
        }
        [key] => current
            .get(key)
            .map(|v| Some(format!("{key} = {v}")))
            .ok_or_else(|| RoveError::config(format!("Unknown setting '{key}'"))),
        [key, value @ ..] => {
            let value = value.join(" ");
            let mut next = current.clone();
            next.set(key, &value)?;
            let shown = next.get(key).unwrap_or(value);
            ctx.dispatch(Event::ApplySettings(next));
            Ok(Some(format!("{key} = {shown}")))
        }
    }
}

fn action(
    inv: &Invocation,
    ctx: &mut dyn CommandContext,
    name: &str,
    action: Action,
) -> Result<Option<String>> {
    no_args(inv, name)?;
    ctx.dispatch(Event::Action(action));
    Ok(None)
}

fn cmd_open(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    if ctx.state().session().selected_entry().is_none() {
        return Err(RoveError::validation("Nothing selected"));
    }
    action(inv, ctx, "open", Action::Open)
}

fn cmd_yank(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    action(inv, ctx, "yank", Action::Copy)
}

fn cmd_cut(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    action(inv, ctx, "cut", Action::Cut)
}

fn cmd_paste(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    action(inv, ctx, "paste", Action::Paste)
}

fn cmd_delete(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    action(inv, ctx, "delete", Action::Delete)
}

fn cmd_select(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    let which = match single_arg(inv, "select")?.to_lowercase().as_str() {
        "all" => Action::SelectAll,
        "none" | "clear" => Action::ClearSelection,
        _ => return Err(usage("select")),
    };
    ctx.dispatch(Event::Action(which));
    Ok(None)
}

fn cmd_search(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    let query = inv.args.join(" ");
    ctx.dispatch(Event::SetSearch(query));
    let shown = ctx.state().session().filtered_len();
    Ok(Some(format!("{shown} matching")))
}

fn cmd_refresh(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    no_args(inv, "refresh")?;
    ctx.refresh();
    Ok(None)
}

fn cmd_home(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    action(inv, ctx, "home", Action::GoHome)
}

fn cmd_shell(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    if inv.rest.trim().is_empty() {
        return Err(usage("shell"));
    }
    ctx.dispatch(Event::Shell(inv.rest.clone()));
    Ok(None)
}

fn cmd_help(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    match inv.args.as_slice() {
        [] => {
            ctx.dispatch(Event::Action(Action::Help));
            Ok(None)
        }
        [word] => {
            let spec = lookup(word)
                .ok_or_else(|| RoveError::command(format!("Unknown command: {word}")))?;
            let aliases = if spec.aliases.is_empty() {
                String::new()
            } else {
                format!(" (aliases: {})", spec.aliases.join(", "))
            };
            Ok(Some(format!("{}: {}{aliases}", spec.usage, spec.summary)))
        }
        _ => Err(usage("help")),
    }
}

fn cmd_quit(inv: &Invocation, ctx: &mut dyn CommandContext) -> Result<Option<String>> {
    action(inv, ctx, "quit", Action::Quit)
}
