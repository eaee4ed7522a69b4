//! Keybinding resolution for rove.
//!
//! Maps normalized physical keys to logical [Action]s. The table is built from the `[keys]`
//! config section in the fixed declaration order of [Action::ALL]; when two actions claim
//! the same key combination the earlier action keeps it and the clash is recorded as a
//! [KeyConflict] for a startup warning.

use crate::config::Keys;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;
use std::fmt;

/// Logical actions reachable from normal mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    MoveToTop,
    MoveToBottom,
    GoParent,
    EnterSelected,
    GoHome,
    ToggleSelection,
    SelectAll,
    ClearSelection,
    Search,
    DeepSearch,
    Command,
    Copy,
    Cut,
    Paste,
    Delete,
    Rename,
    NewFile,
    NewDirectory,
    Open,
    Refresh,
    ToggleHidden,
    AddBookmark,
    Bookmarks,
    PreviewUp,
    PreviewDown,
    ClearFilter,
    Help,
    Quit,
}

impl Action {
    /// Declaration order. Earlier actions win key overlaps.
    pub const ALL: [Action; 32] = [
        Action::MoveUp,
        Action::MoveDown,
        Action::PageUp,
        Action::PageDown,
        Action::MoveToTop,
        Action::MoveToBottom,
        Action::GoParent,
        Action::EnterSelected,
        Action::GoHome,
        Action::ToggleSelection,
        Action::SelectAll,
        Action::ClearSelection,
        Action::Search,
        Action::DeepSearch,
        Action::Command,
        Action::Copy,
        Action::Cut,
        Action::Paste,
        Action::Delete,
        Action::Rename,
        Action::NewFile,
        Action::NewDirectory,
        Action::Open,
        Action::Refresh,
        Action::ToggleHidden,
        Action::AddBookmark,
        Action::Bookmarks,
        Action::PreviewUp,
        Action::PreviewDown,
        Action::ClearFilter,
        Action::Help,
        Action::Quit,
    ];

    /// Name used in the `[keys]` table.
    pub fn name(self) -> &'static str {
        match self {
            Action::MoveUp => "move_up",
            Action::MoveDown => "move_down",
            Action::PageUp => "page_up",
            Action::PageDown => "page_down",
            Action::MoveToTop => "move_to_top",
            Action::MoveToBottom => "move_to_bottom",
            Action::GoParent => "go_parent",
            Action::EnterSelected => "enter_selected",
            Action::GoHome => "go_home",
            Action::ToggleSelection => "toggle_selection",
            Action::SelectAll => "select_all",
            Action::ClearSelection => "clear_selection",
            Action::Search => "search",
            Action::DeepSearch => "deep_search",
            Action::Command => "command",
            Action::Copy => "copy",
            Action::Cut => "cut",
            Action::Paste => "paste",
            Action::Delete => "delete",
            Action::Rename => "rename",
            Action::NewFile => "new_file",
            Action::NewDirectory => "new_directory",
            Action::Open => "open",
            Action::Refresh => "refresh",
            Action::ToggleHidden => "toggle_hidden",
            Action::AddBookmark => "add_bookmark",
            Action::Bookmarks => "bookmarks",
            Action::PreviewUp => "preview_up",
            Action::PreviewDown => "preview_down",
            Action::ClearFilter => "clear_filter",
            Action::Help => "help",
            Action::Quit => "quit",
        }
    }

    /// One-line description for the help overlay.
    pub fn description(self) -> &'static str {
        match self {
            Action::MoveUp => "Move selection up",
            Action::MoveDown => "Move selection down",
            Action::PageUp => "Move one page up",
            Action::PageDown => "Move one page down",
            Action::MoveToTop => "Jump to first entry",
            Action::MoveToBottom => "Jump to last entry",
            Action::GoParent => "Go to parent directory",
            Action::EnterSelected => "Enter directory / open file",
            Action::GoHome => "Go to home directory",
            Action::ToggleSelection => "Toggle selection of entry",
            Action::SelectAll => "Select all visible entries",
            Action::ClearSelection => "Clear selection",
            Action::Search => "Filter current directory",
            Action::DeepSearch => "Fuzzy find below current directory",
            Action::Command => "Open command line",
            Action::Copy => "Copy to clipboard",
            Action::Cut => "Cut to clipboard",
            Action::Paste => "Paste clipboard here",
            Action::Delete => "Delete",
            Action::Rename => "Rename",
            Action::NewFile => "Create file",
            Action::NewDirectory => "Create directory",
            Action::Open => "Open in editor",
            Action::Refresh => "Reload directory",
            Action::ToggleHidden => "Show/hide hidden files",
            Action::AddBookmark => "Bookmark current directory",
            Action::Bookmarks => "Browse bookmarks",
            Action::PreviewUp => "Scroll preview up",
            Action::PreviewDown => "Scroll preview down",
            Action::ClearFilter => "Clear active filter",
            Action::Help => "Show key bindings",
            Action::Quit => "Quit",
        }
    }

    pub fn from_name(name: &str) -> Option<Action> {
        Action::ALL.into_iter().find(|a| a.name() == name)
    }
}

/// Key + modifiers, normalized so config strings and terminal events compare equal.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug)]
pub struct Key {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Key {
    /// Canonical form.
    ///
    /// Letters carry SHIFT exactly when uppercase, other characters never carry SHIFT
    /// (terminals disagree on reporting it for `?` or `:`), and Shift+Tab is BackTab.
    pub fn normalized(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let mut modifiers =
            modifiers & (KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT);
        let code = match code {
            KeyCode::Char(c) if c.is_alphabetic() => {
                if modifiers.contains(KeyModifiers::SHIFT) || c.is_uppercase() {
                    modifiers |= KeyModifiers::SHIFT;
                    KeyCode::Char(c.to_uppercase().next().unwrap_or(c))
                } else {
                    KeyCode::Char(c)
                }
            }
            KeyCode::Char(c) => {
                modifiers -= KeyModifiers::SHIFT;
                KeyCode::Char(c)
            }
            KeyCode::Tab if modifiers.contains(KeyModifiers::SHIFT) => {
                modifiers -= KeyModifiers::SHIFT;
                KeyCode::BackTab
            }
            KeyCode::BackTab => {
                modifiers -= KeyModifiers::SHIFT;
                KeyCode::BackTab
            }
            other => other,
        };
        Key { code, modifiers }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self::normalized(event.code, event.modifiers)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            write!(f, "Ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            write!(f, "Alt+")?;
        }
        match self.code {
            // Uppercase letters already show the shift
            KeyCode::Char(' ') => write!(f, "Space"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::F(n) => write!(f, "F{n}"),
            KeyCode::BackTab => write!(f, "Shift+Tab"),
            KeyCode::PageUp => write!(f, "PageUp"),
            KeyCode::PageDown => write!(f, "PageDown"),
            other => {
                if self.modifiers.contains(KeyModifiers::SHIFT) {
                    write!(f, "Shift+")?;
                }
                write!(f, "{other:?}")
            }
        }
    }
}

/// Two actions declared the same key; `winner` keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConflict {
    pub key: Key,
    pub winner: Action,
    pub shadowed: Action,
}

impl fmt::Display for KeyConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "key {} is bound to both '{}' and '{}'; '{}' wins",
            self.key,
            self.winner.name(),
            self.shadowed.name(),
            self.winner.name()
        )
    }
}

/// Stores the mapping from [Key] to [Action]. Holds no transient state.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    map: HashMap<Key, Action>,
    bindings: Vec<(Action, Vec<Key>)>,
    conflicts: Vec<KeyConflict>,
    invalid: Vec<String>,
}

impl Keymap {
    /// Builds the keymap from the `[keys]` table.
    pub fn from_keys(keys: &Keys) -> Self {
        let mut map = HashMap::new();
        let mut bindings = Vec::with_capacity(Action::ALL.len());
        let mut conflicts = Vec::new();
        let mut invalid = Vec::new();

        for action in Action::ALL {
            let configured = keys.get(action);
            let mut parsed = bind_list(configured, &mut invalid);

            // A list where nothing parsed falls back to the defaults for that action.
            if parsed.is_empty() && !configured.is_empty() {
                tracing::warn!(action = action.name(), "no usable keys, using defaults");
                parsed = bind_list(&Keys::defaults_for(action), &mut invalid);
            }

            for key in &parsed {
                match map.get(key) {
                    Some(&winner) if winner != action => conflicts.push(KeyConflict {
                        key: *key,
                        winner,
                        shadowed: action,
                    }),
                    Some(_) => {}
                    None => {
                        map.insert(*key, action);
                    }
                }
            }
            bindings.push((action, parsed));
        }

        for conflict in &conflicts {
            tracing::warn!("{conflict}");
        }

        Keymap {
            map,
            bindings,
            conflicts,
            invalid,
        }
    }

    /// Replaces the whole table.
    pub fn reload(&mut self, keys: &Keys) {
        *self = Self::from_keys(keys);
    }

    /// Looks up the action for a raw key event.
    pub fn resolve(&self, event: &KeyEvent) -> Option<Action> {
        self.map.get(&Key::from_event(event)).copied()
    }

    pub fn conflicts(&self) -> &[KeyConflict] {
        &self.conflicts
    }

    /// Key strings that failed to parse.
    pub fn invalid(&self) -> &[String] {
        &self.invalid
    }

    /// Effective bindings per action in declaration order, for the help overlay.
    pub fn bindings(&self) -> impl Iterator<Item = (Action, String)> + '_ {
        self.bindings.iter().map(|(action, keys)| {
            let live: Vec<String> = keys
                .iter()
                .filter(|k| self.map.get(k) == Some(action))
                .map(|k| k.to_string())
                .collect();
            (*action, live.join(", "))
        })
    }
}

fn bind_list(list: &[String], invalid: &mut Vec<String>) -> Vec<Key> {
    let mut out = Vec::with_capacity(list.len());
    for s in list {
        match parse_key(s) {
            Some(key) => {
                if !out.contains(&key) {
                    out.push(key);
                }
            }
            None => {
                tracing::warn!(key = %s, "unparseable key binding skipped");
                invalid.push(s.clone());
            }
        }
    }
    out
}

/// Parses `k`, `G`, `Ctrl+d`, `Alt+x`, `<c-d>`, `<s-tab>`, named keys and `F1`..`F12`.
pub fn parse_key(s: &str) -> Option<Key> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    // A lone separator character is a literal key.
    if s == "+" || s == "-" || s == "<" || s == ">" {
        return Some(Key::normalized(
            KeyCode::Char(s.chars().next()?),
            KeyModifiers::NONE,
        ));
    }

    let mut modifiers = KeyModifiers::NONE;
    let is_bracketed = s.len() > 2 && s.starts_with('<') && s.ends_with('>');
    let mut input = if is_bracketed {
        s[1..s.len() - 1].to_string()
    } else {
        s.replace('-', "+")
    };

    if is_bracketed && input.len() > 1 && input.contains('-') {
        let parts: Vec<&str> = input.split('-').collect();
        for prefix in &parts[..parts.len() - 1] {
            match prefix.to_lowercase().as_str() {
                "c" | "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "a" | "m" | "alt" | "meta" => modifiers |= KeyModifiers::ALT,
                "s" | "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }
        input = parts.last()?.to_string();
    }

    let mut code: Option<KeyCode> = None;
    let parts: Vec<&str> = input.split('+').collect();
    let last = parts.len() - 1;
    for (i, part) in parts.iter().enumerate() {
        let p_low = part.to_lowercase();
        if i < last {
            match p_low.as_str() {
                "ctrl" | "control" | "c" => modifiers |= KeyModifiers::CONTROL,
                "alt" | "meta" | "m" | "a" => modifiers |= KeyModifiers::ALT,
                "shift" | "s" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
            continue;
        }

        code = Some(match p_low.as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "enter" | "return" | "cr" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "backspace" | "back" | "bs" => KeyCode::Backspace,
            "tab" => KeyCode::Tab,
            "backtab" => KeyCode::BackTab,
            "space" | "spc" => KeyCode::Char(' '),
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "delete" | "del" => KeyCode::Delete,
            "insert" | "ins" => KeyCode::Insert,
            _ => {
                let mut chars = part.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ if p_low.len() > 1
                        && p_low.starts_with('f')
                        && p_low[1..].chars().all(|c| c.is_ascii_digit()) =>
                    {
                        let n: u8 = p_low[1..].parse().ok()?;
                        if !(1..=12).contains(&n) {
                            return None;
                        }
                        KeyCode::F(n)
                    }
                    _ => return None,
                }
            }
        });
    }

    Some(Key::normalized(code?, modifiers))
}
