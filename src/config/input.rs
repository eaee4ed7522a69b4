//! Input configuration options for rove
//!
//! Defines the `[keys]` and `[editor]` sections of rove.toml. Every action has its own list
//! of key strings; a missing entry keeps that action's defaults.

use crate::app::keymap::Action;

use serde::Deserialize;

macro_rules! keys_table {
    ($($field:ident => $action:ident [$($key:literal),*]),+ $(,)?) => {
        /// Key strings per action, as written in the `[keys]` table.
        #[derive(Deserialize, Debug, Clone)]
        #[serde(default)]
        pub struct Keys {
            $($field: Vec<String>,)+
        }

        impl Default for Keys {
            fn default() -> Self {
                Keys {
                    $($field: vec![$($key.to_string()),*],)+
                }
            }
        }

        impl Keys {
            pub fn get(&self, action: Action) -> &[String] {
                match action {
                    $(Action::$action => &self.$field,)+
                }
            }

            pub fn defaults_for(action: Action) -> Vec<String> {
                match action {
                    $(Action::$action => vec![$($key.to_string()),*],)+
                }
            }
        }
    };
}

keys_table! {
    move_up          => MoveUp          ["k", "Up"],
    move_down        => MoveDown        ["j", "Down"],
    page_up          => PageUp          ["Ctrl+u", "PageUp"],
    page_down        => PageDown        ["Ctrl+d", "PageDown"],
    move_to_top      => MoveToTop       ["g", "Home"],
    move_to_bottom   => MoveToBottom    ["G", "End"],
    go_parent        => GoParent        ["h", "Left", "Backspace"],
    enter_selected   => EnterSelected   ["l", "Right", "Enter"],
    go_home          => GoHome          ["~"],
    toggle_selection => ToggleSelection ["Space"],
    select_all       => SelectAll       ["Ctrl+a"],
    clear_selection  => ClearSelection  ["Ctrl+c"],
    search           => Search          ["/"],
    deep_search      => DeepSearch      ["s", "Ctrl+f"],
    command          => Command         [":"],
    copy             => Copy            ["y"],
    cut              => Cut             ["x"],
    paste            => Paste           ["p"],
    delete           => Delete          ["d", "Delete"],
    rename           => Rename          ["r"],
    new_file         => NewFile         ["n"],
    new_directory    => NewDirectory    ["N"],
    open             => Open            ["o"],
    refresh          => Refresh         ["R", "Ctrl+r"],
    toggle_hidden    => ToggleHidden    ["."],
    add_bookmark     => AddBookmark     ["b"],
    bookmarks        => Bookmarks       ["B", "'"],
    preview_up       => PreviewUp       ["K"],
    preview_down     => PreviewDown     ["J"],
    clear_filter     => ClearFilter     ["Esc"],
    help             => Help            ["?"],
    quit             => Quit            ["q"],
}

/// Editor configuration options
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Editor {
    cmd: String,
}

impl Editor {
    pub fn new(cmd: impl Into<String>) -> Self {
        Editor { cmd: cmd.into() }
    }

    /// The configured command, or `vi` when blank.
    #[inline]
    pub fn cmd(&self) -> &str {
        let trimmed = self.cmd.trim();
        if trimmed.is_empty() { "vi" } else { trimmed }
    }

    pub fn exists(&self) -> bool {
        which::which(self.cmd()).is_ok()
    }
}

/// Defaults to `$EDITOR`, then `vi`.
impl Default for Editor {
    fn default() -> Self {
        Editor {
            cmd: std::env::var("EDITOR").unwrap_or_else(|_| "vi".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_has_default_keys() {
        let keys = Keys::default();
        for action in Action::ALL {
            assert!(!keys.get(action).is_empty(), "{} unbound", action.name());
            assert_eq!(keys.get(action), Keys::defaults_for(action).as_slice());
        }
    }

    #[test]
    fn partial_table_keeps_other_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let keys: Keys = toml::from_str(r#"quit = ["Ctrl+q"]"#)?;
        assert_eq!(keys.get(Action::Quit), ["Ctrl+q"]);
        assert_eq!(keys.get(Action::MoveUp), ["k", "Up"]);
        Ok(())
    }

    #[test]
    fn blank_editor_falls_back() {
        assert_eq!(Editor::new("  ").cmd(), "vi");
        assert_eq!(Editor::new("hx").cmd(), "hx");
    }
}
