//! The main config loading module for rove.
//!
//! Handles loading and deserializing settings from `rove.toml`.
//!
//! [RawConfig] is what serde reads; it converts into the [Config] handed to the keymap and
//! the session at startup. Every section is optional and every field has a default, so a
//! partial file only overrides what it names.

use crate::config::{Editor, General, Keys, Settings};
use crate::error::{Result, RoveError};
use crate::utils::{expand_home_path, get_home};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{fs, io};

/// Raw configuration as read from the toml file.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct RawConfig {
    general: General,
    editor: Editor,
    keys: Keys,
    bookmarks: BTreeMap<String, String>,
}

/// Processed configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    settings: Settings,
    editor: Editor,
    keys: Keys,
    bookmarks: BTreeMap<String, PathBuf>,
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        let bookmarks = raw
            .bookmarks
            .into_iter()
            .map(|(name, path)| (name, expand_home_path(&path)))
            .collect();
        Self {
            settings: raw.general.into(),
            editor: raw.editor,
            keys: raw.keys,
            bookmarks,
        }
    }
}

impl Config {
    /// Loads the configuration from [Config::default_path].
    ///
    /// A missing file or a parse error falls back to the internal defaults; the problem is
    /// logged, never fatal.
    pub fn load() -> Self {
        let path = Self::default_path();
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "config unusable, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Reads and parses one file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str::<RawConfig>(content)
            .map(Config::from)
            .map_err(|e| RoveError::config(e.to_string()))
    }

    // Getters

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    #[inline]
    pub fn keys(&self) -> &Keys {
        &self.keys
    }

    #[inline]
    pub fn bookmarks(&self) -> &BTreeMap<String, PathBuf> {
        &self.bookmarks
    }

    /// Determine the configuration file path.
    /// Checks ROVE_CONFIG first, then XDG_CONFIG_HOME,
    /// then defaults to ~/.config/rove/rove.toml.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("ROVE_CONFIG") {
            return PathBuf::from(path);
        }
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
            && !xdg_config.is_empty()
        {
            return PathBuf::from(xdg_config).join("rove/rove.toml");
        }
        if let Some(home) = get_home() {
            return home.join(".config/rove/rove.toml");
        }
        PathBuf::from("rove.toml")
    }

    /// Writes the commented default configuration. Refuses to overwrite.
    pub fn generate_default(path: &Path) -> io::Result<()> {
        if path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Config file already exists at {}", path.display()),
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_TOML)
    }
}

const DEFAULT_TOML: &str = r##"# rove.toml - default configuration for rove
# Commented values are the internal defaults.

[general]
# show_hidden = false
# confirm_delete = true
# exit_to_cwd = false
# preview_max_bytes = 65536
# max_find_results = 2000
# page_size = 0            # 0 = one screen

# [editor]
# cmd = "vi"               # defaults to $EDITOR

# [bookmarks]
# home = "~"
# projects = "~/src"

# Key strings: "k", "G", "Enter", "Ctrl+d", "Alt+x", "<c-d>", "Shift+Tab", "F5".
# An uppercase letter means Shift+letter. When two actions share a key the one
# listed first below wins, and rove logs a warning.
[keys]
# move_up = ["k", "Up"]
# move_down = ["j", "Down"]
# page_up = ["Ctrl+u", "PageUp"]
# page_down = ["Ctrl+d", "PageDown"]
# move_to_top = ["g", "Home"]
# move_to_bottom = ["G", "End"]
# go_parent = ["h", "Left", "Backspace"]
# enter_selected = ["l", "Right", "Enter"]
# go_home = ["~"]
# toggle_selection = ["Space"]
# select_all = ["Ctrl+a"]
# clear_selection = ["Ctrl+c"]
# search = ["/"]
# deep_search = ["s", "Ctrl+f"]
# command = [":"]
# copy = ["y"]
# cut = ["x"]
# paste = ["p"]
# delete = ["d", "Delete"]
# rename = ["r"]
# new_file = ["n"]
# new_directory = ["N"]
# open = ["o"]
# refresh = ["R", "Ctrl+r"]
# toggle_hidden = ["."]
# add_bookmark = ["b"]
# bookmarks = ["B", "'"]
# preview_up = ["K"]
# preview_down = ["J"]
# clear_filter = ["Esc"]
# help = ["?"]
# quit = ["q"]
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::keymap::Action;
    use tempfile::tempdir;

    #[test]
    fn partial_file_keeps_defaults() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let config = Config::parse(
            r#"
            [general]
            show_hidden = true

            [keys]
            quit = ["Ctrl+q"]

            [bookmarks]
            etc = "/etc"
            "#,
        )?;

        assert!(config.settings().show_hidden);
        assert!(config.settings().confirm_delete);
        assert_eq!(config.keys().get(Action::Quit), ["Ctrl+q"]);
        assert_eq!(config.keys().get(Action::MoveDown), ["j", "Down"]);
        assert_eq!(config.bookmarks().get("etc"), Some(&PathBuf::from("/etc")));
        Ok(())
    }

    #[test]
    fn parse_errors_are_config_errors() {
        let err = Config::parse("[general\nshow_hidden = ").err();
        assert!(matches!(err, Some(RoveError::Config(_))));
    }

    #[test]
    fn generated_default_parses_and_is_not_overwritten()
    -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("nested/rove.toml");

        Config::generate_default(&path)?;
        let config = Config::load_from(&path)?;
        assert_eq!(config.settings(), &Settings::default());

        let err = Config::generate_default(&path).err().ok_or("overwrote config")?;
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        Ok(())
    }
}
