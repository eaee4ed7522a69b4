//! The general configuration settings for rove.
//!
//! [General] is the `[general]` table as deserialized from rove.toml. It converts into the
//! validated [Settings] the session consults, which is also what the `set` command mutates.

use crate::error::{Result, RoveError};

use serde::Deserialize;

/// Smallest accepted find result limit.
pub const MIN_FIND_RESULTS: usize = 15;
/// Default find result limit.
pub const DEFAULT_FIND_RESULTS: usize = 2000;
/// Largest accepted find result limit.
pub const MAX_FIND_RESULTS_LIMIT: usize = 1_000_000;
/// Default preview cap in bytes.
pub const DEFAULT_PREVIEW_BYTES: usize = 64 * 1024;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct General {
    show_hidden: bool,
    confirm_delete: bool,
    exit_to_cwd: bool,
    preview_max_bytes: usize,
    max_find_results: usize,
    page_size: usize,
}

impl Default for General {
    fn default() -> Self {
        General {
            show_hidden: false,
            confirm_delete: true,
            exit_to_cwd: false,
            preview_max_bytes: DEFAULT_PREVIEW_BYTES,
            max_find_results: DEFAULT_FIND_RESULTS,
            page_size: 0,
        }
    }
}

/// Behavior flags read by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub show_hidden: bool,
    pub confirm_delete: bool,
    pub exit_to_cwd: bool,
    pub preview_max_bytes: usize,
    pub max_find_results: usize,
    /// Rows per page move; 0 follows the viewport height.
    pub page_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        General::default().into()
    }
}

impl From<General> for Settings {
    fn from(g: General) -> Self {
        Settings {
            show_hidden: g.show_hidden,
            confirm_delete: g.confirm_delete,
            exit_to_cwd: g.exit_to_cwd,
            preview_max_bytes: g.preview_max_bytes.max(1),
            max_find_results: clamp_find_results(g.max_find_results),
            page_size: g.page_size,
        }
    }
}

impl Settings {
    /// Names accepted by `set`.
    pub const KEYS: [&'static str; 6] = [
        "show_hidden",
        "confirm_delete",
        "exit_to_cwd",
        "preview_max_bytes",
        "max_find_results",
        "page_size",
    ];

    /// Applies one `set <key> <value>`. camelCase spellings are accepted too.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = normalize_key(key);
        match key.as_str() {
            "show_hidden" => self.show_hidden = parse_bool(value)?,
            "confirm_delete" => self.confirm_delete = parse_bool(value)?,
            "exit_to_cwd" => self.exit_to_cwd = parse_bool(value)?,
            "preview_max_bytes" => self.preview_max_bytes = parse_usize(value)?.max(1),
            "max_find_results" => self.max_find_results = clamp_find_results(parse_usize(value)?),
            "page_size" => self.page_size = parse_usize(value)?,
            _ => {
                return Err(RoveError::config(format!(
                    "Unknown setting '{key}' (one of: {})",
                    Self::KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Current value of a setting as text.
    pub fn get(&self, key: &str) -> Option<String> {
        let key = normalize_key(key);
        Some(match key.as_str() {
            "show_hidden" => self.show_hidden.to_string(),
            "confirm_delete" => self.confirm_delete.to_string(),
            "exit_to_cwd" => self.exit_to_cwd.to_string(),
            "preview_max_bytes" => self.preview_max_bytes.to_string(),
            "max_find_results" => self.max_find_results.to_string(),
            "page_size" => self.page_size.to_string(),
            _ => return None,
        })
    }
}

fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.trim().chars() {
        if ch.is_uppercase() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else if ch == '-' {
            out.push('_');
        } else {
            out.push(ch);
        }
    }
    out
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(RoveError::validation(format!("Expected true/false, got '{other}'"))),
    }
}

fn parse_usize(value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| RoveError::validation(format!("Expected a number, got '{}'", value.trim())))
}

/// Clamps the find result limit into the supported range.
pub fn clamp_find_results(value: usize) -> usize {
    let clamped = value.clamp(MIN_FIND_RESULTS, MAX_FIND_RESULTS_LIMIT);
    if clamped != value {
        tracing::warn!(
            value,
            clamped,
            "max_find_results out of range ({}..={})",
            MIN_FIND_RESULTS,
            MAX_FIND_RESULTS_LIMIT
        );
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_accepts_both_spellings() -> Result<()> {
        let mut settings = Settings::default();
        assert!(settings.confirm_delete);

        settings.set("confirmDelete", "false")?;
        assert!(!settings.confirm_delete);
        settings.set("show_hidden", "on")?;
        assert!(settings.show_hidden);
        settings.set("showHidden", "0")?;
        assert!(!settings.show_hidden);
        assert_eq!(settings.get("exitToCwd").as_deref(), Some("false"));
        Ok(())
    }

    #[test]
    fn leading_capital_maps_to_same_key() -> Result<()> {
        assert_eq!(normalize_key("ShowHidden"), "show_hidden");
        assert_eq!(normalize_key("show-hidden"), "show_hidden");
        assert_eq!(normalize_key("maxFindResults"), "max_find_results");

        let mut settings = Settings::default();
        settings.set("ShowHidden", "true")?;
        assert!(settings.show_hidden);
        assert_eq!(settings.get("ConfirmDelete").as_deref(), Some("true"));
        Ok(())
    }

    #[test]
    fn set_rejects_bad_input_without_mutation() {
        let mut settings = Settings::default();
        let before = settings.clone();

        assert!(settings.set("show_hidden", "maybe").is_err());
        assert!(settings.set("page_size", "-3").is_err());
        assert!(settings.set("colour", "blue").is_err());
        assert_eq!(settings, before);
    }

    #[test]
    fn find_results_are_clamped() -> Result<()> {
        let mut settings = Settings::default();
        settings.set("max_find_results", "1")?;
        assert_eq!(settings.max_find_results, MIN_FIND_RESULTS);
        assert_eq!(clamp_find_results(500), 500);
        Ok(())
    }
}
