//! UI renderer implementation.
//!
//! Contains the top-level `render` entry point used by the terminal loop and the layout
//! helpers that split the screen into header, list, preview and footer chunks.
//!
//! This module should stay pure rendering: it reads the state and produces widgets, without
//! owning any session logic.

use crate::app::{AppState, Keymap, Mode};
use crate::app::state::Severity;
use crate::core::formatter::{format_file_size, format_file_time, sanitize_to_exact_width};
use crate::core::{Entry, GitInfo};
use crate::ui::widgets;
use crate::utils::shorten_home_path;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use unicode_width::UnicodeWidthStr;

// Column widths of the entry list
const SIZE_COL: usize = 9;
const TIME_COL: usize = 19;
// Narrowest list that still gets the size and time columns
const COLUMNS_MIN_WIDTH: usize = 60;

/// Screen chunks of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunks {
    pub header: Rect,
    pub list: Rect,
    pub preview: Rect,
    pub footer: Rect,
}

/// Splits the frame into header, body (list | preview) and footer.
pub fn layout_chunks(area: Rect) -> Chunks {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);
    let [list, preview] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(body);
    Chunks {
        header,
        list,
        preview,
        footer,
    }
}

/// Number of entry rows the list pane shows for a frame of `area`. Never 0.
pub fn list_rows(area: Rect) -> usize {
    let list = layout_chunks(area).list;
    (list.height.saturating_sub(2) as usize).max(1)
}

/// Renders the whole frame for the current state.
pub fn render(frame: &mut Frame, state: &AppState, keymap: &Keymap) {
    let chunks = layout_chunks(frame.area());

    draw_header(frame, chunks.header, state);
    draw_list(frame, chunks.list, state);
    draw_preview(frame, chunks.preview, state);

    if let Some((prefix, input)) = widgets::prompt_line(state.mode()) {
        widgets::draw_input_line(frame, chunks.footer, &prefix, input);
    } else {
        draw_footer(frame, chunks.footer, state);
    }

    match state.mode() {
        Mode::Confirm { prompt, pending } => widgets::draw_confirm_popup(frame, prompt, pending),
        Mode::Help { scroll } => widgets::draw_help(frame, keymap, *scroll),
        Mode::Bookmarks { selected } => {
            widgets::draw_bookmarks(frame, state.bookmarks(), *selected)
        }
        Mode::DeepSearch(deep) => {
            widgets::draw_deep_search(frame, deep, state.session().current_path())
        }
        _ => {}
    }
}

fn draw_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let session = state.session();
    let mut spans = vec![Span::styled(
        format!(" {}", shorten_home_path(session.current_path())),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];

    if let GitInfo::Repository {
        branch, is_clean, ..
    } = session.git()
    {
        let dirty = if *is_clean { "" } else { "*" };
        spans.push(Span::styled(
            format!("  {branch}{dirty}"),
            Style::default().fg(Color::Magenta),
        ));
    }

    if session.is_loading() {
        spans.push(Span::styled(
            "  loading...",
            Style::default().fg(Color::Yellow),
        ));
    }
    if state.busy() > 0 {
        spans.push(Span::styled(
            format!("  [{} running]", state.busy()),
            Style::default().fg(Color::Yellow),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_list(frame: &mut Frame, area: Rect, state: &AppState) {
    let session = state.session();
    let title = if session.query().is_empty() {
        format!(" {}/{} ", selected_position(state), session.filtered_len())
    } else {
        format!(
            " /{} {}/{} ",
            session.query(),
            selected_position(state),
            session.filtered_len()
        )
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if session.filtered_len() == 0 {
        let placeholder = if session.is_loading() {
            "Loading..."
        } else {
            "[Empty]"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(placeholder, Style::default().fg(Color::DarkGray)))
                .block(block),
            area,
        );
        return;
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = session
        .visible_entries()
        .map(|(_, entry)| {
            let marked = session.is_marked(entry.path());
            ListItem::new(entry_line(entry, marked, inner_width))
        })
        .collect();

    let mut list_state = ListState::default().with_selected(Some(
        session
            .selected_index()
            .saturating_sub(session.scroll_offset()),
    ));
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn selected_position(state: &AppState) -> usize {
    let session = state.session();
    if session.filtered_len() == 0 {
        0
    } else {
        session.selected_index() + 1
    }
}

/// One row: mark, git tag, name, then size and time when there is room.
fn entry_line(entry: &Entry, marked: bool, width: usize) -> Line<'static> {
    let mark = if marked { '*' } else { ' ' };
    let git = entry.git_status().map(|s| s.marker()).unwrap_or(' ');

    let name = if entry.is_dir() {
        format!("{}/", entry.name())
    } else {
        entry.name().to_string()
    };
    let name_style = if entry.is_dir() {
        Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
    } else if entry.is_symlink() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::styled(mark.to_string(), Style::default().fg(Color::Yellow)),
        Span::styled(git.to_string(), Style::default().fg(Color::Magenta)),
        Span::raw(" "),
    ];

    let rest = width.saturating_sub(3);
    if width >= COLUMNS_MIN_WIDTH {
        let name_width = rest.saturating_sub(SIZE_COL + TIME_COL + 2);
        let size = format_file_size(entry.size(), entry.is_dir());
        let time = format_file_time(entry.modified());
        spans.push(Span::styled(sanitize_to_exact_width(&name, name_width), name_style));
        spans.push(Span::raw(format!(
            " {} ",
            sanitize_to_exact_width(&format!("{size:>SIZE_COL$}"), SIZE_COL)
        )));
        spans.push(Span::styled(
            sanitize_to_exact_width(&time, TIME_COL),
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.push(Span::styled(sanitize_to_exact_width(&name, rest), name_style));
    }
    Line::from(spans)
}

fn draw_preview(frame: &mut Frame, area: Rect, state: &AppState) {
    let preview = state.preview();
    let title = preview
        .path()
        .and_then(|p| p.file_name())
        .map(|n| format!(" {} ", n.to_string_lossy()))
        .unwrap_or_else(|| " Preview ".to_string());
    let block = Block::default().borders(Borders::ALL).title(title);

    let width = area.width.saturating_sub(2) as usize;
    let height = area.height.saturating_sub(2) as usize;
    let dim = Style::default().fg(Color::DarkGray);

    let lines: Vec<Line> = if preview.is_loading() {
        vec![Line::styled("Loading...", dim)]
    } else if state.session().selected_entry().is_some_and(Entry::is_dir) {
        vec![Line::styled("[Directory]", dim)]
    } else if preview.content().is_binary {
        vec![Line::styled("[Binary file]", dim)]
    } else {
        let content = preview.content();
        let mut lines: Vec<Line> = content
            .content
            .lines()
            .skip(preview.scroll())
            .take(height)
            .map(|l| Line::raw(sanitize_to_exact_width(l, width)))
            .collect();
        if content.truncated && lines.len() < height {
            lines.push(Line::styled("[truncated]", dim));
        }
        lines
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_footer(frame: &mut Frame, area: Rect, state: &AppState) {
    let session = state.session();
    let mode = state.mode().kind().to_string();

    let mut right = String::new();
    if session.selection_len() > 0 {
        right.push_str(&format!("{} selected  ", session.selection_len()));
    }
    if let Some(clip) = state.clipboard() {
        let op = if clip.is_cut() { "cut" } else { "copied" };
        right.push_str(&format!("{} {op}  ", clip.len()));
    }
    right.push_str(&format!("[{mode}] "));

    let (text, style) = match state.message() {
        Some(msg) => {
            let color = match msg.severity {
                Severity::Info => Color::Green,
                Severity::Error => Color::Red,
            };
            (msg.text.as_str(), Style::default().fg(color))
        }
        None => ("", Style::default()),
    };

    let width = area.width as usize;
    let right_width = right.width().min(width);
    let left_width = width - right_width;
    let line = Line::from(vec![
        Span::styled(sanitize_to_exact_width(&format!(" {text}"), left_width), style),
        Span::styled(right, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    use ratatui::{Terminal, backend::TestBackend};
    use std::{error, path::PathBuf};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn layout_splits_rows_and_columns() {
        let area = Rect::new(0, 0, 100, 30);
        let chunks = layout_chunks(area);
        assert_eq!(chunks.header.height, 1);
        assert_eq!(chunks.footer.height, 1);
        assert_eq!(chunks.footer.y, 29);
        assert_eq!(chunks.list.height, 28);
        assert_eq!(chunks.list.width + chunks.preview.width, 100);
        assert_eq!(list_rows(area), 26);
    }

    #[test]
    fn list_rows_never_zero() {
        assert_eq!(list_rows(Rect::new(0, 0, 10, 2)), 1);
        assert_eq!(list_rows(Rect::new(0, 0, 0, 0)), 1);
    }

    #[test]
    fn empty_directory_renders_placeholder() -> Result<(), Box<dyn error::Error>> {
        let config = Config::default();
        let state = AppState::new(&config, PathBuf::from("/nowhere"));
        let keymap = Keymap::from_keys(config.keys());

        let mut terminal = Terminal::new(TestBackend::new(80, 20))?;
        terminal.draw(|f| render(f, &state, &keymap))?;
        let text = buffer_text(&terminal);

        assert!(text.contains("/nowhere"));
        assert!(text.contains("[Empty]"));
        assert!(text.contains("[normal]"));
        Ok(())
    }

    #[test]
    fn entry_line_fits_width() {
        let entry = Entry::new(PathBuf::from("/tmp/notes.txt"), crate::core::EntryKind::File);
        for width in [10, 40, 80, 120] {
            let line = entry_line(&entry, true, width);
            assert_eq!(line.width(), width.max(3));
        }
    }
}
