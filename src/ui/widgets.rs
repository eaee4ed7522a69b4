//! Overlay widgets for rove.
//!
//! Everything drawn on top of the main layout while a modal mode is active: the input
//! line, the delete confirmation, the help and bookmark lists and the deep-search results.

use crate::app::bookmarks::Bookmarks;
use crate::app::mode::{DeepSearch, LineInput, PendingConfirm};
use crate::app::{Keymap, Mode};
use crate::core::formatter::sanitize_to_exact_width;
use crate::utils::shorten_home_path;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use std::path::Path;
use unicode_width::UnicodeWidthStr;

/// Prefix and buffer of the prompt shown in the footer row, if the mode takes a line of
/// text there. Deep search draws its own query line.
pub fn prompt_line(mode: &Mode) -> Option<(String, &LineInput)> {
    match mode {
        Mode::Search { input } => Some(("/".to_string(), input)),
        Mode::Command { input, .. } => Some((":".to_string(), input)),
        Mode::TextInput { purpose, input } => Some((format!("{}: ", purpose.prompt()), input)),
        _ => None,
    }
}

/// Draws a single-line prompt and puts the terminal cursor on the input cursor.
///
/// Long input scrolls horizontally so the cursor stays visible.
pub fn draw_input_line(frame: &mut Frame, area: Rect, prefix: &str, input: &LineInput) {
    let width = area.width as usize;
    let prefix_width = prefix.width();
    let field_width = width.saturating_sub(prefix_width + 1);

    let (visible, cursor_col) = input_field_view(input.value(), input.cursor(), field_width);

    let line = Line::from(vec![
        Span::styled(prefix.to_string(), Style::default().fg(Color::Yellow)),
        Span::raw(visible.to_string()),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    let x = area.x + (prefix_width + cursor_col).min(width.saturating_sub(1)) as u16;
    frame.set_cursor_position(Position::new(x, area.y));
}

/// Slice of `text` that fits `width` columns with the cursor inside, and the cursor's column
/// within that slice.
fn input_field_view(text: &str, cursor: usize, width: usize) -> (&str, usize) {
    let cursor = cursor.min(text.len());
    let mut start = 0;
    while start < cursor && text[start..cursor].width() > width {
        start += text[start..].chars().next().map_or(1, char::len_utf8);
    }

    let mut end = start;
    for (i, ch) in text[start..].char_indices() {
        let next = start + i + ch.len_utf8();
        if text[start..next].width() > width {
            break;
        }
        end = next;
    }
    (&text[start..end], text[start..cursor].width())
}

/// Centered rectangle taking the given percentages of `area`.
pub fn popup_area(area: Rect, width_pct: u16, height_pct: u16) -> Rect {
    let side = (100 - height_pct.min(100)) / 2;
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage(side),
        Constraint::Percentage(height_pct),
        Constraint::Percentage(side),
    ])
    .areas(area);
    let side = (100 - width_pct.min(100)) / 2;
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage(side),
        Constraint::Percentage(width_pct),
        Constraint::Percentage(side),
    ])
    .areas(middle);
    center
}

/// Yes/no prompt with the names it applies to.
pub fn draw_confirm_popup(frame: &mut Frame, prompt: &str, pending: &PendingConfirm) {
    let PendingConfirm::Delete(targets) = pending;
    let area = popup_area(frame.area(), 50, 40);
    let inner_width = area.width.saturating_sub(2) as usize;

    let mut lines = vec![
        Line::styled(prompt.to_string(), Style::default().add_modifier(Modifier::BOLD)),
        Line::styled("─".repeat(inner_width), Style::default().fg(Color::Red)),
    ];
    let room = area.height.saturating_sub(4) as usize;
    for path in targets.iter().take(room) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        lines.push(Line::raw(sanitize_to_exact_width(
            &format!("  - {name}"),
            inner_width,
        )));
    }
    if targets.len() > room {
        lines.push(Line::raw(format!("  ... and {} more", targets.len() - room)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" Confirm Delete ", Style::default().fg(Color::Red)))
        .border_style(Style::default().fg(Color::Red));

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Left),
        area,
    );
}

/// Keybinding reference, scrolled by `scroll` rows.
pub fn draw_help(frame: &mut Frame, keymap: &Keymap, scroll: usize) {
    let area = popup_area(frame.area(), 70, 80);
    let key_col = 22;
    let inner_width = area.width.saturating_sub(2) as usize;
    let desc_width = inner_width.saturating_sub(key_col + 1);

    let lines: Vec<Line> = keymap
        .bindings()
        .skip(scroll)
        .map(|(action, keys)| {
            let keys = if keys.is_empty() {
                "(unbound)".to_string()
            } else {
                keys
            };
            Line::from(vec![
                Span::styled(
                    sanitize_to_exact_width(&keys, key_col),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(" "),
                Span::raw(sanitize_to_exact_width(action.description(), desc_width)),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Keybindings ")
        .title_bottom(" j/k scroll, Esc close ");

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Bookmark picker.
pub fn draw_bookmarks(frame: &mut Frame, bookmarks: &Bookmarks, selected: usize) {
    let area = popup_area(frame.area(), 60, 50);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Bookmarks ")
        .title_bottom(" Enter go, d remove, Esc close ");

    frame.render_widget(Clear, area);
    if bookmarks.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "[No bookmarks]",
                Style::default().fg(Color::DarkGray),
            ))
            .block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = bookmarks
        .iter()
        .map(|(name, path)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{name:<12} "), Style::default().fg(Color::Yellow)),
                Span::raw(shorten_home_path(path)),
            ]))
        })
        .collect();
    let mut state = ListState::default().with_selected(Some(selected));
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Recursive fuzzy find overlay: query line on top, ranked matches below.
pub fn draw_deep_search(frame: &mut Frame, deep: &DeepSearch, base: &Path) {
    let area = popup_area(frame.area(), 80, 70);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Find in {} ", shorten_home_path(base)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [query_row, results_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);
    draw_input_line(frame, query_row, "> ", &deep.input);

    if deep.results.is_empty() {
        if !deep.input.value().is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "[No matches]",
                    Style::default().fg(Color::DarkGray),
                )),
                results_area,
            );
        }
        return;
    }

    let width = results_area.width as usize;
    let items: Vec<ListItem> = deep
        .results
        .iter()
        .map(|result| {
            let mut rel = result.relative(base);
            if result.is_dir() {
                rel.push('/');
            }
            let style = if result.is_dir() {
                Style::default().fg(Color::Blue)
            } else {
                Style::default()
            };
            ListItem::new(Span::styled(sanitize_to_exact_width(&rel, width), style))
        })
        .collect();
    let mut state = ListState::default().with_selected(Some(deep.selected));
    let list =
        List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, results_area, &mut state);
}
