use std::mem;

use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::lyrics::Line;
use crate::presentation::{LineLayout, RowSpan};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Word-wrap `text` into rows of at most `width` chars. Words longer than a
/// row are split.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > width {
            if current_len > 0 {
                rows.push(mem::take(&mut current));
                current_len = 0;
            }
            rows.push(chars.drain(..width).collect());
        }
        if chars.is_empty() {
            continue;
        }

        if current_len > 0 && current_len + 1 + chars.len() > width {
            rows.push(mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current_len += chars.len();
        current.extend(chars);
    }

    if !current.is_empty() || rows.is_empty() {
        rows.push(current);
    }
    rows
}

/// Song lines wrapped for display, with the row geometry the navigator needs.
pub(crate) struct WrappedSong {
    /// Rows per song line.
    pub(crate) rows: Vec<Vec<String>>,
    pub(crate) layout: LineLayout,
}

/// Wrap every line to `width` and stack them, leaving one blank row before
/// each section marker except the first.
pub(crate) fn wrap_song(lines: &[Line], width: u16) -> WrappedSong {
    let mut rows = Vec::with_capacity(lines.len());
    let mut spans = Vec::with_capacity(lines.len());
    let mut top = 0u16;

    for (idx, line) in lines.iter().enumerate() {
        if idx > 0 && line.is_marker() {
            top = top.saturating_add(1);
        }
        let wrapped = wrap_text(&line.text, usize::from(width));
        let height = u16::try_from(wrapped.len()).unwrap_or(u16::MAX);
        spans.push(RowSpan { top, height });
        top = top.saturating_add(height);
        rows.push(wrapped);
    }

    WrappedSong {
        rows,
        layout: LineLayout::new(spans),
    }
}
