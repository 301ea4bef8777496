//! Presentation mode navigation.
//!
//! [`Navigator`] owns the cursor over a flattened song and the scroll offset
//! of the presentation surface. Keyboard advancement moves the cursor and
//! drags the scroll along; manual scrolling moves the scroll and pulls the
//! cursor to whichever line sits in the middle of the viewport. Both paths end
//! in the same two numbers, so they can never disagree.

use crate::lyrics::Line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn shift(self, index: usize, len: usize) -> Option<usize> {
        match self {
            Direction::Forward => index.checked_add(1).filter(|next| *next < len),
            Direction::Backward => index.checked_sub(1),
        }
    }
}

/// Rows occupied by one rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    pub top: u16,
    pub height: u16,
}

impl RowSpan {
    /// Vertical center, doubled to stay in integers.
    fn center_x2(self) -> u32 {
        u32::from(self.top) * 2 + u32::from(self.height)
    }
}

/// Measured vertical geometry of every line, as laid out by the view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineLayout {
    spans: Vec<RowSpan>,
}

impl LineLayout {
    pub fn new(spans: Vec<RowSpan>) -> Self {
        Self { spans }
    }

    /// Lines stacked back to back with the given heights.
    pub fn stacked(heights: impl IntoIterator<Item = u16>) -> Self {
        let mut top = 0u16;
        let spans = heights
            .into_iter()
            .map(|height| {
                let span = RowSpan { top, height };
                top = top.saturating_add(height);
                span
            })
            .collect();
        Self { spans }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn span(&self, index: usize) -> Option<RowSpan> {
        self.spans.get(index).copied()
    }

    /// Total rows including the last line.
    pub fn content_height(&self) -> u16 {
        self.spans
            .last()
            .map(|span| span.top.saturating_add(span.height))
            .unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct Navigator {
    lines: Vec<Line>,
    current: usize,
    scroll: u16,
    layout: LineLayout,
    viewport: u16,
    /// Set by `advance`, cleared by manual scrolling: whether the scroll
    /// tracks the cursor.
    following: bool,
    hint_dismissed: bool,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new line sequence (new song or mode) and start over.
    pub fn load(&mut self, lines: Vec<Line>) {
        self.lines = lines;
        self.layout = LineLayout::default();
        self.reset();
    }

    pub fn reset(&mut self) {
        self.current = 0;
        self.scroll = 0;
        self.following = false;
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn current_line(&self) -> usize {
        self.current
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn scroll_offset(&self) -> u16 {
        self.scroll
    }

    /// Latched by the first `advance`; never cleared.
    pub fn hint_dismissed(&self) -> bool {
        self.hint_dismissed
    }

    /// Record how the view laid the lines out and how tall the surface is.
    /// Call whenever either changes (e.g. on resize). After an `advance` the
    /// current line is re-centred in the new geometry.
    pub fn set_viewport(&mut self, layout: LineLayout, height: u16) {
        self.layout = layout;
        self.viewport = height;
        if self.following {
            self.follow_current();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    /// Step one line in `direction`, skipping section markers while the
    /// sequence allows it. Returns whether the cursor moved.
    pub fn advance(&mut self, direction: Direction) -> bool {
        self.hint_dismissed = true;

        let mut next = self.current;
        while let Some(candidate) = direction.shift(next, self.lines.len()) {
            next = candidate;
            if !self.lines[next].is_marker() {
                break;
            }
        }

        let moved = next != self.current;
        self.current = next;
        self.following = true;
        self.follow_current();
        moved
    }

    /// The user scrolled the surface to `offset` rows. The cursor follows to
    /// the line whose center is nearest the center of the viewport.
    pub fn on_manual_scroll(&mut self, offset: u16) {
        if self.lines.is_empty() {
            return;
        }
        self.following = false;
        self.scroll = offset.min(self.max_scroll());
        if !self.has_layout() {
            return;
        }

        let view_center = u32::from(self.scroll) * 2 + u32::from(self.viewport);
        if let Some((index, _)) = self
            .layout
            .spans
            .iter()
            .enumerate()
            .min_by_key(|(_, span)| span.center_x2().abs_diff(view_center))
        {
            self.current = index;
        }
    }

    /// Relative manual scroll, e.g. one mouse wheel notch.
    pub fn scroll_by(&mut self, delta: i32) {
        let target = (i32::from(self.scroll) + delta).clamp(0, i32::from(u16::MAX));
        self.on_manual_scroll(target as u16);
    }

    fn has_layout(&self) -> bool {
        !self.layout.is_empty() && self.layout.len() == self.lines.len()
    }

    fn max_scroll(&self) -> u16 {
        self.layout.content_height().saturating_sub(self.viewport)
    }

    /// Scroll so the current line sits in the middle of the viewport.
    fn follow_current(&mut self) {
        if !self.has_layout() {
            return;
        }
        let Some(span) = self.layout.span(self.current) else {
            return;
        };
        let target = (span.center_x2() / 2).saturating_sub(u32::from(self.viewport) / 2);
        let target = u16::try_from(target).unwrap_or(u16::MAX);
        self.scroll = target.min(self.max_scroll());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Line> {
        vec![
            Line::marker("Estrofa 1"),
            Line::lyric("a"),
            Line::lyric("b"),
            Line::marker("Coro"),
            Line::lyric("c"),
            Line::marker("Estrofa 2"),
            Line::lyric("d"),
        ]
    }

    fn navigator() -> Navigator {
        let mut nav = Navigator::new();
        nav.load(sample());
        nav
    }

    #[test]
    fn clamps_at_both_ends() {
        let mut nav = navigator();
        assert!(!nav.advance(Direction::Backward));
        assert_eq!(nav.current_line(), 0);

        for _ in 0..20 {
            nav.advance(Direction::Forward);
        }
        assert_eq!(nav.current_line(), 6);
        assert!(!nav.advance(Direction::Forward));
        assert_eq!(nav.current_line(), 6);
    }

    #[test]
    fn skips_section_markers() {
        let mut nav = navigator();
        let mut visited = vec![nav.current_line()];
        while nav.advance(Direction::Forward) {
            visited.push(nav.current_line());
        }
        assert_eq!(visited, [0, 1, 2, 4, 6]);

        nav.advance(Direction::Backward);
        assert_eq!(nav.current_line(), 4);
        nav.advance(Direction::Backward);
        assert_eq!(nav.current_line(), 2);
    }

    #[test]
    fn marker_is_fine_at_the_boundary() {
        let mut nav = navigator();
        nav.advance(Direction::Forward);
        nav.advance(Direction::Backward);
        assert_eq!(nav.current_line(), 0);
    }

    #[test]
    fn consecutive_markers_are_all_skipped() {
        let mut nav = Navigator::new();
        nav.load(vec![
            Line::lyric("a"),
            Line::marker("Estrofa 2"),
            Line::marker("Coro"),
            Line::lyric("b"),
        ]);
        nav.advance(Direction::Forward);
        assert_eq!(nav.current_line(), 3);
    }

    #[test]
    fn empty_sequence_is_inert() {
        let mut nav = Navigator::new();
        nav.load(Vec::new());
        assert!(!nav.advance(Direction::Forward));
        nav.on_manual_scroll(10);
        assert_eq!(nav.current_line(), 0);
        assert_eq!(nav.total_lines(), 0);
        assert!(nav.lines().is_empty());
    }

    #[test]
    fn advancing_scrolls_current_line_to_center() {
        let mut nav = navigator();
        nav.set_viewport(LineLayout::stacked([1; 7]), 3);
        nav.advance(Direction::Forward);
        nav.advance(Direction::Forward);
        assert_eq!(nav.current_line(), 2);
        assert_eq!(nav.scroll_offset(), 1);

        // Max scroll is 7 - 3 = 4.
        nav.advance(Direction::Forward);
        nav.advance(Direction::Forward);
        assert_eq!(nav.current_line(), 6);
        assert_eq!(nav.scroll_offset(), 4);
    }

    #[test]
    fn viewport_changes_recenter_after_advance() {
        let mut nav = navigator();
        nav.set_viewport(LineLayout::stacked([1; 7]), 3);
        for _ in 0..3 {
            nav.advance(Direction::Forward);
        }
        assert_eq!((nav.current_line(), nav.scroll_offset()), (4, 3));

        // Taller surface, e.g. the hint row went away.
        nav.set_viewport(LineLayout::stacked([1; 7]), 5);
        assert_eq!(nav.scroll_offset(), 2);

        // Narrower surface: the first line now wraps to three rows.
        nav.set_viewport(LineLayout::stacked([3, 1, 1, 1, 1, 1, 1]), 3);
        assert_eq!(nav.scroll_offset(), 5);
    }

    #[test]
    fn manual_scroll_stops_following_the_cursor() {
        let mut nav = navigator();
        nav.set_viewport(LineLayout::stacked([1; 7]), 3);
        for _ in 0..3 {
            nav.advance(Direction::Forward);
        }
        nav.on_manual_scroll(0);
        nav.set_viewport(LineLayout::stacked([1; 7]), 5);
        assert_eq!(nav.scroll_offset(), 0);
        assert_eq!(nav.current_line(), 1);
    }

    #[test]
    fn manual_scroll_picks_the_centered_line() {
        let mut nav = navigator();
        nav.set_viewport(LineLayout::stacked([1; 7]), 3);
        nav.on_manual_scroll(2);
        assert_eq!(nav.current_line(), 3);
        assert_eq!(nav.scroll_offset(), 2);

        nav.on_manual_scroll(99);
        assert_eq!(nav.scroll_offset(), 4);
        assert_eq!(nav.current_line(), 5);

        nav.scroll_by(-10);
        assert_eq!(nav.scroll_offset(), 0);
        assert_eq!(nav.current_line(), 1);
    }

    #[test]
    fn manual_scroll_and_advance_agree() {
        let mut nav = navigator();
        nav.set_viewport(LineLayout::stacked([2, 1, 3, 1, 1, 1, 2]), 4);
        nav.advance(Direction::Forward);
        nav.advance(Direction::Forward);
        let offset = nav.scroll_offset();
        let line = nav.current_line();

        nav.on_manual_scroll(offset);
        assert_eq!(nav.current_line(), line);
    }

    #[test]
    fn reset_and_reload_return_to_start_but_keep_the_hint_latch() {
        let mut nav = navigator();
        nav.set_viewport(LineLayout::stacked([1; 7]), 3);
        assert!(!nav.hint_dismissed());
        nav.advance(Direction::Forward);
        nav.advance(Direction::Forward);
        assert!(nav.hint_dismissed());

        nav.reset();
        assert_eq!((nav.current_line(), nav.scroll_offset()), (0, 0));

        nav.advance(Direction::Forward);
        nav.load(sample());
        assert_eq!((nav.current_line(), nav.scroll_offset()), (0, 0));
        assert!(nav.hint_dismissed());
    }
}
