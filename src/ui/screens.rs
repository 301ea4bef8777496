use std::time::{Duration, Instant};

use tracing::debug;

use crate::debounce::Debouncer;
use crate::models::Song;

/// State behind the search screen. `query` is what the user sees in the input
/// box; `settled` is the last value that made it through the debouncer and
/// is what actually gets searched.
pub(crate) struct SearchScreen {
    pub(crate) query: String,
    pub(crate) settled: String,
    pub(crate) selected: usize,
    debouncer: Debouncer<String>,
}

impl SearchScreen {
    pub(crate) fn new(quiet: Duration) -> Self {
        Self {
            query: String::new(),
            settled: String::new(),
            selected: 0,
            debouncer: Debouncer::new(quiet),
        }
    }

    pub(crate) fn push_char(&mut self, ch: char, now: Instant) {
        self.query.push(ch);
        self.debouncer.push(self.query.clone(), now);
    }

    pub(crate) fn backspace(&mut self, now: Instant) {
        if self.query.pop().is_some() {
            self.debouncer.push(self.query.clone(), now);
        }
    }

    pub(crate) fn clear(&mut self, now: Instant) {
        self.query.clear();
        self.debouncer.push(String::new(), now);
    }

    /// Promote a settled query. Returns whether anything changed.
    pub(crate) fn tick(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(settled) => self.settle(settled),
            None => false,
        }
    }

    /// Settle whatever is still pending without waiting, e.g. before leaving
    /// the screen.
    pub(crate) fn flush(&mut self) -> bool {
        match self.debouncer.flush() {
            Some(settled) => self.settle(settled),
            None => false,
        }
    }

    fn settle(&mut self, settled: String) -> bool {
        debug!(query = %settled, "query settled");
        if settled == self.settled {
            return false;
        }
        self.settled = settled;
        self.selected = 0;
        true
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub(crate) fn move_selection(&mut self, offset: isize, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        let max_index = len as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, max_index) as usize;
    }
}

/// A song opened from the results list (or straight from a route).
pub(crate) struct SongScreen {
    pub(crate) song: Song,
    pub(crate) presenting: bool,
}

impl SongScreen {
    pub(crate) fn new(song: Song) -> Self {
        Self {
            song,
            presenting: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_only_settles_after_the_quiet_period() {
        let start = Instant::now();
        let mut screen = SearchScreen::new(Duration::from_millis(400));
        screen.push_char('f', start);
        screen.push_char('e', start + Duration::from_millis(50));

        assert!(!screen.tick(start + Duration::from_millis(300)));
        assert_eq!(screen.settled, "");
        assert!(screen.tick(start + Duration::from_millis(450)));
        assert_eq!(screen.settled, "fe");
        assert_eq!(screen.query, "fe");
    }

    #[test]
    fn flush_settles_without_waiting() {
        let start = Instant::now();
        let mut screen = SearchScreen::new(Duration::from_millis(400));
        screen.push_char('a', start);

        assert!(screen.flush());
        assert_eq!(screen.settled, "a");
        assert!(screen.deadline().is_none());
        assert!(!screen.tick(start + Duration::from_secs(1)));
        assert!(!screen.flush());
    }

    #[test]
    fn selection_is_clamped_to_results() {
        let mut screen = SearchScreen::new(Duration::from_millis(400));
        screen.move_selection(5, 3);
        assert_eq!(screen.selected, 2);
        screen.move_selection(-10, 3);
        assert_eq!(screen.selected, 0);
        screen.move_selection(1, 0);
        assert_eq!(screen.selected, 0);
    }
}
