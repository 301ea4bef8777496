//! Quiet-period gate between raw keystrokes and the search engine.
//!
//! The debouncer never owns a timer: the event loop asks it for its
//! [`Debouncer::deadline`] to bound how long it waits for input, then calls
//! [`Debouncer::poll`]. Dropping it (or calling `cancel`) discards whatever is
//! pending, so a torn-down screen can never fire a stale query.

use std::time::{Duration, Instant};

/// Default quiet period before a query is considered settled.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(400);

#[derive(Debug)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Record a new raw value. Any earlier pending value is dropped and the
    /// quiet period starts over.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Emit the pending value once the quiet period has elapsed since the last
    /// push.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let (_, pushed_at) = self.pending.as_ref()?;
        if now.saturating_duration_since(*pushed_at) >= self.quiet {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }

    /// Emit the pending value right away, skipping what is left of the quiet
    /// period.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    /// When the pending value will settle, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
            .as_ref()
            .map(|(_, pushed_at)| *pushed_at + self.quiet)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn only_the_last_value_of_a_burst_is_emitted() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(400));
        let updates = [(0, "a"), (100, "ab"), (450, "abc")];
        let mut emitted = Vec::new();

        for tick in (0..=1200).step_by(10) {
            for (at, value) in updates {
                if at == tick {
                    debouncer.push(value.to_string(), start + ms(at));
                }
            }
            if let Some(value) = debouncer.poll(start + ms(tick)) {
                emitted.push((tick, value));
            }
        }

        assert_eq!(emitted, vec![(850, "abc".to_string())]);
    }

    #[test]
    fn nothing_fires_before_the_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(400));
        debouncer.push(1, start);

        assert_eq!(debouncer.poll(start + ms(399)), None);
        assert_eq!(debouncer.deadline(), Some(start + ms(400)));
        assert_eq!(debouncer.poll(start + ms(400)), Some(1));
        assert_eq!(debouncer.poll(start + ms(800)), None);
    }

    #[test]
    fn cancel_discards_pending_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(400));
        debouncer.push("x", start);
        debouncer.cancel();

        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + ms(1000)), None);
    }

    #[test]
    fn flush_emits_immediately_and_only_once() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(400));
        debouncer.push("ab", start);

        assert_eq!(debouncer.flush(), Some("ab"));
        assert_eq!(debouncer.deadline(), None);
        assert_eq!(debouncer.poll(start + ms(1000)), None);
        assert_eq!(debouncer.flush(), None);
    }
}
