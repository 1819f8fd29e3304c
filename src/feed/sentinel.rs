//! Throttled bottom-of-list detection.
//!
//! The sentinel knows nothing about terminals: callers hand it the current
//! [`ScrollMetrics`] and a timestamp for every scroll attempt, and it answers
//! whether the feed should advance to the next page.

use std::time::Duration;
use tokio::time::Instant;

/// Minimum spacing between two bottom-reached signals.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(500);

/// Scroll geometry of the post list, in terminal rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    pub viewport_height: usize,
    pub scroll_offset: usize,
    pub content_height: usize,
}

impl ScrollMetrics {
    /// True when the last row of content is visible, including when the
    /// viewport extends past it. An empty list is never at the bottom.
    pub fn is_at_bottom(&self) -> bool {
        self.content_height > 0
            && self.viewport_height.saturating_add(self.scroll_offset) >= self.content_height
    }
}

/// Leading-edge throttle over bottom-reached events.
#[derive(Debug, Clone)]
pub struct ScrollSentinel {
    interval: Duration,
    last_fired: Option<Instant>,
}

impl Default for ScrollSentinel {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE)
    }
}

impl ScrollSentinel {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
        }
    }

    /// Record a scroll attempt. Returns true if the feed should advance.
    pub fn observe(&mut self, metrics: ScrollMetrics, now: Instant) -> bool {
        if !metrics.is_at_bottom() {
            return false;
        }
        if let Some(last) = self.last_fired {
            if now.saturating_duration_since(last) < self.interval {
                return false;
            }
        }
        self.last_fired = Some(now);
        true
    }

    /// Forget the last signal, e.g. after the list was reset.
    pub fn reset(&mut self) {
        self.last_fired = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_bottom() -> ScrollMetrics {
        ScrollMetrics {
            viewport_height: 20,
            scroll_offset: 40,
            content_height: 60,
        }
    }

    #[test]
    fn test_exact_bottom() {
        assert!(at_bottom().is_at_bottom());
    }

    #[test]
    fn test_overshoot_counts_as_bottom() {
        let m = ScrollMetrics {
            viewport_height: 20,
            scroll_offset: 45,
            content_height: 60,
        };
        assert!(m.is_at_bottom());
    }

    #[test]
    fn test_not_at_bottom() {
        let m = ScrollMetrics {
            viewport_height: 20,
            scroll_offset: 10,
            content_height: 60,
        };
        assert!(!m.is_at_bottom());
    }

    #[test]
    fn test_empty_content_never_bottom() {
        let m = ScrollMetrics {
            viewport_height: 20,
            scroll_offset: 0,
            content_height: 0,
        };
        assert!(!m.is_at_bottom());
    }

    #[test]
    fn test_short_content_is_bottom() {
        let m = ScrollMetrics {
            viewport_height: 20,
            scroll_offset: 0,
            content_height: 6,
        };
        assert!(m.is_at_bottom());
    }

    #[test]
    fn test_two_events_within_interval_fire_once() {
        let mut sentinel = ScrollSentinel::default();
        let t0 = Instant::now();
        assert!(sentinel.observe(at_bottom(), t0));
        assert!(!sentinel.observe(at_bottom(), t0 + Duration::from_millis(200)));
        assert!(!sentinel.observe(at_bottom(), t0 + Duration::from_millis(499)));
    }

    #[test]
    fn test_fires_again_after_interval() {
        let mut sentinel = ScrollSentinel::default();
        let t0 = Instant::now();
        assert!(sentinel.observe(at_bottom(), t0));
        assert!(sentinel.observe(at_bottom(), t0 + Duration::from_millis(500)));
    }

    #[test]
    fn test_non_bottom_events_do_not_consume_interval() {
        let mut sentinel = ScrollSentinel::default();
        let t0 = Instant::now();
        let middle = ScrollMetrics {
            viewport_height: 20,
            scroll_offset: 0,
            content_height: 60,
        };
        assert!(!sentinel.observe(middle, t0));
        assert!(sentinel.observe(at_bottom(), t0 + Duration::from_millis(10)));
    }

    #[test]
    fn test_burst_of_events_fires_once() {
        let mut sentinel = ScrollSentinel::new(Duration::from_millis(500));
        let t0 = Instant::now();
        let fired = (0u64..50)
            .filter(|&i| sentinel.observe(at_bottom(), t0 + Duration::from_millis(i * 9)))
            .count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_reset_allows_immediate_fire() {
        let mut sentinel = ScrollSentinel::default();
        let t0 = Instant::now();
        assert!(sentinel.observe(at_bottom(), t0));
        sentinel.reset();
        assert!(sentinel.observe(at_bottom(), t0 + Duration::from_millis(1)));
    }
}
