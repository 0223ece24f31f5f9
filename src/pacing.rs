//! Drift-corrected pacing for periodic loops.
//!
//! [`AdaptiveDelay`] sleeps whatever is needed to hold a loop to a target
//! cadence, absorbing the jitter of the work done between calls. A bounded
//! catch-up keeps a stalled loop from sleeping zero forever trying to
//! repay unbounded schedule debt.

use std::time::{Duration, Instant};

/// A pacing helper that sleeps to maintain a target cadence.
///
/// One instance per pacing loop; it holds no shared state and is not meant
/// to be used from more than one thread.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use threadflow::pacing::AdaptiveDelay;
///
/// let mut pacer = AdaptiveDelay::new(Duration::from_millis(100), Duration::from_millis(5));
///
/// // First call anchors the schedule and never sleeps.
/// assert!(!pacer.delay(Duration::from_millis(20)));
///
/// for _frame in 0..3 {
///     // ... grab and process one unit of data ...
///     let late = pacer.delay(Duration::from_millis(20));
///     if late {
///         // more than a full period behind: e.g. drop the frame
///     }
/// }
/// ```
#[derive(Debug)]
pub struct AdaptiveDelay {
    started: bool,
    target: Instant,
    jitter_limit: Duration,
    minimum_delay: Duration,
}

impl Default for AdaptiveDelay {
    fn default() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

impl AdaptiveDelay {
    /// Create a pacer.
    ///
    /// `jitter_limit` bounds how far behind schedule the pacer will run
    /// before skipping periods to catch up; zero disables the bound.
    /// `minimum_delay` is the shortest sleep worth the scheduling
    /// overhead; computed sleeps at or below it are skipped.
    pub fn new(jitter_limit: Duration, minimum_delay: Duration) -> Self {
        Self {
            started: false,
            target: Instant::now(),
            jitter_limit,
            minimum_delay,
        }
    }

    /// Wait out the remainder of one period.
    ///
    /// The first call (or first after [`restart`](Self::restart)) anchors
    /// the schedule to "now" and returns without sleeping. Every later
    /// call advances the target by `period` and sleeps off the slack, if
    /// any. When the caller has fallen further behind than the jitter
    /// limit, whole periods are skipped until the debt is back within the
    /// limit; any slack the skips leave ahead of "now" is still slept off.
    ///
    /// Returns `true` if the caller was more than one full period late,
    /// letting it decide to skip dependent work.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn delay(&mut self, period: Duration) -> bool {
        assert!(!period.is_zero(), "delay period must be non-zero");

        let now = Instant::now();
        if !self.started {
            self.started = true;
            self.target = now;
            return false;
        }

        self.target += period;

        // Lateness is how far `now` has run past the target; zero when
        // the loop is on or ahead of schedule.
        let lateness = now.saturating_duration_since(self.target);
        let is_late = lateness >= period;

        if !self.jitter_limit.is_zero() && lateness > self.jitter_limit {
            let mut skipped = 0u32;
            while now.saturating_duration_since(self.target) > self.jitter_limit {
                self.target += period;
                skipped += 1;
            }
            log::debug!("pacing {}ms behind, skipped {} period(s)", lateness.as_millis(), skipped);
        }

        // Catch-up can leave the target ahead of "now"; that slack is
        // still slept off so the next period fires on schedule.
        let slack = self.target.saturating_duration_since(now);
        if slack > self.minimum_delay {
            std::thread::sleep(slack);
        }
        // otherwise better sooner than later

        is_late
    }

    /// Reset to the unstarted state.
    ///
    /// The next [`delay`](Self::delay) call re-anchors the schedule
    /// instead of sleeping off a stale interval. The jitter limit and
    /// minimum delay are unaffected.
    pub fn restart(&mut self) {
        self.started = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_first_call_never_sleeps() {
        let mut pacer = AdaptiveDelay::default();
        let start = Instant::now();
        let late = pacer.delay(Duration::from_millis(500));
        assert!(!late);
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_sleeps_to_cadence() {
        let mut pacer = AdaptiveDelay::default();
        pacer.delay(Duration::from_millis(50));

        let start = Instant::now();
        let late = pacer.delay(Duration::from_millis(50));
        let elapsed = start.elapsed();

        assert!(!late);
        assert!(elapsed >= Duration::from_millis(40), "slept only {:?}", elapsed);
    }

    #[test]
    fn test_absorbs_jitter_within_period() {
        let mut pacer = AdaptiveDelay::default();
        pacer.delay(Duration::from_millis(60));

        // Burn part of the period; the pacer sleeps only the remainder.
        thread::sleep(Duration::from_millis(30));
        let start = Instant::now();
        let late = pacer.delay(Duration::from_millis(60));
        let elapsed = start.elapsed();

        assert!(!late);
        assert!(elapsed < Duration::from_millis(60));
    }

    #[test]
    fn test_catch_up_after_stall() {
        // Jitter limit 100ms, minimum delay 10ms, period 50ms. A 200ms
        // stall leaves the schedule 150ms behind: more than the limit, so
        // at least one period is skipped, and the call reports late.
        let mut pacer =
            AdaptiveDelay::new(Duration::from_millis(100), Duration::from_millis(10));
        assert!(!pacer.delay(Duration::from_millis(50)));

        thread::sleep(Duration::from_millis(200));
        let start = Instant::now();
        let late = pacer.delay(Duration::from_millis(50));

        assert!(late);
        // The target is still a full jitter limit behind "now": no slack,
        // no sleep.
        assert!(start.elapsed() < Duration::from_millis(40));
    }

    #[test]
    fn test_catch_up_overshoot_still_sleeps() {
        // Jitter limit 30ms, period 100ms. A 140ms stall is 40ms behind:
        // the single skipped period moves the target 60ms past "now", and
        // that slack must be slept off so the next period fires on
        // schedule.
        let mut pacer =
            AdaptiveDelay::new(Duration::from_millis(30), Duration::from_millis(1));
        assert!(!pacer.delay(Duration::from_millis(100)));

        thread::sleep(Duration::from_millis(140));
        let start = Instant::now();
        let late = pacer.delay(Duration::from_millis(100));
        let elapsed = start.elapsed();

        // 40ms of lateness is less than one period.
        assert!(!late);
        assert!(elapsed >= Duration::from_millis(40), "slept only {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(100), "overslept {:?}", elapsed);
    }

    #[test]
    fn test_unbounded_debt_without_jitter_limit() {
        // With no jitter limit the pacer repays debt by not sleeping.
        let mut pacer = AdaptiveDelay::default();
        pacer.delay(Duration::from_millis(20));

        thread::sleep(Duration::from_millis(100));
        let start = Instant::now();
        assert!(pacer.delay(Duration::from_millis(20)));
        assert!(pacer.delay(Duration::from_millis(20)));
        // Two periods of debt repaid without sleeping.
        assert!(start.elapsed() < Duration::from_millis(20));
    }

    #[test]
    fn test_restart_reanchors() {
        let mut pacer = AdaptiveDelay::default();
        pacer.delay(Duration::from_millis(50));

        thread::sleep(Duration::from_millis(120));
        pacer.restart();

        // After restart the next call anchors fresh: no sleep, not late.
        let start = Instant::now();
        let late = pacer.delay(Duration::from_millis(50));
        assert!(!late);
        assert!(start.elapsed() < Duration::from_millis(20));
    }

    #[test]
    fn test_minimum_delay_skips_tiny_sleeps() {
        let mut pacer = AdaptiveDelay::new(Duration::ZERO, Duration::from_millis(200));
        pacer.delay(Duration::from_millis(50));

        // Slack (~50ms) is below the 200ms floor: no sleep at all.
        let start = Instant::now();
        let late = pacer.delay(Duration::from_millis(50));
        assert!(!late);
        assert!(start.elapsed() < Duration::from_millis(20));
    }

    #[test]
    #[should_panic(expected = "delay period must be non-zero")]
    fn test_zero_period_panics() {
        let mut pacer = AdaptiveDelay::default();
        let _ = pacer.delay(Duration::ZERO);
    }
}
