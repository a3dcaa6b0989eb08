//! Restart rate limiting and jittered exponential backoff for the
//! `restart-agent` exception reaction.
//!
//! Tracks one agent's restart history in a sliding time window; once the
//! window holds `max_restarts` entries, the cooperation gives up restarting
//! that agent and escalates instead. Grounded on the reference runtime's
//! `RestartBackoff` (sliding-window restart-intensity tracking, the same
//! mechanism BEAM supervisors use to avoid restart storms), extended with
//! random jitter on the computed delay so that many agents failing at once
//! don't all retry in lockstep.

// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use rand::Rng;

// Layer 3: Internal module imports
// (none needed for backoff)

/// Sliding-window restart counter with jittered exponential backoff.
///
/// Formula: `delay = base_delay * 2^(min(restart_count, 10)) * jitter`, where
/// `jitter` is drawn uniformly from `[0.85, 1.15]`, then capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct RestartBackoff {
    max_restarts: u32,
    restart_window: Duration,
    restart_history: VecDeque<DateTime<Utc>>,
    base_delay: Duration,
    max_delay: Duration,
}

impl RestartBackoff {
    pub fn new(max_restarts: u32, restart_window: Duration) -> Self {
        Self {
            max_restarts,
            restart_window,
            restart_history: VecDeque::new(),
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
        }
    }

    pub fn with_delays(
        max_restarts: u32,
        restart_window: Duration,
        base_delay: Duration,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_restarts,
            restart_window,
            restart_history: VecDeque::new(),
            base_delay,
            max_delay,
        }
    }

    /// Whether the restart-intensity limit has been reached (sliding window).
    pub fn is_limit_exceeded(&mut self) -> bool {
        self.cleanup_expired_restarts();
        self.restart_history.len() >= self.max_restarts as usize
    }

    pub fn record_restart(&mut self) {
        self.restart_history.push_front(Utc::now());
    }

    /// Exponential delay with ±15% jitter, capped at `max_delay`.
    pub fn calculate_delay(&mut self) -> Duration {
        self.cleanup_expired_restarts();

        let restart_count = self.restart_history.len() as u32;
        let capped_count = restart_count.min(10);
        let multiplier = 2u64.pow(capped_count);
        let base_ms = self.base_delay.as_millis() as u64 * multiplier;

        let jitter = rand::thread_rng().gen_range(0.85..=1.15);
        let jittered_ms = (base_ms as f64 * jitter) as u64;

        Duration::from_millis(jittered_ms).min(self.max_delay)
    }

    pub fn restart_count(&mut self) -> u32 {
        self.cleanup_expired_restarts();
        self.restart_history.len() as u32
    }

    pub fn reset(&mut self) {
        self.restart_history.clear();
    }

    fn cleanup_expired_restarts(&mut self) {
        let now = Utc::now();
        let Ok(chrono_window) = chrono::Duration::from_std(self.restart_window) else {
            return;
        };
        let window_start = now - chrono_window;

        while let Some(&oldest) = self.restart_history.back() {
            if oldest < window_start {
                self.restart_history.pop_back();
            } else {
                break;
            }
        }
    }
}

impl Default for RestartBackoff {
    /// 5 restarts per 60 seconds, matching the reference runtime's default.
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn new_backoff_has_expected_defaults() {
        let backoff = RestartBackoff::new(5, Duration::from_secs(60));
        assert_eq!(backoff.max_restarts, 5);
        assert_eq!(backoff.base_delay, Duration::from_millis(100));
    }

    #[test]
    fn record_restart_increments_count() {
        let mut backoff = RestartBackoff::new(5, Duration::from_secs(60));
        assert_eq!(backoff.restart_count(), 0);
        backoff.record_restart();
        assert_eq!(backoff.restart_count(), 1);
    }

    #[test]
    fn limit_exceeded_once_window_is_full() {
        let mut backoff = RestartBackoff::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(!backoff.is_limit_exceeded());
            backoff.record_restart();
        }
        assert!(backoff.is_limit_exceeded());
    }

    #[test]
    fn delay_grows_and_stays_within_jitter_band() {
        let mut backoff = RestartBackoff::new(10, Duration::from_secs(60));
        backoff.record_restart();
        let delay = backoff.calculate_delay();
        assert!(delay >= Duration::from_millis(170) && delay <= Duration::from_millis(230));
    }

    #[test]
    fn delay_is_capped_at_max_delay() {
        let mut backoff = RestartBackoff::with_delays(
            20,
            Duration::from_secs(300),
            Duration::from_millis(100),
            Duration::from_secs(5),
        );
        for _ in 0..15 {
            backoff.record_restart();
        }
        assert_eq!(backoff.calculate_delay(), Duration::from_secs(5));
    }

    #[test]
    fn restart_window_expires_old_entries() {
        let mut backoff = RestartBackoff::new(3, Duration::from_millis(100));
        backoff.record_restart();
        backoff.record_restart();
        assert_eq!(backoff.restart_count(), 2);

        thread::sleep(Duration::from_millis(150));
        assert_eq!(backoff.restart_count(), 0);
    }

    #[test]
    fn reset_clears_history() {
        let mut backoff = RestartBackoff::new(5, Duration::from_secs(60));
        backoff.record_restart();
        backoff.record_restart();
        backoff.reset();
        assert_eq!(backoff.restart_count(), 0);
    }
}
