#![forbid(unsafe_code)]

//! Host-advanced monotonic clock.

use core::time::Duration;

/// Deterministic monotonic clock controlled by the host.
///
/// The browser host advances it from `performance.now()` deltas; tests
/// advance it by hand. Nothing in the engine reads real time.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Current monotonic time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time. Going backwards is ignored.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    /// Advance by a host-supplied millisecond delta.
    ///
    /// Host input can be noisy (NaN/inf/negative spikes); those are dropped.
    pub fn advance_ms(&mut self, dt_ms: f64) {
        if let Some(dt) = duration_from_ms(dt_ms) {
            self.advance(dt);
        }
    }
}

/// Convert a finite, positive millisecond value into a [`Duration`].
#[must_use]
pub fn duration_from_ms(ms: f64) -> Option<Duration> {
    if !ms.is_finite() || ms <= 0.0 {
        return None;
    }
    let nanos = (ms * 1_000_000.0).round();
    if nanos >= u64::MAX as f64 {
        return Some(Duration::from_nanos(u64::MAX));
    }
    Some(Duration::from_nanos(nanos as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn deterministic_clock_advances_monotonically() {
        let mut c = DeterministicClock::new();
        assert_eq!(c.now(), Duration::ZERO);

        c.advance(Duration::from_millis(10));
        assert_eq!(c.now(), Duration::from_millis(10));

        c.advance(Duration::from_millis(5));
        assert_eq!(c.now(), Duration::from_millis(15));

        // Saturation: don't panic or wrap.
        c.set(Duration::MAX);
        c.advance(Duration::from_secs(1));
        assert_eq!(c.now(), Duration::MAX);
    }

    #[test]
    fn set_never_moves_backwards() {
        let mut c = DeterministicClock::new();
        c.set(Duration::from_millis(200));
        c.set(Duration::from_millis(50));
        assert_eq!(c.now(), Duration::from_millis(200));
    }

    #[test]
    fn advance_ms_ignores_invalid_inputs() {
        let mut c = DeterministicClock::new();
        c.advance_ms(f64::NAN);
        c.advance_ms(f64::INFINITY);
        c.advance_ms(-1.0);
        c.advance_ms(0.0);
        assert_eq!(c.now(), Duration::ZERO);

        c.advance_ms(16.0);
        assert_eq!(c.now(), Duration::from_millis(16));
    }
}
