use std::time::Duration;

/// Fixed-period accumulator.
///
/// Feed it frame deltas; it reports how many whole periods elapsed. Used to
/// run simulations at a fixed rate independent of the frame rate.
#[derive(Debug, Clone)]
pub struct Interval {
    period: Duration,
    accumulated: Duration,
    paused: bool,
}

impl Interval {
    pub fn new(period: Duration) -> Self {
        debug_assert!(!period.is_zero(), "interval period must be non-zero");
        Self {
            period: period.max(Duration::from_micros(1)),
            accumulated: Duration::ZERO,
            paused: false,
        }
    }

    pub fn from_secs_f32(secs: f32) -> Self {
        Self::new(Duration::from_secs_f32(secs.max(0.0)))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Accumulates `dt` and returns the number of periods that completed.
    ///
    /// Returns 0 while paused; time spent paused is discarded.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if self.paused {
            return 0;
        }
        self.accumulated += dt;

        let mut fired = 0;
        while self.accumulated >= self.period {
            self.accumulated -= self.period;
            fired += 1;
        }
        fired
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_paused(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Restarts the current period.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn fires_once_per_period() {
        let mut iv = Interval::new(ms(500));
        assert_eq!(iv.advance(ms(200)), 0);
        assert_eq!(iv.advance(ms(200)), 0);
        assert_eq!(iv.advance(ms(200)), 1);
        // 100ms carried over
        assert_eq!(iv.advance(ms(400)), 1);
    }

    #[test]
    fn long_frame_fires_multiple_times() {
        let mut iv = Interval::new(ms(100));
        assert_eq!(iv.advance(ms(350)), 3);
        assert_eq!(iv.advance(ms(50)), 1);
    }

    #[test]
    fn paused_time_is_discarded() {
        let mut iv = Interval::new(ms(100));
        iv.advance(ms(90));
        iv.set_paused(true);
        assert_eq!(iv.advance(ms(1000)), 0);
        assert!(!iv.toggle_paused());
        assert_eq!(iv.advance(ms(10)), 1);
    }

    #[test]
    fn reset_restarts_the_period() {
        let mut iv = Interval::new(ms(100));
        iv.advance(ms(90));
        iv.reset();
        assert_eq!(iv.advance(ms(90)), 0);
    }
}
