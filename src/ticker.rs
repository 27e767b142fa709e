use std::time::{Duration, Instant};

/// Default tick interval in milliseconds
pub const DEFAULT_TICK_MS: u64 = 250;

/// Get tick duration
pub fn tick_duration() -> Duration {
    Duration::from_millis(DEFAULT_TICK_MS)
}

/// Fixed-period schedule polled from the board loop.
///
/// `due` reports how many whole periods have elapsed since the last call, so
/// a slow frame never loses ticks and never double-counts them.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    last: Instant,
}

impl Ticker {
    pub fn starting_at(period: Duration, start: Instant) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            last: start,
        }
    }

    /// Number of periods elapsed up to `now`
    pub fn due(&mut self, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.last);
        let count = (elapsed.as_nanos() / self.period.as_nanos()) as u32;
        self.last += self.period * count;
        count
    }

    /// Restart the period from `now`, dropping any partial period
    pub fn restart(&mut self, now: Instant) {
        self.last = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_duration() {
        let duration = tick_duration();
        assert_eq!(duration, Duration::from_millis(250));
    }

    #[test]
    fn test_due_counts_whole_periods() {
        let start = Instant::now();
        let mut ticker = Ticker::starting_at(Duration::from_secs(1), start);

        assert_eq!(ticker.due(start + Duration::from_millis(900)), 0);
        assert_eq!(ticker.due(start + Duration::from_millis(1100)), 1);
        assert_eq!(ticker.due(start + Duration::from_millis(1900)), 0);
        assert_eq!(ticker.due(start + Duration::from_millis(4200)), 3);
    }

    #[test]
    fn test_restart_drops_partial_period() {
        let start = Instant::now();
        let mut ticker = Ticker::starting_at(Duration::from_secs(1), start);
        ticker.restart(start + Duration::from_millis(800));
        assert_eq!(ticker.due(start + Duration::from_millis(1500)), 0);
        assert_eq!(ticker.due(start + Duration::from_millis(1800)), 1);
    }
}
