//! Fixed-period trigger for reconciliation passes.

use tokio::time::{interval, Duration, Instant, Interval, MissedTickBehavior};

/// Yields one trigger per period. The caller awaits each pass before asking
/// for the next trigger, so passes never overlap; periods that elapse while
/// a pass runs collapse into a single pending trigger.
pub struct Scheduler {
    interval: Interval,
}

impl Scheduler {
    /// The first trigger fires immediately.
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    pub async fn next(&mut self) -> Instant {
        self.interval.tick().await
    }
}
