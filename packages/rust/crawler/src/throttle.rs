//! Randomized pause enforced before every external fetch.

use std::time::Duration;

use rand::Rng;
use tracing::trace;

use cardtrack_shared::DelayRange;

/// Sleeps a uniformly random duration within a [`DelayRange`].
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    range: DelayRange,
}

impl Throttle {
    pub fn new(range: DelayRange) -> Self {
        Self { range }
    }

    /// Pick the next delay.
    pub fn sample(&self) -> Duration {
        let min = self.range.min.as_millis() as u64;
        let max = self.range.max.as_millis() as u64;
        if min >= max {
            return self.range.min;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    /// Wait before the next fetch.
    pub async fn pause(&self) {
        let delay = self.sample();
        if delay.is_zero() {
            return;
        }
        trace!(delay_ms = delay.as_millis() as u64, "throttling");
        tokio::time::sleep(delay).await;
    }
}
