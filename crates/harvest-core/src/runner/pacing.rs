//! Randomized inter-request pauses.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Seeded when `seed` is given (reproducible runs), from OS entropy otherwise.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Draws pause lengths uniformly from `[min, max]`.
#[derive(Debug)]
pub struct Pacer {
    min: Duration,
    max: Duration,
    rng: StdRng,
}

impl Pacer {
    /// Bounds are swapped if given in the wrong order.
    pub fn new(min: Duration, max: Duration, rng: StdRng) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self { min, max, rng }
    }

    pub fn next_delay(&mut self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let secs = self
            .rng
            .gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::try_from_secs_f64(secs).unwrap_or(self.max).clamp(self.min, self.max)
    }

    /// Sleeps for the next delay. Returns false if `cancel` fired first.
    pub async fn pause(&mut self, cancel: &CancellationToken) -> bool {
        let delay = self.next_delay();
        tracing::debug!(delay_ms = delay.as_millis() as u64, "pausing before next page");
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = cancel.cancelled() => false,
        }
    }
}
