//! Exponential backoff with jitter

use std::time::Duration;

use rand::Rng;

/// Retry delay schedule: `base * factor^(attempt - 1)`, capped, plus jitter
#[derive(Debug, Clone)]
pub struct Backoff {
    pub base: Duration,
    pub factor: u32,
    pub cap: Duration,
    /// Upper bound of the added jitter as a fraction of the delay
    pub jitter: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(15),
            factor: 2,
            cap: Duration::from_secs(10 * 60),
            jitter: 0.2,
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (1-based), without jitter
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let multiplier = self.factor.saturating_pow(exponent);
        self.base.saturating_mul(multiplier).min(self.cap)
    }

    /// Delay before retry number `attempt`, jittered and still capped
    pub fn delay_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let delay = self.base_delay(attempt);
        let spread = delay.as_secs_f64() * self.jitter.clamp(0.0, 1.0);
        let extra = if spread > 0.0 {
            rng.random_range(0.0..=spread)
        } else {
            0.0
        };
        let extra = Duration::try_from_secs_f64(extra).unwrap_or(Duration::MAX);
        delay.saturating_add(extra).min(self.cap)
    }

    /// Delay using the thread-local generator
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with(attempt, &mut rand::rng())
    }
}
