use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Exponential delivery backoff: attempt *n* waits
/// `min(max_delay, min_delay * 2^(n-1))`, jittered by ±`jitter`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "RetryPolicy::default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "RetryPolicy::default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "RetryPolicy::default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "RetryPolicy::default_jitter")]
    pub jitter: f64,
}

impl RetryPolicy {
    fn default_min_delay_ms() -> u64 {
        250
    }

    fn default_max_delay_ms() -> u64 {
        30_000
    }

    fn default_max_attempts() -> u32 {
        5
    }

    fn default_jitter() -> f64 {
        0.2
    }

    /// Delay to wait after attempt `attempt` (1-based) failed.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(32);
        let base = (self.min_delay_ms as f64) * 2f64.powi(exp as i32);
        let mut delay = base.min(self.max_delay_ms as f64);
        if self.jitter > 0.0 {
            let mut rng = rand::thread_rng();
            let factor = 1.0 + rng.gen_range(-self.jitter..self.jitter);
            delay = (delay * factor).max(0.0);
        }
        Duration::from_millis(delay.round() as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_delay_ms: Self::default_min_delay_ms(),
            max_delay_ms: Self::default_max_delay_ms(),
            max_attempts: Self::default_max_attempts(),
            jitter: Self::default_jitter(),
        }
    }
}
