//! Randomized pauses between human-like actions.
use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

/// Bounds of the pause in milliseconds, half-open: `[min_ms, max_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayBounds {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for DelayBounds {
    fn default() -> Self {
        Self {
            min_ms: 1000,
            max_ms: 3000,
        }
    }
}

/// Produces pauses uniformly distributed over its bounds.
///
/// A pause is a plain suspension point. It is not cancellable; a stop
/// request is noticed at the engine's next checkpoint.
#[derive(Debug, Clone, Copy)]
pub struct DelaySimulator {
    min_ms: u64,
    max_ms: u64,
}

impl Default for DelaySimulator {
    fn default() -> Self {
        Self::new(DelayBounds::default())
    }
}

impl DelaySimulator {
    /// Swapped bounds are reordered; equal bounds give a fixed pause.
    pub fn new(bounds: DelayBounds) -> Self {
        Self {
            min_ms: bounds.min_ms.min(bounds.max_ms),
            max_ms: bounds.max_ms.max(bounds.min_ms),
        }
    }

    /// Draw the next pause length.
    pub fn sample(&self) -> Duration {
        let ms = if self.min_ms == self.max_ms {
            self.min_ms
        } else {
            OsRng.gen_range(self.min_ms..self.max_ms)
        };
        Duration::from_millis(ms)
    }

    /// Sleep for a freshly sampled duration and return it.
    pub async fn pause(&self) -> Duration {
        let pause = self.sample();
        sleep(pause).await;
        pause
    }
}
