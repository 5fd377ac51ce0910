use crate::error::{DriverError, DriverResult};
use fantoccini::elements::Element;
use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
/// Jitter applied between keystrokes so typed text does not arrive in one burst.
pub struct TypingCadence {
    min_ms: u64,
    max_ms: u64,
}

impl Default for TypingCadence {
    fn default() -> Self {
        Self::new(30, 150)
    }
}

impl TypingCadence {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: max_ms.max(min_ms),
        }
    }

    /// Sleep for a random duration between the configured bounds.
    pub async fn keystroke_pause(&self) {
        let ms = OsRng.gen_range(self.min_ms..=self.max_ms);
        sleep(Duration::from_millis(ms)).await;
    }

    /// Type the provided text one character at a time.
    pub async fn type_into(&self, element: &Element, text: &str) -> DriverResult<()> {
        for ch in text.chars() {
            element
                .send_keys(&ch.to_string())
                .await
                .map_err(|e| DriverError::Interaction(format!("typing failed: {e}")))?;
            self.keystroke_pause().await;
        }
        Ok(())
    }
}
