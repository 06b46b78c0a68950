use std::time::Duration;

use super::config::env_u64_clamped;

/// Backoff policy for model requests that fail before any text arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_millis(4_000),
        }
    }
}

impl RetryConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: env_u64_clamped("AI_MAX_ATTEMPTS", defaults.max_attempts as u64, 1, 20)
                as usize,
            base_delay: Duration::from_millis(env_u64_clamped(
                "AI_RETRY_BASE_DELAY_MS",
                defaults.base_delay.as_millis() as u64,
                0,
                60_000,
            )),
            max_delay: Duration::from_millis(env_u64_clamped(
                "AI_RETRY_MAX_DELAY_MS",
                defaults.max_delay.as_millis() as u64,
                0,
                300_000,
            )),
        }
    }

    /// Delay before retrying after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: usize) -> Duration {
        if attempt <= 1 {
            return self.base_delay.min(self.max_delay);
        }

        let exp_shift = (attempt - 1).min(30) as u32;
        let base_ms = self.base_delay.as_millis() as u64;
        let raw_ms = base_ms.saturating_mul(1u64 << exp_shift);
        Duration::from_millis(raw_ms).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let retry = RetryConfig {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(retry.backoff(1), Duration::from_millis(100));
        assert_eq!(retry.backoff(2), Duration::from_millis(200));
        assert_eq!(retry.backoff(3), Duration::from_millis(350));
        assert_eq!(retry.backoff(40), Duration::from_millis(350));
    }

    #[test]
    fn test_backoff_zero_base() {
        let retry = RetryConfig {
            base_delay: Duration::ZERO,
            ..RetryConfig::default()
        };
        assert_eq!(retry.backoff(3), Duration::ZERO);
    }
}
