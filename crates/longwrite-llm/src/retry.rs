use std::time::Duration;

use longwrite_config::RetryConfig;

/// Attempt ceiling and exponential backoff for one generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Retry immediately, as many times as `max_attempts` allows
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to wait after `failed_attempts` attempts have failed.
    ///
    /// `min(base * 2^(failed_attempts - 1), max)`; zero base means no wait.
    #[must_use]
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        let base_ms = self.base_delay.as_millis();
        if base_ms == 0 || failed_attempts == 0 {
            return Duration::ZERO;
        }
        let max_ms = self.max_delay.as_millis().max(base_ms);
        let shift = (failed_attempts - 1).min(20);
        let backoff_ms = base_ms.saturating_mul(1u128 << shift).min(max_ms);
        Duration::from_millis(u64::try_from(backoff_ms).unwrap_or(u64::MAX))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_then_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(3_000),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1_000));
        assert_eq!(policy.backoff(3), Duration::from_millis(2_000));
        assert_eq!(policy.backoff(4), Duration::from_millis(3_000));
        assert_eq!(policy.backoff(60), Duration::from_millis(3_000));
    }

    #[test]
    fn test_zero_base_disables_backoff() {
        let policy = RetryPolicy::immediate(10);
        assert_eq!(policy.backoff(1), Duration::ZERO);
        assert_eq!(policy.backoff(9), Duration::ZERO);
    }

    #[test]
    fn test_from_config_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_millis(30_000));
    }
}
