use std::time::Duration;
use crate::core::error::TransferError;

/// 重试策略
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64, // 抖动因子，避免多个任务同时重试
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryStrategy {
    /// 不重试，测试和一次性任务使用
    pub fn none() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    pub fn should_retry(&self, error: &TransferError, retries_used: u32) -> bool {
        retries_used < self.max_retries && error.is_retryable()
    }

    /// 第 `attempt` 次重试前的等待时间（从 0 开始）
    pub fn get_delay(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let delay_secs = self.base_delay.as_secs_f64() *
            self.backoff_multiplier.powi(attempt as i32);

        let jitter = delay_secs * self.jitter_factor * (rand::random::<f64>() - 0.5);
        let final_delay = (delay_secs + jitter).max(0.0);

        Duration::from_secs_f64(final_delay).min(self.max_delay)
    }
}
