use std::fmt::Display;
use std::time::Duration;

/// 指數退避重試設定：等待時間 = multiplier * 2^n，並夾在 [min_delay, max_delay]
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_secs(1),
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            multiplier: Duration::ZERO,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, retry_index: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry_index);
        self.multiplier
            .saturating_mul(factor)
            .clamp(self.min_delay, self.max_delay.max(self.min_delay))
    }

    pub fn backoff(&self) -> Backoff<'_> {
        Backoff {
            policy: self,
            attempt: 0,
        }
    }
}

/// 單次重試流程的狀態。呼叫端自行執行操作，失敗時呼叫 `retry_after`。
/// 失敗即重試，不區分暫時或永久錯誤。
pub struct Backoff<'a> {
    policy: &'a RetryPolicy,
    attempt: u32,
}

impl Backoff<'_> {
    /// 記錄一次失敗；還有次數就等待後回傳 true，否則回傳 false
    pub async fn retry_after(&mut self, error: &impl Display) -> bool {
        self.attempt += 1;
        if self.attempt >= self.policy.max_attempts {
            return false;
        }
        let delay = self.policy.delay_for(self.attempt - 1);
        tracing::debug!(
            "Attempt {}/{} failed: {}; retrying in {:?}",
            self.attempt,
            self.policy.max_attempts,
            error,
            delay
        );
        tokio::time::sleep(delay).await;
        true
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}
