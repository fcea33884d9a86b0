// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

/// 重试策略配置
///
/// 按调用点参数化：抓取重试与验证轮询使用不同的实例。
/// 退避时间在区间内均匀随机，本身即带抖动。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 退避时间下限
    pub backoff_min: Duration,
    /// 退避时间上限
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_min: Duration::from_secs(2),
            backoff_max: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_min: Duration, backoff_max: Duration) -> Self {
        Self {
            max_attempts,
            backoff_min,
            backoff_max,
        }
    }

    /// 计算一次随机退避时间
    pub fn backoff(&self) -> Duration {
        if self.backoff_max <= self.backoff_min {
            return self.backoff_min;
        }
        let range = self.backoff_min.as_millis() as u64..self.backoff_max.as_millis() as u64;
        Duration::from_millis(rand::random_range(range))
    }

    /// 是否应该继续尝试
    ///
    /// `attempt` 为已完成的尝试次数
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_within_range() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let backoff = policy.backoff();
            assert!(backoff >= policy.backoff_min);
            assert!(backoff <= policy.backoff_max);
        }
    }

    #[test]
    fn test_degenerate_range_returns_min() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(), Duration::from_secs(2));
    }

    #[test]
    fn test_should_retry_bound() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert!(!policy.should_retry(4));
    }
}
