//! Retry Policy - 单个服务尝试的限流重试
//!
//! 状态: Attempting → {Succeeded, RateLimited → Attempting, Failed}
//! - 429: 等待 Retry-After（缺省时指数退避）后向同一服务重发同一请求
//! - 其它错误: 立即终止，交给编排器回退到下一个服务
//! - 重试次数有上限，用尽后 RateLimited 也变为终止性错误

use std::future::Future;
use std::time::Duration;

use crate::application::ports::ProviderError;

/// 限流重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 每次服务尝试允许的最大限流重试次数
    pub max_rate_limit_retries: u32,
    /// 没有 Retry-After 头时的首次等待时间
    pub default_retry_after: Duration,
    /// 单次等待上限
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rate_limit_retries: 5,
            default_retry_after: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_rate_limit_retries: u32, default_retry_after: Duration, max_backoff: Duration) -> Self {
        Self {
            max_rate_limit_retries,
            default_retry_after,
            max_backoff,
        }
    }

    /// 第 `retry` 次（从 1 开始）重试前的等待时间
    pub fn backoff(&self, retry_after: Option<Duration>, retry: u32) -> Duration {
        let delay = match retry_after {
            Some(delay) => delay,
            None => {
                let exponent = retry.saturating_sub(1).min(16);
                self.default_retry_after.saturating_mul(1 << exponent)
            }
        };
        delay.min(self.max_backoff)
    }

    /// 执行一次服务尝试，遇到限流时重发
    pub async fn run<T, F, Fut>(&self, provider: &str, mut attempt: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut retries = 0u32;

        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(ProviderError::RateLimited { retry_after })
                    if retries < self.max_rate_limit_retries =>
                {
                    retries += 1;
                    let backoff = self.backoff(retry_after, retries);

                    tracing::warn!(
                        provider = %provider,
                        retry = retries,
                        max_retries = self.max_rate_limit_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "API rate limited, retrying same provider"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    if e.is_rate_limited() {
                        tracing::warn!(
                            provider = %provider,
                            retries = retries,
                            "Rate limit retries exhausted"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn rate_limited(secs: Option<u64>) -> ProviderError {
        ProviderError::RateLimited {
            retry_after: secs.map(Duration::from_secs),
        }
    }

    #[test]
    fn test_backoff_uses_retry_after() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(Some(Duration::from_secs(2)), 1), Duration::from_secs(2));
        assert_eq!(policy.backoff(Some(Duration::from_secs(2)), 4), Duration::from_secs(2));
    }

    #[test]
    fn test_backoff_exponential_without_header() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(None, 1), Duration::from_secs(1));
        assert_eq!(policy.backoff(None, 2), Duration::from_secs(2));
        assert_eq!(policy.backoff(None, 3), Duration::from_secs(4));
        assert_eq!(policy.backoff(None, 10), Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_capped() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(10));
        assert_eq!(policy.backoff(Some(Duration::from_secs(600)), 1), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_reissues_after_retry_after() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));
        let started = Instant::now();

        let result = policy
            .run("suno", || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(rate_limited(Some(2)))
                    } else {
                        Ok(started.elapsed())
                    }
                }
            })
            .await;

        let reissued_at = result.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(reissued_at >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_not_retried() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run("udio", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::ServerError { status: 503 }) }
            })
            .await;

        assert_eq!(result.unwrap_err(), ProviderError::ServerError { status: 503 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_bounded() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1), Duration::from_secs(5));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run("suno", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(rate_limited(None)) }
            })
            .await;

        assert!(result.unwrap_err().is_rate_limited());
        // 首次尝试 + 2 次重试
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_fails_fast() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1), Duration::from_secs(5));
        let started = Instant::now();

        let result: Result<(), _> = policy.run("suno", || async { Err(rate_limited(Some(9))) }).await;

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
