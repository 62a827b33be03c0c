//! 固定窗口限流
//!
//! 计数存放在共享缓存中，多实例共享同一窗口。
//! 读-改-写不是原子操作，并发请求可能略微超过阈值。
//! 任何缓存错误都放行（fail open）。

use std::sync::Arc;
use std::time::Duration;

use tracing::{trace, warn};

use crate::cache::SharedCache;
use crate::config::RateLimitConfig;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Denied,
}

impl RateDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

pub struct RateLimiter {
    cache: Arc<dyn SharedCache>,
    key_prefix: String,
    max_requests: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(
        cache: Arc<dyn SharedCache>,
        key_prefix: impl Into<String>,
        max_requests: u64,
        window: Duration,
    ) -> Self {
        Self {
            cache,
            key_prefix: key_prefix.into(),
            max_requests,
            window,
        }
    }

    pub fn from_config(
        cache: Arc<dyn SharedCache>,
        key_prefix: impl Into<String>,
        config: &RateLimitConfig,
    ) -> Self {
        Self::new(
            cache,
            key_prefix,
            config.max_requests,
            Duration::from_secs(config.window_secs),
        )
    }

    pub fn max_requests(&self) -> u64 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    fn make_key(&self, identity: &str) -> String {
        format!("{}rate_limit:{}", self.key_prefix, identity)
    }

    pub async fn allow(&self, identity: &str) -> RateDecision {
        let key = self.make_key(identity);

        let current = match self.cache.get(&key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Rate limiter read failed for {}, allowing: {}", identity, e);
                return RateDecision::Allowed;
            }
        };

        let next = match current.as_deref().map(str::parse::<u64>) {
            None => 1,
            Some(Ok(count)) => count.saturating_add(1),
            Some(Err(_)) => {
                // 无法解析的计数视为存储错误，重新开窗
                warn!(
                    "Corrupt rate limit counter for {}, restarting window",
                    identity
                );
                self.write(&key, identity, 1).await;
                return RateDecision::Allowed;
            }
        };

        if next > self.max_requests {
            trace!("Rate limit exceeded for {} ({})", identity, next);
            inc_plain_counter!(METRICS.rate_limited_total);
            return RateDecision::Denied;
        }

        self.write(&key, identity, next).await;
        RateDecision::Allowed
    }

    async fn write(&self, key: &str, identity: &str, count: u64) {
        if let Err(e) = self.cache.set(key, &count.to_string(), self.window).await {
            warn!("Rate limiter write failed for {}, allowing: {}", identity, e);
        }
    }
}
