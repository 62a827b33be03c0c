//! Cache-aside 链接缓存
//!
//! 包装 `SharedCache`，把所有后端错误降级为 miss / 无操作：
//! 缓存故障只影响延迟，不影响正确性。

use std::sync::Arc;
use std::time::Duration;

use tracing::{trace, warn};

use super::SharedCache;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

pub struct LinkCache {
    backend: Arc<dyn SharedCache>,
    key_prefix: String,
    ttl: Duration,
}

impl LinkCache {
    pub fn new(
        backend: Arc<dyn SharedCache>,
        key_prefix: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            backend,
            key_prefix: key_prefix.into(),
            ttl,
        }
    }

    fn make_key(&self, code: &str) -> String {
        format!("{}link:{}", self.key_prefix, code)
    }

    /// 命中返回目标 URL；未命中或缓存错误都返回 None
    pub async fn get(&self, code: &str) -> Option<String> {
        match self.backend.get(&self.make_key(code)).await {
            Ok(Some(target)) => {
                trace!("Link cache hit: {}", code);
                inc_plain_counter!(METRICS.cache_hits_total);
                Some(target)
            }
            Ok(None) => {
                trace!("Link cache miss: {}", code);
                inc_plain_counter!(METRICS.cache_misses_total);
                None
            }
            Err(e) => {
                warn!("Link cache get failed for {}, falling back to store: {}", code, e);
                inc_counter!(METRICS.cache_errors_total, &["get"]);
                None
            }
        }
    }

    /// 以固定 TTL 写入；失败只记录日志
    pub async fn put(&self, code: &str, target_url: &str) {
        if let Err(e) = self
            .backend
            .set(&self.make_key(code), target_url, self.ttl)
            .await
        {
            warn!("Failed to populate link cache for {}: {}", code, e);
            inc_counter!(METRICS.cache_errors_total, &["set"]);
        }
    }

    /// 运维用途：映射不可变，正常流程不需要失效
    pub async fn invalidate(&self, code: &str) {
        if let Err(e) = self.backend.delete(&self.make_key(code)).await {
            warn!("Failed to invalidate link cache for {}: {}", code, e);
            inc_counter!(METRICS.cache_errors_total, &["delete"]);
        }
    }

    pub async fn ping(&self) -> bool {
        match self.backend.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Cache health check failed: {}", e);
                false
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }
}
