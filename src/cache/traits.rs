use std::time::Duration;

use async_trait::async_trait;

use crate::errors::Result;

/// 共享键值缓存原语（带逐键 TTL）
///
/// 后端实现对每次调用施加超时，超时与连接错误都返回 `CacheUnavailable`。
/// 缓存永远不是事实来源，调用方负责决定错误如何降级。
#[async_trait]
pub trait SharedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// 存活探测
    async fn ping(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}
