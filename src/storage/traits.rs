use async_trait::async_trait;

use super::models::{UrlMapping, UrlStats};
use crate::errors::Result;

/// 持久化映射存储，唯一的事实来源
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// 写入新映射，短码已存在时返回 `AliasConflict`
    async fn insert(&self, mapping: &UrlMapping) -> Result<()>;

    async fn get(&self, code: &str) -> Result<Option<UrlMapping>>;

    async fn exists(&self, code: &str) -> Result<bool>;

    /// 映射与点击数聚合，短码不存在时返回 `None`
    async fn stats(&self, code: &str) -> Result<Option<UrlStats>>;

    /// 健康检查
    async fn ping(&self) -> Result<()>;
}

/// 全局单调递增序列，每个值至多发放给一个调用者
#[async_trait]
pub trait SequenceSource: Send + Sync {
    async fn next_value(&self) -> Result<u64>;
}
