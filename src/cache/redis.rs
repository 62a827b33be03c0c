use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::cache::SharedCache;
use crate::errors::{Result, ShortenerError};

/// Redis 共享缓存，多实例部署时作为限流计数与链接缓存的公共存储
pub struct RedisCache {
    client: redis::Client,
    /// 持久化连接，使用 RwLock 保护
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    op_timeout: Duration,
}

impl RedisCache {
    /// 创建客户端，不建立连接；首次使用时再连接
    pub fn new(url: &str, op_timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            ShortenerError::configuration(format!("Invalid Redis URL '{}': {}", url, e))
        })?;

        debug!("RedisCache created for {}, op timeout {:?}", url, op_timeout);

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            op_timeout,
        })
    }

    /// 获取或建立持久连接
    async fn get_connection(
        &self,
    ) -> std::result::Result<MultiplexedConnection, redis::RedisError> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // 双重检查，避免竞态条件
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = self.client.get_multiplexed_async_connection().await?;
        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection established and cached");

        Ok(new_conn)
    }

    /// 重置连接（在连接错误时调用）
    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    /// 在超时内执行一次命令；失败时丢弃连接，下次调用重新建立
    async fn run<T, F, Fut>(&self, op: &str, f: F) -> Result<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let attempt = async {
            let conn = self.get_connection().await?;
            f(conn).await
        };

        match tokio::time::timeout(self.op_timeout, attempt).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                self.reset_connection().await;
                Err(ShortenerError::cache_unavailable(format!(
                    "Redis {} failed: {}",
                    op, e
                )))
            }
            Err(_) => {
                self.reset_connection().await;
                Err(ShortenerError::cache_unavailable(format!(
                    "Redis {} timed out after {:?}",
                    op, self.op_timeout
                )))
            }
        }
    }
}

#[async_trait]
impl SharedCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .run("GET", |mut conn| async move {
                conn.get::<_, Option<String>>(key).await
            })
            .await?;
        trace!("Redis GET {} -> hit={}", key, value.is_some());
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let ttl_secs = ttl.as_secs().max(1);
        self.run("SETEX", |mut conn| async move {
            conn.set_ex::<_, _, ()>(key, value, ttl_secs).await
        })
        .await?;
        trace!("Redis SETEX {} ({}s)", key, ttl_secs);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let deleted = self
            .run("DEL", |mut conn| async move { conn.del::<_, i64>(key).await })
            .await?;
        trace!("Redis DEL {} -> {}", key, deleted);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.run("PING", |mut conn| async move {
            redis::cmd("PING").query_async::<String>(&mut conn).await
        })
        .await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_configuration_error() {
        let result = RedisCache::new("not-a-redis-url", Duration::from_millis(100));
        assert!(matches!(result, Err(ShortenerError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_unavailable() {
        // 端口 1 上不会有 Redis
        let cache = RedisCache::new("redis://127.0.0.1:1/", Duration::from_millis(200)).unwrap();
        let result = cache.get("anything").await;
        assert!(matches!(result, Err(ShortenerError::CacheUnavailable(_))));
        assert!(cache.ping().await.is_err());
    }
}
