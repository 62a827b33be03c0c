pub mod link_cache;
pub mod memory;
pub mod redis;
mod traits;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::{CacheConfig, CacheType};
use crate::errors::Result;

pub use link_cache::LinkCache;
pub use memory::MemoryCache;
pub use redis::RedisCache;
pub use traits::SharedCache;

pub struct CacheFactory;

impl CacheFactory {
    /// 按配置创建共享缓存后端
    pub fn create(config: &CacheConfig) -> Result<Arc<dyn SharedCache>> {
        let cache: Arc<dyn SharedCache> = match config.cache_type {
            CacheType::Memory => Arc::new(MemoryCache::new(config.memory.max_capacity)),
            CacheType::Redis => Arc::new(RedisCache::new(
                &config.redis.url,
                Duration::from_millis(config.op_timeout_ms),
            )?),
        };

        info!("Cache backend selected: {}", cache.backend_name());
        Ok(cache)
    }
}
