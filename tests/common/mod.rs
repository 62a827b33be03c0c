//! 集成测试共用的环境构造
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use shortener::cache::{MemoryCache, SharedCache};
use shortener::config::StaticConfig;
use shortener::errors::{Result, ShortenerError};
use shortener::runtime::lifetime::startup::StartupContext;
use shortener::storage::SeaOrmStorage;
use shortener::storage::backend::{connect_sqlite, run_migrations};

/// 临时 SQLite 数据库 + 装配好的服务；`_dir` 必须与环境同生命周期
pub struct TestEnv {
    pub ctx: StartupContext,
    pub storage: Arc<SeaOrmStorage>,
    pub cache: Arc<dyn SharedCache>,
    pub config: StaticConfig,
    _dir: TempDir,
}

pub fn test_config() -> StaticConfig {
    let mut config = StaticConfig::default();
    config.cache.key_prefix = "test:".to_string();
    config.analytics.batch_size = 1;
    config.analytics.flush_interval_secs = 1;
    config
}

pub async fn sqlite_storage(config: &StaticConfig) -> (Arc<SeaOrmStorage>, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());

    let db = connect_sqlite(&db_url, 4)
        .await
        .expect("Failed to connect to SQLite");
    run_migrations(&db).await.expect("Failed to run migrations");

    let storage = Arc::new(SeaOrmStorage::from_connection(
        db,
        "sqlite",
        &config.database,
    ));
    (storage, dir)
}

pub async fn setup_with(config: StaticConfig, cache: Arc<dyn SharedCache>) -> TestEnv {
    let (storage, dir) = sqlite_storage(&config).await;
    let ctx = StartupContext::assemble(storage.clone(), cache.clone(), &config);
    TestEnv {
        ctx,
        storage,
        cache,
        config,
        _dir: dir,
    }
}

pub async fn setup() -> TestEnv {
    setup_with(test_config(), Arc::new(MemoryCache::new(10_000))).await
}

/// 所有操作都失败的缓存，模拟缓存宕机
pub struct BrokenCache;

#[async_trait]
impl SharedCache for BrokenCache {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(ShortenerError::cache_unavailable("connection refused"))
    }
    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        Err(ShortenerError::cache_unavailable("connection refused"))
    }
    async fn delete(&self, _key: &str) -> Result<()> {
        Err(ShortenerError::cache_unavailable("connection refused"))
    }
    async fn ping(&self) -> Result<()> {
        Err(ShortenerError::cache_unavailable("connection refused"))
    }
    fn backend_name(&self) -> &'static str {
        "broken"
    }
}

/// 轮询等待条件成立（后台 worker 异步刷盘）
pub async fn wait_until<F: Fn() -> bool>(cond: F) {
    for _ in 0..300 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
