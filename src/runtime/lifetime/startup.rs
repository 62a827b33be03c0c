use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::analytics::{ClickPipeline, ClickSink, PipelineSettings};
use crate::cache::{CacheFactory, LinkCache, SharedCache};
use crate::config::StaticConfig;
use crate::services::{LinkService, RateLimiter};
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub link_service: Arc<LinkService>,
    pub pipeline: Arc<ClickPipeline>,
    /// `rate_limit.enabled = false` 时为 None
    pub rate_limiter: Option<Arc<RateLimiter>>,
}

impl StartupContext {
    /// 用已建立的存储与缓存后端装配服务（需要在 tokio 运行时内调用）
    pub fn assemble(
        storage: Arc<SeaOrmStorage>,
        shared_cache: Arc<dyn SharedCache>,
        config: &StaticConfig,
    ) -> Self {
        let sink: Arc<dyn ClickSink> = storage.clone();
        let pipeline = Arc::new(ClickPipeline::new(
            sink,
            PipelineSettings::from(&config.analytics),
        ));

        let link_cache = Arc::new(LinkCache::new(
            shared_cache.clone(),
            config.cache.key_prefix.clone(),
            Duration::from_secs(config.cache.default_ttl),
        ));

        let link_service = Arc::new(LinkService::new(
            storage.clone(),
            storage.clone(),
            link_cache,
            pipeline.clone(),
        ));

        let rate_limiter = if config.rate_limit.enabled {
            Some(Arc::new(RateLimiter::from_config(
                shared_cache,
                config.cache.key_prefix.clone(),
                &config.rate_limit,
            )))
        } else {
            warn!("Rate limiting is disabled in configuration");
            None
        };

        Self {
            storage,
            link_service,
            pipeline,
            rate_limiter,
        }
    }
}

/// 准备服务器启动的上下文
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    // Redis TLS 连接需要进程级 crypto provider
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let storage = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let shared_cache = CacheFactory::create(&config.cache).context("Failed to create cache")?;

    let context = StartupContext::assemble(storage, shared_cache, config);

    info!("Pre-startup processing completed in {:?}", start_time.elapsed());
    Ok(context)
}
