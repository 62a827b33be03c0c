//! 短链接核心引擎
//!
//! - `shorten`: Validate → Allocate → Persist → CachePopulate
//! - `resolve`: CacheLookup → (miss) StoreLookup → CachePopulate → CaptureAnalytics
//! - `stats`: 存储聚合
//!
//! 写路径优先保证持久化：映射写入成功后缓存填充失败不算操作失败。
//! 读路径优先保证可用性：缓存故障只回退到存储。

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use super::allocator::Allocator;
use crate::analytics::ClickPipeline;
use crate::cache::LinkCache;
use crate::errors::{Result, ShortenerError};
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
use crate::storage::{LinkStore, SequenceSource, UrlMapping, UrlStats};
use crate::utils::url_validator::{is_valid_short_code, normalize_url, validate_custom_alias};

/// 生成短码写入冲突时的最大尝试次数
const GENERATED_CODE_ATTEMPTS: usize = 3;

fn new_mapping(code: String, target_url: String, is_custom_alias: bool) -> UrlMapping {
    UrlMapping {
        code,
        target_url,
        is_custom_alias,
        created_at: Utc::now(),
        expires_at: None,
    }
}

pub struct LinkService {
    allocator: Allocator,
    store: Arc<dyn LinkStore>,
    cache: Arc<LinkCache>,
    pipeline: Arc<ClickPipeline>,
}

impl LinkService {
    pub fn new(
        store: Arc<dyn LinkStore>,
        sequence: Arc<dyn SequenceSource>,
        cache: Arc<LinkCache>,
        pipeline: Arc<ClickPipeline>,
    ) -> Self {
        Self {
            allocator: Allocator::new(sequence, Arc::clone(&store)),
            store,
            cache,
            pipeline,
        }
    }

    /// 创建短链接
    #[instrument(skip(self), fields(alias = ?custom_alias))]
    pub async fn shorten(&self, url: &str, custom_alias: Option<&str>) -> Result<UrlMapping> {
        // 校验全部在分配与存储访问之前完成
        let target_url =
            normalize_url(url).map_err(|e| ShortenerError::invalid_url(e.to_string()))?;
        if let Some(alias) = custom_alias {
            validate_custom_alias(alias)
                .map_err(|e| ShortenerError::invalid_alias(e.to_string()))?;
        }

        let mapping = match custom_alias {
            Some(_) => {
                let allocated = self.allocator.allocate(custom_alias).await?;
                let mapping = new_mapping(allocated.code, target_url, allocated.is_custom_alias);
                self.persist(&mapping).await?;
                mapping
            }
            None => self.persist_generated(target_url).await?,
        };

        self.cache.put(&mapping.code, &mapping.target_url).await;

        inc_counter!(
            METRICS.links_created_total,
            &[if mapping.is_custom_alias { "custom" } else { "generated" }]
        );
        info!("Created short link '{}' -> {}", mapping.code, mapping.target_url);

        Ok(mapping)
    }

    /// 生成短码并写入；生成码撞上已有别名时换下一个序列值
    async fn persist_generated(&self, target_url: String) -> Result<UrlMapping> {
        for attempt in 1..=GENERATED_CODE_ATTEMPTS {
            let allocated = self.allocator.allocate(None).await?;
            let mapping = new_mapping(allocated.code, target_url.clone(), allocated.is_custom_alias);
            match self.persist(&mapping).await {
                Ok(()) => return Ok(mapping),
                Err(ShortenerError::AliasConflict(_)) => {
                    warn!(
                        "Generated code '{}' already taken (attempt {}/{})",
                        mapping.code, attempt, GENERATED_CODE_ATTEMPTS
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(ShortenerError::storage_unavailable(format!(
            "No free generated code after {} attempts",
            GENERATED_CODE_ATTEMPTS
        )))
    }

    async fn persist(&self, mapping: &UrlMapping) -> Result<()> {
        self.store.insert(mapping).await.inspect_err(|e| {
            if !matches!(e, ShortenerError::AliasConflict(_)) {
                error!("Failed to persist mapping '{}': {}", mapping.code, e);
            }
        })
    }

    /// 解析短码到目标 URL，成功后异步记录点击
    pub async fn resolve(
        &self,
        code: &str,
        client_ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<String> {
        let target = self.lookup(code).await?;
        self.pipeline.capture(code, client_ip, user_agent);
        Ok(target)
    }

    /// 只解析不记录点击（HEAD 请求）
    pub async fn lookup(&self, code: &str) -> Result<String> {
        if !is_valid_short_code(code) {
            return Err(ShortenerError::not_found(format!(
                "Short code '{}' not found",
                code
            )));
        }

        if let Some(target) = self.cache.get(code).await {
            return Ok(target);
        }

        match self.store.get(code).await {
            Ok(Some(mapping)) => {
                self.cache.put(code, &mapping.target_url).await;
                Ok(mapping.target_url)
            }
            Ok(None) => {
                debug!("Short code not found: {}", code);
                Err(ShortenerError::not_found(format!(
                    "Short code '{}' not found",
                    code
                )))
            }
            Err(e) => {
                error!("Store lookup failed for '{}': {}", code, e);
                Err(e)
            }
        }
    }

    /// 查询链接统计
    pub async fn stats(&self, code: &str) -> Result<UrlStats> {
        if !is_valid_short_code(code) {
            return Err(ShortenerError::not_found(format!(
                "Short code '{}' not found",
                code
            )));
        }

        self.store.stats(code).await?.ok_or_else(|| {
            ShortenerError::not_found(format!("Short code '{}' not found", code))
        })
    }

    pub fn store(&self) -> &Arc<dyn LinkStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<LinkCache> {
        &self.cache
    }

    pub fn pipeline(&self) -> &Arc<ClickPipeline> {
        &self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{ClickEvent, ClickSink, PipelineSettings};
    use crate::cache::{MemoryCache, SharedCache};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct MemStore {
        links: Mutex<HashMap<String, UrlMapping>>,
        gets: AtomicUsize,
        fail: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl LinkStore for MemStore {
        async fn insert(&self, mapping: &UrlMapping) -> Result<()> {
            let mut links = self.links.lock().unwrap();
            if links.contains_key(&mapping.code) {
                return Err(ShortenerError::alias_conflict("taken"));
            }
            links.insert(mapping.code.clone(), mapping.clone());
            Ok(())
        }

        async fn get(&self, code: &str) -> Result<Option<UrlMapping>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(ShortenerError::storage_unavailable("db down"));
            }
            Ok(self.links.lock().unwrap().get(code).cloned())
        }

        async fn exists(&self, code: &str) -> Result<bool> {
            Ok(self.links.lock().unwrap().contains_key(code))
        }

        async fn stats(&self, code: &str) -> Result<Option<UrlStats>> {
            Ok(self.links.lock().unwrap().get(code).map(|m| UrlStats {
                code: m.code.clone(),
                target_url: m.target_url.clone(),
                created_at: m.created_at,
                click_count: 0,
            }))
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Counter(AtomicU64);

    #[async_trait]
    impl SequenceSource for Counter {
        async fn next_value(&self) -> Result<u64> {
            Ok(self.0.fetch_add(1, Ordering::SeqCst) + 1000)
        }
    }

    struct NullSink;

    #[async_trait]
    impl ClickSink for NullSink {
        async fn record_click(&self, _event: &ClickEvent) -> anyhow::Result<()> {
            Ok(())
        }
        async fn click_count(&self, _code: &str) -> anyhow::Result<u64> {
            Ok(0)
        }
    }

    fn service() -> (LinkService, Arc<MemStore>, Arc<MemoryCache>) {
        let store = Arc::new(MemStore::default());
        let backend = Arc::new(MemoryCache::new(1000));
        let cache = Arc::new(LinkCache::new(
            backend.clone(),
            "test:",
            Duration::from_secs(60),
        ));
        let pipeline = Arc::new(ClickPipeline::new(
            Arc::new(NullSink),
            PipelineSettings::default(),
        ));
        let svc = LinkService::new(
            store.clone(),
            Arc::new(Counter::default()),
            cache,
            pipeline,
        );
        (svc, store, backend)
    }

    #[tokio::test]
    async fn test_shorten_normalizes_and_populates_cache() {
        let (svc, _, backend) = service();
        let mapping = svc.shorten("example.com", None).await.unwrap();

        assert_eq!(mapping.target_url, "https://example.com");
        assert_eq!(mapping.code, "g8"); // base62(1000)
        assert!(!mapping.is_custom_alias);
        assert_eq!(
            backend.get("test:link:g8").await.unwrap().as_deref(),
            Some("https://example.com")
        );
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_allocation() {
        let (svc, store, _) = service();
        for url in ["", "javascript:alert(1)", "ftp://files.example.com"] {
            let err = svc.shorten(url, None).await.unwrap_err();
            assert!(matches!(err, ShortenerError::InvalidUrl(_)), "{}", url);
        }
        assert!(store.links.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reserved_alias_is_invalid() {
        let (svc, _, _) = service();
        let err = svc.shorten("https://example.com", Some("api")).await.unwrap_err();
        assert!(matches!(err, ShortenerError::InvalidAlias(_)));
    }

    #[tokio::test]
    async fn test_duplicate_alias_conflicts() {
        let (svc, _, _) = service();
        svc.shorten("https://a.example", Some("promo")).await.unwrap();
        let err = svc
            .shorten("https://b.example", Some("promo"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::AliasConflict(_)));
    }

    #[tokio::test]
    async fn test_generated_code_skips_taken_alias() {
        let (svc, store, _) = service();
        // base62(1000) = "g8", base62(1001) = "g9"
        store.links.lock().unwrap().insert(
            "g8".to_string(),
            new_mapping("g8".to_string(), "https://squat.example".to_string(), true),
        );

        let mapping = svc.shorten("https://b.example", None).await.unwrap();
        assert_eq!(mapping.code, "g9");
        assert!(!mapping.is_custom_alias);
    }

    #[tokio::test]
    async fn test_generated_code_gives_up_after_bounded_attempts() {
        let (svc, store, _) = service();
        for code in ["g8", "g9", "ga"] {
            store.links.lock().unwrap().insert(
                code.to_string(),
                new_mapping(code.to_string(), "https://squat.example".to_string(), true),
            );
        }

        let err = svc.shorten("https://b.example", None).await.unwrap_err();
        assert!(matches!(err, ShortenerError::StorageUnavailable(_)));

        // 下一次请求从未被占用的序列值继续
        let mapping = svc.shorten("https://b.example", None).await.unwrap();
        assert_eq!(mapping.code, "gb");
    }

    #[tokio::test]
    async fn test_resolve_hit_skips_store() {
        let (svc, store, _) = service();
        let mapping = svc.shorten("https://example.com/a", None).await.unwrap();

        let target = svc.resolve(&mapping.code, None, None).await.unwrap();
        assert_eq!(target, "https://example.com/a");
        assert_eq!(store.gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolve_miss_populates_cache() {
        let (svc, store, backend) = service();
        let mapping = svc.shorten("https://example.com/a", None).await.unwrap();
        svc.cache().invalidate(&mapping.code).await;

        assert_eq!(
            svc.resolve(&mapping.code, None, None).await.unwrap(),
            "https://example.com/a"
        );
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
        assert!(
            backend
                .get(&format!("test:link:{}", mapping.code))
                .await
                .unwrap()
                .is_some()
        );

        // 第二次命中缓存
        svc.resolve(&mapping.code, None, None).await.unwrap();
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_unknown_and_invalid_codes() {
        let (svc, store, _) = service();
        assert!(matches!(
            svc.resolve("nope", None, None).await,
            Err(ShortenerError::NotFound(_))
        ));
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);

        // 非法短码不访问存储
        assert!(matches!(
            svc.resolve("bad.code", None, None).await,
            Err(ShortenerError::NotFound(_))
        ));
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_store_failure_surfaces() {
        let (svc, store, _) = service();
        store.fail.store(true, Ordering::SeqCst);
        assert!(matches!(
            svc.resolve("abc", None, None).await,
            Err(ShortenerError::StorageUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_stats_unknown_is_not_found() {
        let (svc, _, _) = service();
        assert!(matches!(
            svc.stats("missing").await,
            Err(ShortenerError::NotFound(_))
        ));
    }
}
