use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::errors::{Result, ShortenerError};

/// 缓存后端类型
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Default,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CacheType {
    /// 进程内 moka 缓存，单实例部署与测试
    #[default]
    Memory,
    /// Redis 共享缓存，多实例部署
    Redis,
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 监听地址、端口、worker 数量
/// - database: 数据库连接配置
/// - cache: 共享缓存配置
/// - analytics: 点击采集管道配置
/// - rate_limit: 固定窗口限流配置
/// - api: 对外 URL 配置
/// - logging: 日志配置
///
/// 各组件通过构造参数接收自己的配置段，全局实例只在启动时读取。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：SU，分隔符：__
    /// 示例：SU__SERVER__PORT=9999
    pub fn load(path: Option<&str>) -> Result<Self> {
        use config::{Config, Environment, File};

        let path = path.unwrap_or("config.toml");

        let settings = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 SU，分隔符 __
            .add_source(
                Environment::with_prefix("SU")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: StaticConfig = settings.try_deserialize()?;
        config.validate()?;

        if std::path::Path::new(path).exists() {
            eprintln!("[INFO] Configuration loaded from: {}", path);
        }

        Ok(config)
    }

    /// 校验取值范围，非法值在启动阶段直接报错
    pub fn validate(&self) -> Result<()> {
        if self.database.database_url.trim().is_empty() {
            return Err(ShortenerError::configuration(
                "database.database_url must not be empty",
            ));
        }
        if self.database.pool_size == 0 {
            return Err(ShortenerError::configuration(
                "database.pool_size must be greater than 0",
            ));
        }
        if self.cache.op_timeout_ms == 0 {
            return Err(ShortenerError::configuration(
                "cache.op_timeout_ms must be greater than 0",
            ));
        }
        if self.analytics.queue_capacity == 0 {
            return Err(ShortenerError::configuration(
                "analytics.queue_capacity must be greater than 0",
            ));
        }
        if self.analytics.batch_size == 0 {
            return Err(ShortenerError::configuration(
                "analytics.batch_size must be greater than 0",
            ));
        }
        if self.analytics.flush_interval_secs == 0 {
            return Err(ShortenerError::configuration(
                "analytics.flush_interval_secs must be greater than 0",
            ));
        }
        if self.rate_limit.enabled
            && (self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0)
        {
            return Err(ShortenerError::configuration(
                "rate_limit.max_requests and rate_limit.window_secs must be greater than 0",
            ));
        }
        if url::Url::parse(&self.api.base_url).is_err() {
            return Err(ShortenerError::configuration(format!(
                "api.base_url is not a valid URL: {}",
                self.api.base_url
            )));
        }
        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    /// 单次存储操作超时（秒）
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 缓存系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(rename = "type")]
    #[serde(default)]
    pub cache_type: CacheType,
    /// 链接缓存 TTL（秒）
    #[serde(default = "default_cache_ttl")]
    pub default_ttl: u64,
    /// 单次缓存操作超时（毫秒）
    #[serde(default = "default_cache_op_timeout_ms")]
    pub op_timeout_ms: u64,
    #[serde(default = "default_cache_key_prefix")]
    pub key_prefix: String,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

/// 内存缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_capacity")]
    pub max_capacity: u64,
}

/// 点击采集管道配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
    /// 关闭时是否先排空队列再退出
    #[serde(default = "default_drain_on_shutdown")]
    pub drain_on_shutdown: bool,
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

/// 固定窗口限流配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit_enabled")]
    pub enabled: bool,
    #[serde(default = "default_rate_limit_max_requests")]
    pub max_requests: u64,
    #[serde(default = "default_rate_limit_window_secs")]
    pub window_secs: u64,
}

/// 对外 API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 生成 shortUrl 使用的基础地址（请求未携带 X-Base-URL 时）
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "sqlite://shortener.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    5
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_cache_ttl() -> u64 {
    86400
}

fn default_cache_op_timeout_ms() -> u64 {
    500
}

fn default_cache_key_prefix() -> String {
    "shortener:".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_memory_capacity() -> u64 {
    100_000
}

fn default_queue_capacity() -> usize {
    10_000
}

fn default_batch_size() -> usize {
    100
}

fn default_flush_interval_secs() -> u64 {
    5
}

fn default_drain_on_shutdown() -> bool {
    true
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

fn default_rate_limit_enabled() -> bool {
    true
}

fn default_rate_limit_max_requests() -> u64 {
    100
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_file() -> Option<String> {
    None
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheType::default(),
            default_ttl: default_cache_ttl(),
            op_timeout_ms: default_cache_op_timeout_ms(),
            key_prefix: default_cache_key_prefix(),
            redis: RedisConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_memory_capacity(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            batch_size: default_batch_size(),
            flush_interval_secs: default_flush_interval_secs(),
            drain_on_shutdown: default_drain_on_shutdown(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_rate_limit_enabled(),
            max_requests: default_rate_limit_max_requests(),
            window_secs: default_rate_limit_window_secs(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: default_log_file(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StaticConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.cache_type, CacheType::Memory);
        assert_eq!(config.cache.default_ttl, 86400);
        assert_eq!(config.analytics.queue_capacity, 10_000);
        assert_eq!(config.analytics.batch_size, 100);
        assert_eq!(config.analytics.flush_interval_secs, 5);
        assert!(config.analytics.drain_on_shutdown);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sample_config_round_trips() {
        let sample = StaticConfig::generate_sample_config();
        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.api.base_url, "http://localhost:8080");
        assert_eq!(parsed.cache.key_prefix, "shortener:");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: StaticConfig = toml::from_str(
            r#"
            [cache]
            type = "redis"

            [rate_limit]
            max_requests = 5
            "#,
        )
        .unwrap();
        assert_eq!(parsed.cache.cache_type, CacheType::Redis);
        assert_eq!(parsed.cache.op_timeout_ms, 500);
        assert_eq!(parsed.rate_limit.max_requests, 5);
        assert_eq!(parsed.rate_limit.window_secs, 60);
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = StaticConfig::default();
        config.analytics.batch_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ShortenerError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = StaticConfig::default();
        config.api.base_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cache_type_from_str() {
        assert_eq!("REDIS".parse::<CacheType>().unwrap(), CacheType::Redis);
        assert_eq!(CacheType::Memory.as_ref(), "memory");
    }
}
