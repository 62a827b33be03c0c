use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortenerError {
    InvalidUrl(String),
    InvalidAlias(String),
    AliasConflict(String),
    NotFound(String),
    StorageUnavailable(String),
    CacheUnavailable(String),
    QueueFull(String),
    RateLimited(String),
    DatabaseConfig(String),
    Configuration(String),
}

impl ShortenerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShortenerError::InvalidUrl(_) => "E001",
            ShortenerError::InvalidAlias(_) => "E002",
            ShortenerError::AliasConflict(_) => "E003",
            ShortenerError::NotFound(_) => "E004",
            ShortenerError::StorageUnavailable(_) => "E005",
            ShortenerError::CacheUnavailable(_) => "E006",
            ShortenerError::QueueFull(_) => "E007",
            ShortenerError::RateLimited(_) => "E008",
            ShortenerError::DatabaseConfig(_) => "E009",
            ShortenerError::Configuration(_) => "E010",
        }
    }

    /// 获取错误类型名称（同时作为 HTTP 错误体中的 `error` 字段）
    pub fn error_type(&self) -> &'static str {
        match self {
            ShortenerError::InvalidUrl(_) => "InvalidUrl",
            ShortenerError::InvalidAlias(_) => "InvalidAlias",
            ShortenerError::AliasConflict(_) => "AliasConflict",
            ShortenerError::NotFound(_) => "NotFound",
            ShortenerError::StorageUnavailable(_) => "StorageUnavailable",
            ShortenerError::CacheUnavailable(_) => "CacheUnavailable",
            ShortenerError::QueueFull(_) => "QueueFull",
            ShortenerError::RateLimited(_) => "RateLimited",
            ShortenerError::DatabaseConfig(_) => "DatabaseConfig",
            ShortenerError::Configuration(_) => "Configuration",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShortenerError::InvalidUrl(msg)
            | ShortenerError::InvalidAlias(msg)
            | ShortenerError::AliasConflict(msg)
            | ShortenerError::NotFound(msg)
            | ShortenerError::StorageUnavailable(msg)
            | ShortenerError::CacheUnavailable(msg)
            | ShortenerError::QueueFull(msg)
            | ShortenerError::RateLimited(msg)
            | ShortenerError::DatabaseConfig(msg)
            | ShortenerError::Configuration(msg) => msg,
        }
    }

    /// 对应的 HTTP 状态码
    ///
    /// 校验与冲突类错误映射为 4xx，存储类错误映射为 5xx。
    pub fn status_code(&self) -> u16 {
        match self {
            ShortenerError::InvalidUrl(_)
            | ShortenerError::InvalidAlias(_)
            | ShortenerError::AliasConflict(_) => 400,
            ShortenerError::NotFound(_) => 404,
            ShortenerError::RateLimited(_) => 429,
            ShortenerError::StorageUnavailable(_)
            | ShortenerError::CacheUnavailable(_)
            | ShortenerError::QueueFull(_)
            | ShortenerError::DatabaseConfig(_)
            | ShortenerError::Configuration(_) => 500,
        }
    }

    /// 格式化为彩色输出（用于启动失败时的终端提示）
    #[cfg(feature = "server")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ShortenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortenerError {}

// 便捷的构造函数
impl ShortenerError {
    pub fn invalid_url<T: Into<String>>(msg: T) -> Self {
        ShortenerError::InvalidUrl(msg.into())
    }

    pub fn invalid_alias<T: Into<String>>(msg: T) -> Self {
        ShortenerError::InvalidAlias(msg.into())
    }

    pub fn alias_conflict<T: Into<String>>(msg: T) -> Self {
        ShortenerError::AliasConflict(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShortenerError::NotFound(msg.into())
    }

    pub fn storage_unavailable<T: Into<String>>(msg: T) -> Self {
        ShortenerError::StorageUnavailable(msg.into())
    }

    pub fn cache_unavailable<T: Into<String>>(msg: T) -> Self {
        ShortenerError::CacheUnavailable(msg.into())
    }

    pub fn queue_full<T: Into<String>>(msg: T) -> Self {
        ShortenerError::QueueFull(msg.into())
    }

    pub fn rate_limited<T: Into<String>>(msg: T) -> Self {
        ShortenerError::RateLimited(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ShortenerError::DatabaseConfig(msg.into())
    }

    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Configuration(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for ShortenerError {
    fn from(err: sea_orm::DbErr) -> Self {
        ShortenerError::StorageUnavailable(err.to_string())
    }
}

impl From<redis::RedisError> for ShortenerError {
    fn from(err: redis::RedisError) -> Self {
        ShortenerError::CacheUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for ShortenerError {
    fn from(err: serde_json::Error) -> Self {
        ShortenerError::InvalidUrl(format!("Malformed request body: {}", err))
    }
}

impl From<config::ConfigError> for ShortenerError {
    fn from(err: config::ConfigError) -> Self {
        ShortenerError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ShortenerError::invalid_url("x").status_code(), 400);
        assert_eq!(ShortenerError::invalid_alias("x").status_code(), 400);
        assert_eq!(ShortenerError::alias_conflict("x").status_code(), 400);
        assert_eq!(ShortenerError::not_found("x").status_code(), 404);
        assert_eq!(ShortenerError::rate_limited("x").status_code(), 429);
        assert_eq!(ShortenerError::storage_unavailable("x").status_code(), 500);
    }

    #[test]
    fn test_display_uses_type_and_message() {
        let err = ShortenerError::alias_conflict("Alias 'promo' is already taken");
        assert_eq!(
            err.to_string(),
            "AliasConflict: Alias 'promo' is already taken"
        );
        assert_eq!(err.code(), "E003");
    }

    #[test]
    fn test_db_err_maps_to_storage_unavailable() {
        let err: ShortenerError = sea_orm::DbErr::Custom("boom".into()).into();
        assert!(matches!(err, ShortenerError::StorageUnavailable(_)));
    }
}
