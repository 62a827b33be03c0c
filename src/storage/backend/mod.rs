//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.

mod click_sink;
mod connection;
mod mutations;
mod query;
pub mod retry;
mod sequence;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr};
use tracing::warn;

use crate::config::DatabaseConfig;
use crate::errors::{Result, ShortenerError};
use crate::storage::{LinkStore, UrlMapping, UrlStats};

pub use connection::{connect_generic, connect_sqlite, run_migrations};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(ShortenerError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// 仅用于幂等读操作
    retry: retry::RetryPolicy,
    /// 单次操作超时
    op_timeout: Duration,
}

impl SeaOrmStorage {
    pub async fn new(config: &DatabaseConfig, backend_name: &str) -> Result<Self> {
        let database_url = config.database_url.as_str();
        if database_url.is_empty() {
            return Err(ShortenerError::database_config("DATABASE_URL 未设置"));
        }

        // 根据不同数据库类型配置连接选项
        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url, config.pool_size).await?
        } else {
            connect_generic(database_url, backend_name, config.pool_size).await?
        };

        // 运行迁移
        run_migrations(&db).await?;

        let storage = Self::from_connection(db, backend_name, config);

        warn!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    /// 基于已建立（且已迁移）的连接构造存储
    pub fn from_connection(
        db: DatabaseConnection,
        backend_name: &str,
        config: &DatabaseConfig,
    ) -> Self {
        Self {
            db,
            backend_name: backend_name.to_string(),
            retry: retry::RetryPolicy::from(config),
            op_timeout: Duration::from_secs(config.timeout.max(1)),
        }
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// 为单次存储操作加上超时，超时或数据库错误统一映射为 `StorageUnavailable`
    async fn bounded<T, Fut>(&self, operation: &str, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = std::result::Result<T, DbErr>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ShortenerError::storage_unavailable(format!(
                "{} failed: {}",
                operation, e
            ))),
            Err(_) => Err(ShortenerError::storage_unavailable(format!(
                "{} timed out after {:?}",
                operation, self.op_timeout
            ))),
        }
    }
}

#[async_trait]
impl LinkStore for SeaOrmStorage {
    async fn insert(&self, mapping: &UrlMapping) -> Result<()> {
        self.insert_mapping(mapping).await
    }

    async fn get(&self, code: &str) -> Result<Option<UrlMapping>> {
        self.get_mapping(code).await
    }

    async fn exists(&self, code: &str) -> Result<bool> {
        self.mapping_exists(code).await
    }

    async fn stats(&self, code: &str) -> Result<Option<UrlStats>> {
        self.get_stats(code).await
    }

    async fn ping(&self) -> Result<()> {
        self.ping_db().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(
            infer_backend_from_url("sqlite://shortener.db?mode=rwc").unwrap(),
            "sqlite"
        );
        assert_eq!(infer_backend_from_url("data/links.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url(":memory:").unwrap(), "sqlite");
        assert_eq!(
            infer_backend_from_url("mysql://root@localhost/short").unwrap(),
            "mysql"
        );
        assert_eq!(
            infer_backend_from_url("mariadb://root@localhost/short").unwrap(),
            "mysql"
        );
        assert_eq!(
            infer_backend_from_url("postgres://user@localhost/short").unwrap(),
            "postgres"
        );
        assert!(matches!(
            infer_backend_from_url("redis://localhost"),
            Err(ShortenerError::DatabaseConfig(_))
        ));
    }
}
