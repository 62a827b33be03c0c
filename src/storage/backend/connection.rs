use std::str::FromStr;
use std::time::Duration;

use sea_orm::sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, SqlxSqliteConnector};
use tracing::info;

use crate::errors::{Result, ShortenerError};
use migration::{Migrator, MigratorTrait};

/// SQLite 写锁等待上限，超过即报 BUSY（由读重试兜底）
const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// 裸路径补全为 `sqlite://` URL
fn sqlite_url(database_url: &str) -> String {
    if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite://{}", database_url)
    }
}

/// WAL + 外键约束；click_logs 依赖外键拒绝未知短码
fn sqlite_options(database_url: &str) -> Result<SqliteConnectOptions> {
    let options = SqliteConnectOptions::from_str(&sqlite_url(database_url))
        .map_err(|e| ShortenerError::database_config(format!("Invalid SQLite URL: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(SQLITE_BUSY_TIMEOUT)
        .pragma("temp_store", "memory");
    Ok(options)
}

/// 连接 SQLite，文件不存在时自动创建
pub async fn connect_sqlite(database_url: &str, pool_size: u32) -> Result<DatabaseConnection> {
    let pool = SqlitePoolOptions::new()
        .max_connections(pool_size.max(1))
        .connect_with(sqlite_options(database_url)?)
        .await
        .map_err(|e| ShortenerError::storage_unavailable(format!("SQLite connect failed: {}", e)))?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// 连接 MySQL / PostgreSQL
pub async fn connect_generic(
    database_url: &str,
    backend_name: &str,
    pool_size: u32,
) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url);
    options
        .max_connections(pool_size)
        .min_connections(pool_size.min(2))
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    Database::connect(options).await.map_err(|e| {
        ShortenerError::storage_unavailable(format!("{} connect failed: {}", backend_name, e))
    })
}

/// 应用所有未执行的迁移
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .map_err(|e| ShortenerError::storage_unavailable(format!("Migration failed: {}", e)))?;

    info!("Database schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_url_normalization() {
        assert_eq!(sqlite_url("data/links.db"), "sqlite://data/links.db");
        assert_eq!(sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(sqlite_url("sqlite://x.db?mode=rwc"), "sqlite://x.db?mode=rwc");
    }

    #[test]
    fn test_invalid_sqlite_url_is_config_error() {
        let err = sqlite_options("sqlite://x.db?mode=bogus").unwrap_err();
        assert!(matches!(err, ShortenerError::DatabaseConfig(_)));
    }
}
