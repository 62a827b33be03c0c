//! 幂等读操作的重试策略
//!
//! 写操作与序列取值不经过这里，失败直接上抛：重放写入可能产生重复行，
//! 重放 nextval 会白白消耗序列值。

use sea_orm::DbErr;
use sea_orm::error::RuntimeErr;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

/// 驱动层错误码：MySQL 死锁 / 锁超时，PostgreSQL 序列化失败 / 死锁，SQLite BUSY / LOCKED
const TRANSIENT_CODES: &[&str] = &["1213", "1205", "40001", "40P01", "5", "6"];

/// 没有错误码时按消息匹配（全部小写）
const TRANSIENT_MESSAGES: &[&str] = &[
    "deadlock",
    "lock wait timeout",
    "database is locked",
    "serialization failure",
];

/// 错误是否值得重放
pub fn is_transient(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(inner) | DbErr::Query(inner) => runtime_is_transient(inner),
        _ => false,
    }
}

fn runtime_is_transient(err: &RuntimeErr) -> bool {
    let message = match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            let code = sqlx_err.as_database_error().and_then(|db| db.code());
            if let Some(code) = code {
                return TRANSIENT_CODES.contains(&code.as_ref());
            }
            sqlx_err.to_string()
        }
        RuntimeErr::Internal(msg) => msg.clone(),
        #[allow(unreachable_patterns)]
        _ => return false,
    };

    let message = message.to_lowercase();
    TRANSIENT_MESSAGES.iter().any(|m| message.contains(m))
}

/// 指数退避，附 0-25% 抖动
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&DatabaseConfig::default())
    }
}

impl From<&DatabaseConfig> for RetryPolicy {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// 第 `attempt` 次重试前的等待（attempt 从 1 开始）
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        let capped = self.base_delay.saturating_mul(factor).min(self.max_delay);
        let jitter_ms = rand::random_range(0..=capped.as_millis() as u64 / 4);
        capped + Duration::from_millis(jitter_ms)
    }

    /// 执行 `op`，遇到瞬时错误按策略重放
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, DbErr>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DbErr>>,
    {
        let mut retries = 0;
        loop {
            let err = match op().await {
                Ok(value) => {
                    if retries > 0 {
                        debug!("{} recovered after {} retries", label, retries);
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            if retries >= self.max_retries || !is_transient(&err) {
                return Err(err);
            }

            retries += 1;
            let wait = self.backoff(retries);
            warn!(
                "{} failed ({}/{}), retrying in {:?}: {}",
                label, retries, self.max_retries, wait, err
            );
            tokio::time::sleep(wait).await;
        }
    }
}
