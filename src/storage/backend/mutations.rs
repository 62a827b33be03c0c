//! Mutation operations for SeaOrmStorage
//!
//! 写操作不重试：短码唯一约束是别名竞争的最终仲裁，
//! 冲突以 `AliasConflict` 返回。

use sea_orm::{ActiveValue::Set, DbErr, EntityTrait, SqlErr};
use tracing::{debug, error};

use super::SeaOrmStorage;
use crate::errors::{Result, ShortenerError};
use crate::storage::models::UrlMapping;

use migration::entities::short_link;

/// 唯一约束冲突；驱动错误码无法识别时退回到消息匹配
fn is_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    let msg = err.to_string();
    msg.contains("UNIQUE constraint failed")
        || msg.contains("Duplicate entry")
        || msg.contains("duplicate key value")
}

impl SeaOrmStorage {
    pub async fn insert_mapping(&self, mapping: &UrlMapping) -> Result<()> {
        let model = short_link::ActiveModel {
            short_code: Set(mapping.code.clone()),
            target_url: Set(mapping.target_url.clone()),
            is_custom_alias: Set(mapping.is_custom_alias),
            created_at: Set(mapping.created_at),
            expires_at: Set(mapping.expires_at),
        };

        let result =
            tokio::time::timeout(self.op_timeout, short_link::Entity::insert(model).exec(&self.db))
                .await;

        match result {
            Ok(Ok(_)) => {
                debug!(
                    "Short link inserted into {}: {}",
                    self.backend_name.to_uppercase(),
                    mapping.code
                );
                Ok(())
            }
            Ok(Err(e)) if is_unique_violation(&e) => {
                Err(ShortenerError::alias_conflict(format!(
                    "Short code '{}' is already taken",
                    mapping.code
                )))
            }
            Ok(Err(e)) => {
                error!("写入短链接失败: {}", e);
                Err(ShortenerError::storage_unavailable(format!(
                    "insert failed: {}",
                    e
                )))
            }
            Err(_) => Err(ShortenerError::storage_unavailable(format!(
                "insert timed out after {:?}",
                self.op_timeout
            ))),
        }
    }
}
