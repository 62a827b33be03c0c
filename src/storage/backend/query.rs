//! Query operations for SeaOrmStorage
//!
//! 只读操作，均为幂等，允许在瞬时错误时重试。

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::{debug, error};

use super::SeaOrmStorage;
use crate::errors::Result;
use crate::storage::models::{UrlMapping, UrlStats};

use migration::entities::{click_log, short_link};

pub(super) fn model_to_mapping(model: short_link::Model) -> UrlMapping {
    UrlMapping {
        code: model.short_code,
        target_url: model.target_url,
        is_custom_alias: model.is_custom_alias,
        created_at: model.created_at,
        expires_at: model.expires_at,
    }
}

impl SeaOrmStorage {
    pub async fn get_mapping(&self, code: &str) -> Result<Option<UrlMapping>> {
        let db = &self.db;

        let result = self
            .bounded(
                "get",
                self.retry.run("get", || async {
                    short_link::Entity::find_by_id(code).one(db).await
                }),
            )
            .await
            .inspect_err(|e| error!("查询短链接失败: {}", e))?;

        Ok(result.map(model_to_mapping))
    }

    pub async fn mapping_exists(&self, code: &str) -> Result<bool> {
        let db = &self.db;

        let count = self
            .bounded(
                "exists",
                self.retry.run("exists", || async {
                    short_link::Entity::find_by_id(code).count(db).await
                }),
            )
            .await?;

        Ok(count > 0)
    }

    /// 映射与点击数，点击数在查询时从 click_logs 聚合
    pub async fn get_stats(&self, code: &str) -> Result<Option<UrlStats>> {
        let Some(mapping) = self.get_mapping(code).await? else {
            return Ok(None);
        };

        let db = &self.db;
        let click_count = self
            .bounded(
                "stats",
                self.retry.run("stats", || async {
                    click_log::Entity::find()
                        .filter(click_log::Column::ShortCode.eq(code))
                        .count(db)
                        .await
                }),
            )
            .await?;

        debug!("Stats for {}: {} clicks", code, click_count);

        Ok(Some(UrlStats {
            code: mapping.code,
            target_url: mapping.target_url,
            created_at: mapping.created_at,
            click_count,
        }))
    }

    pub async fn ping_db(&self) -> Result<()> {
        self.bounded("ping", self.db.ping()).await
    }
}
