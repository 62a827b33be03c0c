//! ClickSink implementation for SeaOrmStorage
//!
//! 每个点击事件单独写入一行；单条失败由调用方记录，不影响同批其它事件。

use async_trait::async_trait;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::trace;

use super::SeaOrmStorage;
use crate::analytics::{ClickEvent, ClickSink};

use migration::entities::click_log;

#[async_trait]
impl ClickSink for SeaOrmStorage {
    async fn record_click(&self, event: &ClickEvent) -> anyhow::Result<()> {
        let model = click_log::ActiveModel {
            short_code: Set(event.code.clone()),
            clicked_at: Set(event.occurred_at),
            ip_address: Set(event.client_ip.clone()),
            user_agent: Set(event.user_agent.clone()),
            ..Default::default()
        };

        tokio::time::timeout(self.op_timeout, click_log::Entity::insert(model).exec(&self.db))
            .await
            .map_err(|_| {
                anyhow::anyhow!("click insert timed out after {:?}", self.op_timeout)
            })?
            .map_err(|e| anyhow::anyhow!("Failed to insert click log for {}: {}", event.code, e))?;

        trace!(
            "Click log written to {} database: {}",
            self.backend_name.to_uppercase(),
            event.code
        );
        Ok(())
    }

    async fn click_count(&self, code: &str) -> anyhow::Result<u64> {
        let count = self
            .bounded(
                "click_count",
                click_log::Entity::find()
                    .filter(click_log::Column::ShortCode.eq(code))
                    .count(&self.db),
            )
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::storage::backend::{connect_sqlite, run_migrations};
    use sea_orm::ConnectionTrait;

    #[tokio::test]
    async fn test_click_count_failure_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("clicks.db").display());
        let db = connect_sqlite(&url, 1).await.unwrap();
        run_migrations(&db).await.unwrap();
        let storage = SeaOrmStorage::from_connection(db, "sqlite", &DatabaseConfig::default());

        assert_eq!(storage.click_count("none").await.unwrap(), 0);

        storage
            .db
            .execute_unprepared("DROP TABLE click_logs")
            .await
            .unwrap();
        let err = storage.click_count("none").await.unwrap_err();
        assert!(err.to_string().contains("click_count failed"), "{}", err);
    }
}
