//! 链接与点击表
//!
//! `short_links.short_code` 主键同时是唯一约束，别名竞争最终由它仲裁。
//! `click_logs` 每次重定向一行，时间戳为采集时刻；IP / UA 在入库前已清洗，
//! 缺失时存 "unknown"。删除链接会级联删除其点击记录。

use sea_orm_migration::prelude::*;

const LINKS_CREATED_IDX: &str = "idx_short_links_created_at";
const CLICKS_CODE_IDX: &str = "idx_click_logs_short_code";
const CLICKS_TIME_IDX: &str = "idx_click_logs_clicked_at";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(links_table()).await?;
        manager.create_table(clicks_table()).await?;

        let indexes = [
            index(LINKS_CREATED_IDX, Links::Table, &[Links::CreatedAt]),
            index(CLICKS_CODE_IDX, Clicks::Table, &[Clicks::ShortCode]),
            index(CLICKS_TIME_IDX, Clicks::Table, &[Clicks::ClickedAt]),
        ];
        for stmt in indexes {
            manager.create_index(stmt).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [CLICKS_TIME_IDX, CLICKS_CODE_IDX, LINKS_CREATED_IDX] {
            manager
                .drop_index(Index::drop().name(name).if_exists().to_owned())
                .await?;
        }
        // 先删子表
        manager
            .drop_table(Table::drop().table(Clicks::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Links::Table).if_exists().to_owned())
            .await
    }
}

fn links_table() -> TableCreateStatement {
    Table::create()
        .table(Links::Table)
        .if_not_exists()
        .col(ColumnDef::new(Links::ShortCode).string_len(32).not_null().primary_key())
        .col(ColumnDef::new(Links::TargetUrl).text().not_null())
        .col(ColumnDef::new(Links::IsCustomAlias).boolean().not_null().default(false))
        .col(ColumnDef::new(Links::CreatedAt).timestamp_with_time_zone().not_null())
        .col(ColumnDef::new(Links::ExpiresAt).timestamp_with_time_zone().null())
        .to_owned()
}

fn clicks_table() -> TableCreateStatement {
    Table::create()
        .table(Clicks::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Clicks::Id)
                .big_integer()
                .not_null()
                .auto_increment()
                .primary_key(),
        )
        .col(ColumnDef::new(Clicks::ShortCode).string_len(32).not_null())
        .col(ColumnDef::new(Clicks::ClickedAt).timestamp_with_time_zone().not_null())
        .col(ColumnDef::new(Clicks::IpAddress).string_len(45).not_null())
        .col(ColumnDef::new(Clicks::UserAgent).text().not_null())
        .foreign_key(
            ForeignKey::create()
                .name("fk_click_logs_short_code")
                .from(Clicks::Table, Clicks::ShortCode)
                .to(Links::Table, Links::ShortCode)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

fn index<T, C>(name: &str, table: T, cols: &[C]) -> IndexCreateStatement
where
    T: IntoIden,
    C: IntoIden + Copy,
{
    let mut stmt = Index::create();
    stmt.if_not_exists().name(name).table(table);
    for col in cols {
        stmt.col(*col);
    }
    stmt.to_owned()
}

#[derive(DeriveIden, Clone, Copy)]
enum Links {
    #[sea_orm(iden = "short_links")]
    Table,
    ShortCode,
    TargetUrl,
    IsCustomAlias,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum Clicks {
    #[sea_orm(iden = "click_logs")]
    Table,
    Id,
    ShortCode,
    ClickedAt,
    IpAddress,
    UserAgent,
}
