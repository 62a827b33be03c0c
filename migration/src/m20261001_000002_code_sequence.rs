//! 短码分配序列
//!
//! - PostgreSQL: 原生 SEQUENCE，`nextval` 原子递增
//! - SQLite / MySQL: 单行计数表，由存储层以原子 UPDATE 递增
//!
//! 两种实现的第一个取值都是 1。

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        match manager.get_database_backend() {
            DatabaseBackend::Postgres => {
                conn.execute_unprepared(
                    "CREATE SEQUENCE IF NOT EXISTS url_id_sequence START WITH 1 INCREMENT BY 1",
                )
                .await?;
            }
            _ => {
                manager
                    .create_table(
                        Table::create()
                            .table(CodeSequence::Table)
                            .if_not_exists()
                            .col(
                                ColumnDef::new(CodeSequence::Id)
                                    .integer()
                                    .not_null()
                                    .primary_key(),
                            )
                            .col(
                                ColumnDef::new(CodeSequence::NextValue)
                                    .big_integer()
                                    .not_null()
                                    .default(0),
                            )
                            .to_owned(),
                    )
                    .await?;

                conn.execute_unprepared("INSERT INTO code_sequence (id, next_value) VALUES (1, 0)")
                    .await?;
            }
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        match manager.get_database_backend() {
            DatabaseBackend::Postgres => {
                manager
                    .get_connection()
                    .execute_unprepared("DROP SEQUENCE IF EXISTS url_id_sequence")
                    .await?;
                Ok(())
            }
            _ => {
                manager
                    .drop_table(Table::drop().table(CodeSequence::Table).to_owned())
                    .await
            }
        }
    }
}

#[derive(DeriveIden)]
enum CodeSequence {
    #[sea_orm(iden = "code_sequence")]
    Table,
    Id,
    NextValue,
}
