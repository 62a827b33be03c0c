//! 短码分配序列
//!
//! - PostgreSQL: `nextval('url_id_sequence')`
//! - SQLite: 单行计数表 `UPDATE ... RETURNING`
//! - MySQL: 事务内 `LAST_INSERT_ID(expr)`，取值绑定在同一连接上
//!
//! 每次调用消耗一个值，插入失败也不回收。

use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DbBackend, DbErr, FromQueryResult, Statement, TransactionTrait,
};
use tracing::trace;

use super::SeaOrmStorage;
use crate::errors::Result;
use crate::storage::SequenceSource;

#[derive(Debug, FromQueryResult)]
struct SignedValue {
    value: i64,
}

#[derive(Debug, FromQueryResult)]
struct UnsignedValue {
    value: u64,
}

fn to_u64(value: i64) -> std::result::Result<u64, DbErr> {
    u64::try_from(value).map_err(|_| DbErr::Custom(format!("sequence returned {}", value)))
}

fn missing_row() -> DbErr {
    DbErr::RecordNotFound("code sequence row is missing".to_string())
}

impl SeaOrmStorage {
    async fn fetch_next_value(&self) -> std::result::Result<u64, DbErr> {
        let backend = self.db.get_database_backend();

        match backend {
            DbBackend::Postgres => {
                let row = SignedValue::find_by_statement(Statement::from_string(
                    backend,
                    "SELECT nextval('url_id_sequence') AS value",
                ))
                .one(&self.db)
                .await?
                .ok_or_else(missing_row)?;
                to_u64(row.value)
            }
            DbBackend::Sqlite => {
                let row = SignedValue::find_by_statement(Statement::from_string(
                    backend,
                    "UPDATE code_sequence SET next_value = next_value + 1 WHERE id = 1 \
                     RETURNING next_value AS value",
                ))
                .one(&self.db)
                .await?
                .ok_or_else(missing_row)?;
                to_u64(row.value)
            }
            DbBackend::MySql => {
                let txn = self.db.begin().await?;
                let updated = txn
                    .execute_unprepared(
                        "UPDATE code_sequence SET next_value = LAST_INSERT_ID(next_value + 1) \
                         WHERE id = 1",
                    )
                    .await?;
                if updated.rows_affected() == 0 {
                    return Err(missing_row());
                }
                let row = UnsignedValue::find_by_statement(Statement::from_string(
                    backend,
                    "SELECT LAST_INSERT_ID() AS value",
                ))
                .one(&txn)
                .await?
                .ok_or_else(missing_row)?;
                txn.commit().await?;
                Ok(row.value)
            }
            #[allow(unreachable_patterns)]
            other => Err(DbErr::Custom(format!(
                "code sequence is not supported on {:?}",
                other
            ))),
        }
    }
}

#[async_trait]
impl SequenceSource for SeaOrmStorage {
    async fn next_value(&self) -> Result<u64> {
        let value = self.bounded("next_value", self.fetch_next_value()).await?;
        trace!("Allocated sequence value {}", value);
        Ok(value)
    }
}
