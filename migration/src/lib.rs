//! Schema migrations for the link store
//!
//! 运行顺序即下方列表顺序；已应用的迁移由 `seaql_migrations` 表记录。

pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20261001_000001_link_schema;
mod m20261001_000002_code_sequence;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_link_schema::Migration),
            Box::new(m20261001_000002_code_sequence::Migration),
        ]
    }
}
