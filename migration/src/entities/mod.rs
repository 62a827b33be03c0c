//! SeaORM models mirroring the migrated schema

pub mod click_log;
pub mod short_link;
