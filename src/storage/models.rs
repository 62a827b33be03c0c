use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 短码到目标 URL 的映射，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlMapping {
    pub code: String,
    pub target_url: String,
    pub is_custom_alias: bool,
    pub created_at: DateTime<Utc>,
    /// 持久化但不参与业务逻辑
    pub expires_at: Option<DateTime<Utc>>,
}

/// 查询时聚合得到的链接统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlStats {
    pub code: String,
    pub target_url: String,
    pub created_at: DateTime<Utc>,
    pub click_count: u64,
}
