//! 点击采集
//!
//! - `ClickEvent`: 采集时刻生成的不可变事件
//! - `ClickSink`: 事件的持久化目标
//! - `ClickPipeline`: 有界队列 + 单个后台 worker，按批量或定时刷盘

pub mod pipeline;
pub mod sanitize;
pub mod sink;

pub use pipeline::{ClickPipeline, PipelineSettings};
pub use sink::ClickSink;

use chrono::{DateTime, Utc};

/// 单次重定向产生的点击事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    /// 短链接代码（入队时不校验是否存在）
    pub code: String,
    /// 已清洗的客户端 IP，或 "unknown"
    pub client_ip: String,
    /// 已清洗、截断的用户代理，或 "unknown"
    pub user_agent: String,
    /// 采集时间（而非刷盘时间）
    pub occurred_at: DateTime<Utc>,
}

impl ClickEvent {
    /// 从原始请求信息构造事件，负责清洗
    pub fn capture(code: &str, client_ip: Option<&str>, user_agent: Option<&str>) -> Self {
        Self {
            code: code.to_string(),
            client_ip: sanitize::sanitize_ip(client_ip),
            user_agent: sanitize::sanitize_user_agent(user_agent),
            occurred_at: Utc::now(),
        }
    }
}
