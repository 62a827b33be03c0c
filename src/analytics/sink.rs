use super::ClickEvent;

/// 点击事件的持久化目标
#[async_trait::async_trait]
pub trait ClickSink: Send + Sync {
    /// 持久化单个事件
    async fn record_click(&self, event: &ClickEvent) -> anyhow::Result<()>;

    /// 某短码累计的点击数
    async fn click_count(&self, code: &str) -> anyhow::Result<u64>;
}

/// 只打日志的 Sink，用于压测与调试
pub struct LogSink;

#[async_trait::async_trait]
impl ClickSink for LogSink {
    async fn record_click(&self, event: &ClickEvent) -> anyhow::Result<()> {
        tracing::debug!(
            "Click: code={} ip={} ua={} at={}",
            event.code,
            event.client_ip,
            event.user_agent,
            event.occurred_at
        );
        Ok(())
    }

    async fn click_count(&self, _code: &str) -> anyhow::Result<u64> {
        Ok(0)
    }
}
