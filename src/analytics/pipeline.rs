//! 点击采集管道
//!
//! 重定向路径调用 `capture`，只做一次非阻塞 `try_send`：
//! - 队列满或已关闭时丢弃事件并计数，调用方永远看不到错误
//! - 单个后台 worker 攒批，达到 batch_size 或定时器到期时刷盘
//! - 每个事件单独持久化，单条失败不影响同批其它事件
//! - `shutdown` 可选择先排空队列再退出（受超时约束）

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, trace, warn};

use super::{ClickEvent, ClickSink};
use crate::config::AnalyticsConfig;
use crate::errors::ShortenerError;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// 管道参数
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub drain_on_shutdown: bool,
    pub shutdown_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&AnalyticsConfig::default())
    }
}

impl From<&AnalyticsConfig> for PipelineSettings {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            queue_capacity: config.queue_capacity.max(1),
            batch_size: config.batch_size.max(1),
            flush_interval: Duration::from_secs(config.flush_interval_secs.max(1)),
            drain_on_shutdown: config.drain_on_shutdown,
            shutdown_timeout: Duration::from_secs(config.shutdown_timeout_secs),
        }
    }
}

#[derive(Default)]
struct PipelineStats {
    dropped: AtomicU64,
    flushed: AtomicU64,
    failed: AtomicU64,
}

pub struct ClickPipeline {
    sender: mpsc::Sender<ClickEvent>,
    sink: Arc<dyn ClickSink>,
    stats: Arc<PipelineStats>,
    accepting: AtomicBool,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    shutdown_timeout: Duration,
}

impl ClickPipeline {
    /// 创建管道并启动后台 worker（需要在 tokio 运行时内调用）
    pub fn new(sink: Arc<dyn ClickSink>, settings: PipelineSettings) -> Self {
        let (sender, receiver) = mpsc::channel(settings.queue_capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let stats = Arc::new(PipelineStats::default());

        let worker = Worker {
            receiver,
            sink: Arc::clone(&sink),
            stats: Arc::clone(&stats),
            batch: Vec::with_capacity(settings.batch_size),
            batch_size: settings.batch_size,
            flush_interval: settings.flush_interval,
            drain_on_shutdown: settings.drain_on_shutdown,
        };
        let handle = tokio::spawn(worker.run(shutdown_rx));

        info!(
            "Click pipeline started (queue: {}, batch: {}, interval: {:?})",
            settings.queue_capacity, settings.batch_size, settings.flush_interval
        );

        Self {
            sender,
            sink,
            stats,
            accepting: AtomicBool::new(true),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            worker: Mutex::new(Some(handle)),
            shutdown_timeout: settings.shutdown_timeout,
        }
    }

    /// 采集一次点击，立即返回
    pub fn capture(&self, code: &str, client_ip: Option<&str>, user_agent: Option<&str>) {
        if !self.accepting.load(Ordering::Acquire) {
            self.record_drop();
            trace!("Click pipeline is shut down, dropping click for {}", code);
            return;
        }

        let event = ClickEvent::capture(code, client_ip, user_agent);
        match self.sender.try_send(event) {
            Ok(()) => {
                set_plain_gauge!(METRICS.clicks_queue_size, self.queued() as f64);
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.record_drop();
                let err = ShortenerError::queue_full(format!(
                    "capacity {} reached, dropping click for {}",
                    self.sender.max_capacity(),
                    event.code
                ));
                warn!("{}", err);
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                self.record_drop();
                debug!("Click queue closed, dropping click for {}", event.code);
            }
        }
    }

    fn record_drop(&self) {
        self.stats.dropped.fetch_add(1, Ordering::Relaxed);
        inc_plain_counter!(METRICS.clicks_dropped_total);
    }

    /// 从存储读取累计点击数
    pub async fn click_count(&self, code: &str) -> anyhow::Result<u64> {
        self.sink.click_count(code).await
    }

    /// 当前排队中的事件数
    pub fn queued(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn dropped_total(&self) -> u64 {
        self.stats.dropped.load(Ordering::Relaxed)
    }

    pub fn flushed_total(&self) -> u64 {
        self.stats.flushed.load(Ordering::Relaxed)
    }

    pub fn failed_total(&self) -> u64 {
        self.stats.failed.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// 停止接收新事件并等待 worker 退出
    ///
    /// 是否排空队列由 `drain_on_shutdown` 决定；超时后放弃等待，剩余事件丢失。
    pub async fn shutdown(&self) {
        self.accepting.store(false, Ordering::Release);

        let shutdown_tx = self
            .shutdown_tx
            .lock()
            .ok()
            .and_then(|mut guard| guard.take());
        let Some(shutdown_tx) = shutdown_tx else {
            debug!("Click pipeline already shut down");
            return;
        };
        let _ = shutdown_tx.send(());

        let handle = self.worker.lock().ok().and_then(|mut guard| guard.take());
        let Some(mut handle) = handle else {
            return;
        };

        match tokio::time::timeout(self.shutdown_timeout, &mut handle).await {
            Ok(Ok(())) => info!(
                "Click pipeline stopped (flushed: {}, failed: {}, dropped: {})",
                self.flushed_total(),
                self.failed_total(),
                self.dropped_total()
            ),
            Ok(Err(e)) => warn!("Click pipeline worker terminated abnormally: {}", e),
            Err(_) => {
                handle.abort();
                warn!(
                    "Click pipeline did not finish within {:?}, {} queued clicks lost",
                    self.shutdown_timeout,
                    self.queued()
                );
            }
        }
    }
}

struct Worker {
    receiver: mpsc::Receiver<ClickEvent>,
    sink: Arc<dyn ClickSink>,
    stats: Arc<PipelineStats>,
    batch: Vec<ClickEvent>,
    batch_size: usize,
    flush_interval: Duration,
    drain_on_shutdown: bool,
}

impl Worker {
    async fn run(mut self, mut shutdown_rx: oneshot::Receiver<()>) {
        let mut ticker = interval_at(Instant::now() + self.flush_interval, self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown_rx => break,
                received = self.receiver.recv() => match received {
                    Some(event) => {
                        self.batch.push(event);
                        if self.batch.len() >= self.batch_size {
                            self.flush("size").await;
                        }
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    if !self.batch.is_empty() {
                        self.flush("timer").await;
                    }
                }
            }
        }

        self.receiver.close();

        if self.drain_on_shutdown {
            while let Some(event) = self.receiver.recv().await {
                self.batch.push(event);
                if self.batch.len() >= self.batch_size {
                    self.flush("shutdown").await;
                }
            }
            self.flush("shutdown").await;
            debug!("Click pipeline drained");
        } else {
            let lost = self.batch.len() + self.receiver.len();
            if lost > 0 {
                warn!("Click pipeline exiting without drain, {} clicks lost", lost);
            }
        }
    }

    async fn flush(&mut self, trigger: &str) {
        if self.batch.is_empty() {
            return;
        }

        let mut flushed = 0u64;
        let mut failed = 0u64;
        for event in self.batch.drain(..) {
            match self.sink.record_click(&event).await {
                Ok(()) => flushed += 1,
                Err(e) => {
                    failed += 1;
                    warn!("Failed to persist click for {}: {}", event.code, e);
                }
            }
        }

        self.stats.flushed.fetch_add(flushed, Ordering::Relaxed);
        self.stats.failed.fetch_add(failed, Ordering::Relaxed);
        inc_plain_counter_by!(METRICS.clicks_flushed_total, flushed as f64);
        inc_plain_counter_by!(METRICS.clicks_failed_total, failed as f64);
        set_plain_gauge!(METRICS.clicks_queue_size, self.receiver.len() as f64);

        debug!(
            "Click batch flushed (trigger: {}, ok: {}, failed: {})",
            trigger, flushed, failed
        );
    }
}
