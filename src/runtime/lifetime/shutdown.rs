use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};

use crate::analytics::ClickPipeline;

/// 等待 Ctrl+C（Unix 下同时等待 SIGTERM）
pub async fn wait_for_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}. Falling back to Ctrl+C.", e);
                wait_for_ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = wait_for_ctrl_c() => {}
            _ = sigterm.recv() => info!("SIGTERM received"),
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(
            "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
            e
        ),
    }
}

/// HTTP 服务器停止后执行：排空点击管道（超时由管道自身约束）
pub async fn perform_shutdown_tasks(pipeline: &Arc<ClickPipeline>) {
    info!("Flushing queued clicks ({} pending)...", pipeline.queued());
    pipeline.shutdown().await;
    info!("All shutdown tasks completed");
}
