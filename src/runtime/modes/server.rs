//! Server mode
//!
//! 装配组件、启动 HTTP 服务器，收到关闭信号后先优雅停止服务器，再排空点击管道。

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::api::{
    self,
    middleware::{RateLimit, RequestIdMiddleware},
    services::{AppStartTime, PublicBaseUrl},
};
use crate::config::StaticConfig;
use crate::runtime::lifetime;

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let app_start_time = AppStartTime::now();

    let startup = lifetime::startup::prepare_server_startup(config)
        .await
        .inspect_err(|e| tracing::error!("Server startup failed: {}", e))?;

    let link_service = startup.link_service.clone();
    let rate_limit = RateLimit::new(startup.rate_limiter.clone());
    let base_url = PublicBaseUrl(config.api.base_url.clone());

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    info!("Using {} CPU cores for the server", cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(Compress::default())
            .wrap(DefaultHeaders::new().add(("Cache-Control", "no-store")))
            .app_data(web::Data::new(link_service.clone()))
            .app_data(web::Data::new(base_url.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(web::PayloadConfig::new(64 * 1024))
            .configure(|cfg| api::configure(cfg, rate_limit.clone()))
    })
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_millis(5000))
    .client_disconnect_timeout(Duration::from_millis(1000))
    .workers(cpu_count)
    .disable_signals()
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    info!("Starting server at http://{}", bind_address);

    let handle = server.handle();
    tokio::pin!(server);

    tokio::select! {
        res = &mut server => {
            res.context("HTTP server terminated")?;
        }
        _ = lifetime::shutdown::wait_for_signal() => {
            warn!("Graceful shutdown: stopping HTTP server");
            // 继续驱动服务器直到在途请求完成
            let (res, ()) = tokio::join!(&mut server, handle.stop(true));
            res.context("HTTP server terminated during shutdown")?;
        }
    }

    lifetime::shutdown::perform_shutdown_tasks(&startup.pipeline).await;
    Ok(())
}
