//! HTTP surface
//!
//! - `POST /shorten`、`GET /urls/{code}/stats`：限流
//! - `GET /health`、`GET /metrics`
//! - `GET /{code}`：重定向，必须最后注册

pub mod middleware;
pub mod services;

use actix_web::web;

use middleware::RateLimit;
use services::{HealthService, MetricsService, RedirectService, ShortenService, StatsService};

/// 注册全部路由；应用数据（`LinkService`、`PublicBaseUrl`、`AppStartTime`）由调用方注入
pub fn configure(cfg: &mut web::ServiceConfig, rate_limit: RateLimit) {
    cfg.service(
        web::resource("/shorten")
            .wrap(rate_limit.clone())
            .route(web::post().to(ShortenService::shorten)),
    )
    .service(
        web::resource("/urls/{code}/stats")
            .wrap(rate_limit)
            .route(web::get().to(StatsService::get_stats)),
    )
    .service(
        web::resource("/health")
            .route(web::get().to(HealthService::health_check))
            .route(web::head().to(HealthService::health_check)),
    )
    .service(web::resource("/metrics").route(web::get().to(MetricsService::metrics)))
    .service(
        web::resource("/{code}")
            .route(web::get().to(RedirectService::handle_redirect))
            .route(web::head().to(RedirectService::handle_redirect)),
    );
}
