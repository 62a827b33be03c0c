//! Metrics endpoint
//!
//! Prometheus text format with the `metrics` feature, a small JSON
//! summary otherwise.

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};

use super::AppStartTime;
use crate::services::LinkService;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

pub struct MetricsService;

impl MetricsService {
    #[cfg(feature = "metrics")]
    pub async fn metrics(
        service: web::Data<Arc<LinkService>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        METRICS
            .uptime_seconds
            .set(app_start_time.uptime_seconds() as f64);
        METRICS
            .clicks_queue_size
            .set(service.pipeline().queued() as f64);

        match METRICS.export() {
            Ok(output) => HttpResponse::Ok()
                .content_type("text/plain; version=0.0.4; charset=utf-8")
                .body(output),
            Err(e) => {
                tracing::error!("Failed to encode metrics: {}", e);
                HttpResponse::InternalServerError().finish()
            }
        }
    }

    #[cfg(not(feature = "metrics"))]
    pub async fn metrics(
        service: web::Data<Arc<LinkService>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let pipeline = service.pipeline();
        HttpResponse::Ok().json(serde_json::json!({
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": app_start_time.uptime_seconds(),
            "clicks": {
                "queued": pipeline.queued(),
                "dropped": pipeline.dropped_total(),
                "flushed": pipeline.flushed_total(),
                "failed": pipeline.failed_total(),
            }
        }))
    }
}
