use actix_web::{HttpResponse, Responder, http::StatusCode, web};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, trace};

use crate::services::LinkService;

// 应用启动时间
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

impl AppStartTime {
    pub fn now() -> Self {
        Self {
            start_datetime: chrono::Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        (chrono::Utc::now() - self.start_datetime)
            .num_seconds()
            .max(0) as u64
    }
}

#[derive(Debug, Serialize)]
pub struct ComponentCheck {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsCheck {
    pub status: &'static str,
    pub queued: usize,
    pub dropped: u64,
    pub flushed: u64,
    pub failed: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub storage: ComponentCheck,
    pub cache: ComponentCheck,
    pub analytics: AnalyticsCheck,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime: u64,
    pub checks: HealthChecks,
    pub response_time_ms: u64,
}

/// Health Service
///
/// 存储不可用 → 503；缓存不可用只算 degraded，仍返回 200。
pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        service: web::Data<Arc<LinkService>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let storage = match service.store().ping().await {
            Ok(()) => ComponentCheck {
                status: "healthy",
                backend: None,
                error: None,
            },
            Err(e) => {
                error!("Storage health check failed: {}", e);
                ComponentCheck {
                    status: "unhealthy",
                    backend: None,
                    error: Some(e.to_string()),
                }
            }
        };

        let cache_backend = service.cache().backend_name();
        let cache = if service.cache().ping().await {
            ComponentCheck {
                status: "healthy",
                backend: Some(cache_backend),
                error: None,
            }
        } else {
            ComponentCheck {
                status: "unhealthy",
                backend: Some(cache_backend),
                error: Some("cache ping failed".to_string()),
            }
        };

        let pipeline = service.pipeline();
        let analytics = AnalyticsCheck {
            status: if pipeline.is_running() { "running" } else { "stopped" },
            queued: pipeline.queued(),
            dropped: pipeline.dropped_total(),
            flushed: pipeline.flushed_total(),
            failed: pipeline.failed_total(),
        };

        let storage_ok = storage.status == "healthy";
        let cache_ok = cache.status == "healthy";
        let (status, http_status) = match (storage_ok, cache_ok) {
            (false, _) => ("unhealthy", StatusCode::SERVICE_UNAVAILABLE),
            (true, false) => ("degraded", StatusCode::OK),
            (true, true) => ("healthy", StatusCode::OK),
        };

        let body = HealthResponse {
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime: app_start_time.uptime_seconds(),
            checks: HealthChecks {
                storage,
                cache,
                analytics,
            },
            response_time_ms: start_time.elapsed().as_millis() as u64,
        };

        debug!(
            "Health check completed in {:?}, status: {}",
            start_time.elapsed(),
            status
        );

        HttpResponse::build(http_status).json(body)
    }
}
