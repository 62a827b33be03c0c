pub mod health;
pub mod metrics;
pub mod redirect;
pub mod shorten;
pub mod stats;

use actix_web::{HttpResponse, http::StatusCode};
use serde::Serialize;

use crate::errors::ShortenerError;

pub use health::{AppStartTime, HealthService};
pub use metrics::MetricsService;
pub use redirect::RedirectService;
pub use shorten::{PublicBaseUrl, ShortenService};
pub use stats::StatsService;

/// 统一错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
    pub message: &'a str,
}

/// 把领域错误转换为 `{"error": "<ErrorType>", "message": "<detail>"}`
pub fn error_response(err: &ShortenerError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    // 5xx 不向客户端暴露内部细节
    let message = if status.is_server_error() {
        "Internal server error"
    } else {
        err.message()
    };

    HttpResponse::build(status).json(ErrorBody {
        error: err.error_type(),
        message,
    })
}
