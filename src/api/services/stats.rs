use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error_response;
use crate::services::LinkService;
use crate::storage::UrlStats;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub code: String,
    pub target_url: String,
    pub click_count: u64,
    pub created_at: DateTime<Utc>,
}

impl From<UrlStats> for StatsResponse {
    fn from(stats: UrlStats) -> Self {
        Self {
            code: stats.code,
            target_url: stats.target_url,
            click_count: stats.click_count,
            created_at: stats.created_at,
        }
    }
}

pub struct StatsService;

impl StatsService {
    pub async fn get_stats(
        path: web::Path<String>,
        service: web::Data<Arc<LinkService>>,
    ) -> impl Responder {
        match service.stats(&path.into_inner()).await {
            Ok(stats) => HttpResponse::Ok().json(StatsResponse::from(stats)),
            Err(e) => error_response(&e),
        }
    }
}
