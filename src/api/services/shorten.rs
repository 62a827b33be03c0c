use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::error_response;
use crate::errors::ShortenerError;
use crate::services::LinkService;

/// 构造 shortUrl 时的默认前缀（`api.base_url`）
#[derive(Clone, Debug)]
pub struct PublicBaseUrl(pub String);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    pub url: String,
    #[serde(default, alias = "custom_alias")]
    pub custom_alias: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub code: String,
    pub short_url: String,
    pub target_url: String,
}

pub struct ShortenService;

impl ShortenService {
    pub async fn shorten(
        req: HttpRequest,
        body: web::Bytes,
        service: web::Data<Arc<LinkService>>,
        base_url: web::Data<PublicBaseUrl>,
    ) -> impl Responder {
        let payload: ShortenRequest = match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(e) => {
                trace!("Rejected malformed shorten payload: {}", e);
                return error_response(&ShortenerError::from(e));
            }
        };

        let alias = Self::requested_alias(&payload);

        match service.shorten(&payload.url, alias).await {
            Ok(mapping) => {
                let base = Self::resolve_base_url(&req, &base_url.0);
                HttpResponse::Created().json(ShortenResponse {
                    short_url: format!("{}/{}", base, mapping.code),
                    code: mapping.code,
                    target_url: mapping.target_url,
                })
            }
            Err(e) => error_response(&e),
        }
    }

    /// 空字符串视为未提供；其余原样交给校验，不做 trim
    fn requested_alias(payload: &ShortenRequest) -> Option<&str> {
        payload.custom_alias.as_deref().filter(|a| !a.is_empty())
    }

    /// `X-Base-URL` 优先，否则使用配置；去掉末尾斜杠
    fn resolve_base_url(req: &HttpRequest, fallback: &str) -> String {
        let base = req
            .headers()
            .get("X-Base-URL")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(fallback);
        base.trim_end_matches('/').to_string()
    }
}
