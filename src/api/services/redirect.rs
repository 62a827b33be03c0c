use std::sync::Arc;

use actix_web::http::Method;
use actix_web::http::header::{CACHE_CONTROL, LOCATION, USER_AGENT};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::trace;

use super::error_response;
use crate::errors::ShortenerError;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
use crate::services::LinkService;
use crate::utils::ip::extract_client_ip;
use crate::utils::url_validator::is_valid_short_code;

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        service: web::Data<Arc<LinkService>>,
    ) -> impl Responder {
        let code = path.into_inner();

        if !is_valid_short_code(&code) {
            // 非法短码直接 404，不进缓存也不查库
            trace!("Invalid short code rejected: {}", code);
            return Self::failure(ShortenerError::not_found("Short URL not found"));
        }

        // HEAD 多为链接检查器，不计点击
        let resolved = if req.method() == Method::HEAD {
            service.lookup(&code).await
        } else {
            let client_ip = extract_client_ip(&req);
            let user_agent = req.headers().get(USER_AGENT).and_then(|v| v.to_str().ok());
            service
                .resolve(&code, client_ip.as_deref(), user_agent)
                .await
        };

        match resolved {
            Ok(target) => {
                inc_counter!(METRICS.redirects_total, &["301"]);
                HttpResponse::MovedPermanently()
                    .insert_header((LOCATION, target))
                    .finish()
            }
            Err(ShortenerError::NotFound(_)) => {
                Self::failure(ShortenerError::not_found("Short URL not found"))
            }
            Err(e) => Self::failure(e),
        }
    }

    fn failure(err: ShortenerError) -> HttpResponse {
        let mut response = error_response(&err);
        if matches!(err, ShortenerError::NotFound(_)) {
            inc_counter!(METRICS.redirects_total, &["404"]);
            response.headers_mut().insert(
                CACHE_CONTROL,
                actix_web::http::header::HeaderValue::from_static("public, max-age=60"),
            );
        } else {
            inc_counter!(METRICS.redirects_total, &["500"]);
        }
        response
    }
}
