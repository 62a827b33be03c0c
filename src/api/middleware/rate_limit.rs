//! 固定窗口限流中间件
//!
//! 只挂在 API 路由上（`POST /shorten`、`GET /urls/{code}/stats`），
//! 重定向、健康检查与指标不受限。

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::RETRY_AFTER,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

use crate::api::services::error_response;
use crate::errors::ShortenerError;
use crate::services::{RateDecision, RateLimiter};
use crate::utils::ip::extract_client_ip;

/// 限流中间件工厂；`limiter` 为 None 时直接放行
#[derive(Clone)]
pub struct RateLimit {
    limiter: Option<Arc<RateLimiter>>,
}

impl RateLimit {
    pub fn new(limiter: Option<Arc<RateLimiter>>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limiter: Option<Arc<RateLimiter>>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let limiter = self.limiter.clone();

        Box::pin(async move {
            let Some(limiter) = limiter else {
                return Ok(srv.call(req).await?.map_into_left_body());
            };

            let identity =
                extract_client_ip(req.request()).unwrap_or_else(|| "unknown".to_string());

            if limiter.allow(&identity).await == RateDecision::Denied {
                debug!("Rate limited request from {} to {}", identity, req.path());
                let window_secs = limiter.window().as_secs();
                let err = ShortenerError::rate_limited(format!(
                    "Maximum {} requests per {} seconds allowed",
                    limiter.max_requests(),
                    window_secs
                ));
                let mut response = error_response(&err);
                response.headers_mut().insert(
                    RETRY_AFTER,
                    actix_web::http::header::HeaderValue::from(window_secs),
                );
                return Ok(req.into_response(response.map_into_right_body()));
            }

            Ok(srv.call(req).await?.map_into_left_body())
        })
    }
}
