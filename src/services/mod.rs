//! Service layer for business logic
//!
//! HTTP handlers only translate between the wire format and these services.

mod allocator;
mod link_service;
mod rate_limiter;

pub use allocator::{AllocatedCode, Allocator};
pub use link_service::LinkService;
pub use rate_limiter::{RateDecision, RateLimiter};
