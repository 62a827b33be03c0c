//! Shortener - counter-based URL shortener service
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **metrics**: Prometheus metrics export (default)
//!
//! # Architecture
//! - `storage`: durable mappings, click log and the allocation sequence (SeaORM)
//! - `cache`: shared key/value cache (moka or Redis) and the cache-aside `LinkCache`
//! - `analytics`: bounded click queue with a batching background worker
//! - `services`: code allocation, the shortening engine and rate limiting
//! - `api`: HTTP handlers and middleware
//! - `config`: configuration management
//! - `runtime`: application lifecycle
//! - `system`: logging setup

#[macro_use]
mod metrics_macros;

pub mod analytics;
pub mod api;
pub mod cache;
pub mod config;
pub mod errors;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
