//! Global metrics registry
//!
//! Defines all Prometheus metrics used in the application.

use once_cell::sync::Lazy;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

/// Global metrics instance
pub static METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

/// Application metrics container
pub struct Metrics {
    /// Internal Prometheus registry
    registry: Registry,

    // ===== Redirect metrics =====
    /// Total number of redirects by status code
    pub redirects_total: CounterVec,

    // ===== Link metrics =====
    /// Links created, by kind (generated, custom)
    pub links_created_total: CounterVec,

    // ===== Cache metrics =====
    pub cache_hits_total: Counter,
    pub cache_misses_total: Counter,
    /// Cache backend failures by operation (get, set, delete)
    pub cache_errors_total: CounterVec,

    // ===== Click pipeline metrics =====
    pub clicks_dropped_total: Counter,
    pub clicks_flushed_total: Counter,
    pub clicks_failed_total: Counter,
    /// Events currently waiting in the pipeline queue
    pub clicks_queue_size: Gauge,

    // ===== Rate limiter =====
    pub rate_limited_total: Counter,

    // ===== System metrics =====
    /// Server uptime in seconds
    pub uptime_seconds: Gauge,
}

fn counter(name: &str, help: &str) -> Counter {
    Counter::new(name, help).expect("Failed to create counter metric")
}

fn counter_vec(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    CounterVec::new(Opts::new(name, help), labels).expect("Failed to create counter vec metric")
}

fn gauge(name: &str, help: &str) -> Gauge {
    Gauge::new(name, help).expect("Failed to create gauge metric")
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();

        let redirects_total = counter_vec(
            "shortener_redirects_total",
            "Total number of redirects by status",
            &["status"],
        );
        let links_created_total = counter_vec(
            "shortener_links_created_total",
            "Total number of short links created by kind",
            &["kind"],
        );
        let cache_hits_total = counter("shortener_cache_hits_total", "Total link cache hits");
        let cache_misses_total =
            counter("shortener_cache_misses_total", "Total link cache misses");
        let cache_errors_total = counter_vec(
            "shortener_cache_errors_total",
            "Total cache backend errors by operation",
            &["op"],
        );
        let clicks_dropped_total = counter(
            "shortener_clicks_dropped_total",
            "Click events dropped because the queue was full or closed",
        );
        let clicks_flushed_total = counter(
            "shortener_clicks_flushed_total",
            "Click events persisted to storage",
        );
        let clicks_failed_total = counter(
            "shortener_clicks_failed_total",
            "Click events that failed to persist",
        );
        let clicks_queue_size = gauge(
            "shortener_clicks_queue_size",
            "Click events waiting in the pipeline queue",
        );
        let rate_limited_total = counter(
            "shortener_rate_limited_total",
            "Requests rejected by the rate limiter",
        );
        let uptime_seconds = gauge("shortener_uptime_seconds", "Server uptime in seconds");

        // Register all metrics
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(redirects_total.clone()),
            Box::new(links_created_total.clone()),
            Box::new(cache_hits_total.clone()),
            Box::new(cache_misses_total.clone()),
            Box::new(cache_errors_total.clone()),
            Box::new(clicks_dropped_total.clone()),
            Box::new(clicks_flushed_total.clone()),
            Box::new(clicks_failed_total.clone()),
            Box::new(clicks_queue_size.clone()),
            Box::new(rate_limited_total.clone()),
            Box::new(uptime_seconds.clone()),
        ];
        for collector in collectors {
            registry
                .register(collector)
                .expect("Failed to register metric");
        }

        Self {
            registry,
            redirects_total,
            links_created_total,
            cache_hits_total,
            cache_misses_total,
            cache_errors_total,
            clicks_dropped_total,
            clicks_flushed_total,
            clicks_failed_total,
            clicks_queue_size,
            rate_limited_total,
            uptime_seconds,
        }
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_contains_registered_metrics() {
        METRICS.redirects_total.with_label_values(&["301"]).inc();
        METRICS.clicks_dropped_total.inc();

        let output = METRICS.export().unwrap();
        assert!(output.contains("shortener_redirects_total"));
        assert!(output.contains("shortener_clicks_dropped_total"));
    }
}
