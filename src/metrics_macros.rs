//! Metrics helper macros
//!
//! Every macro expands to nothing when the `metrics` feature is off, so
//! call sites stay free of `#[cfg]` noise.

/// Increment a CounterVec with given labels.
///
/// Usage:
/// ```ignore
/// inc_counter!(METRICS.redirects_total, &["301"]);
/// ```
macro_rules! inc_counter {
    ($counter:expr, $labels:expr) => {
        #[cfg(feature = "metrics")]
        $counter.with_label_values($labels).inc();
    };
}

/// Increment a plain Counter (no labels).
///
/// Usage:
/// ```ignore
/// inc_plain_counter!(METRICS.cache_hits_total);
/// ```
macro_rules! inc_plain_counter {
    ($counter:expr) => {
        #[cfg(feature = "metrics")]
        $counter.inc();
    };
}

/// Add to a plain Counter (no labels).
macro_rules! inc_plain_counter_by {
    ($counter:expr, $value:expr) => {
        #[cfg(feature = "metrics")]
        $counter.inc_by($value);
    };
}

/// Set a plain Gauge (no labels) to a value.
///
/// Usage:
/// ```ignore
/// set_plain_gauge!(METRICS.clicks_queue_size, queued as f64);
/// ```
macro_rules! set_plain_gauge {
    ($gauge:expr, $value:expr) => {
        #[cfg(feature = "metrics")]
        $gauge.set($value);
    };
}
