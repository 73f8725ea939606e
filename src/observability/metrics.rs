//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rp_requests_total` (counter): every request entering the proxy
//! - `rp_cache_req` (counter): lookups through the response cache
//! - `rp_cache_hit` (counter): lookups answered from the cache
//! - `rp_error_total` (counter): requests answered with a proxy error
//! - `rp_request_duration_seconds` (histogram): end-to-end latency

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};
use parking_lot::Mutex;

pub const REQUESTS_TOTAL: &str = "rp_requests_total";
pub const CACHE_REQUESTS: &str = "rp_cache_req";
pub const CACHE_HITS: &str = "rp_cache_hit";
pub const ERRORS_TOTAL: &str = "rp_error_total";
pub const REQUEST_DURATION: &str = "rp_request_duration_seconds";

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Write-only sink for proxy and cache metrics.
pub trait ProxyMetrics: Send + Sync + fmt::Debug {
    fn request(&self);
    fn cache_request(&self);
    fn cache_hit(&self);
    fn proxy_error(&self);
    fn request_duration(&self, elapsed: Duration);
}

/// Sink backed by the `metrics` facade (Prometheus in production).
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusMetrics;

impl PrometheusMetrics {
    pub fn new() -> Self {
        describe_counter!(REQUESTS_TOTAL, "The total number of proxied requests");
        describe_counter!(CACHE_REQUESTS, "The total number of request through cache");
        describe_counter!(CACHE_HITS, "The total number of hit from cache");
        describe_counter!(ERRORS_TOTAL, "The total number of errors occurring");
        describe_histogram!(
            REQUEST_DURATION,
            Unit::Seconds,
            "Time spent handling a proxied request"
        );
        Self
    }
}

impl ProxyMetrics for PrometheusMetrics {
    fn request(&self) {
        counter!(REQUESTS_TOTAL).increment(1);
    }

    fn cache_request(&self) {
        counter!(CACHE_REQUESTS).increment(1);
    }

    fn cache_hit(&self) {
        counter!(CACHE_HITS).increment(1);
    }

    fn proxy_error(&self) {
        counter!(ERRORS_TOTAL).increment(1);
    }

    fn request_duration(&self, elapsed: Duration) {
        histogram!(REQUEST_DURATION).record(elapsed.as_secs_f64());
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl ProxyMetrics for NoopMetrics {
    fn request(&self) {}
    fn cache_request(&self) {}
    fn cache_hit(&self) {}
    fn proxy_error(&self) {}
    fn request_duration(&self, _elapsed: Duration) {}
}

/// In-memory sink with plain atomic counters.
#[derive(Debug, Default)]
pub struct CountingMetrics {
    requests: AtomicU64,
    cache_requests: AtomicU64,
    cache_hits: AtomicU64,
    errors: AtomicU64,
    durations: Mutex<Vec<Duration>>,
}

impl CountingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn cache_requests(&self) -> u64 {
        self.cache_requests.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Number of recorded request-duration samples.
    pub fn duration_samples(&self) -> usize {
        self.durations.lock().len()
    }
}

impl ProxyMetrics for CountingMetrics {
    fn request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    fn cache_request(&self) {
        self.cache_requests.fetch_add(1, Ordering::Relaxed);
    }

    fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn proxy_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn request_duration(&self, elapsed: Duration) {
        self.durations.lock().push(elapsed);
    }
}

/// Install the global Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn install_exporter(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), LATENCY_BUCKETS)?
        .install()?;

    tracing::info!(address = %addr, "HTTP metrics server serving");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_metrics() {
        let m = CountingMetrics::new();
        m.request();
        m.request();
        m.cache_request();
        m.cache_hit();
        m.proxy_error();
        m.request_duration(Duration::from_millis(3));

        assert_eq!(m.requests(), 2);
        assert_eq!(m.cache_requests(), 1);
        assert_eq!(m.cache_hits(), 1);
        assert_eq!(m.errors(), 1);
        assert_eq!(m.duration_samples(), 1);
    }

    #[test]
    fn test_facade_sink_without_recorder() {
        // No recorder installed: the facade swallows every call.
        let m = PrometheusMetrics::new();
        m.request();
        m.request_duration(Duration::from_millis(1));
    }
}
