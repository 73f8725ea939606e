//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy handler, response cache:
//!     → tracing macros (structured, leveled log events)
//!     → ProxyMetrics sink (counters, request-duration histogram)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → metrics.rs Prometheus exporter (scrape endpoint)
//! ```
//!
//! # Design Decisions
//! - Components receive the metrics sink by injection, never a global
//! - Metrics are write-only; nothing in the request path reads them back
//! - Log level configurable via config, overridden by `RUST_LOG`

pub mod logging;
pub mod metrics;

pub use metrics::{CountingMetrics, NoopMetrics, PrometheusMetrics, ProxyMetrics};
