//! Round-robin reverse proxy with an in-memory response cache.
//!
//! ```text
//!   client ──▶ http::server ──▶ http::proxy ──┬─ hit ──▶ cache::ResponseCache
//!                                             └─ miss ─▶ load_balancer::BackendPool
//!                                                         ──▶ http::transport ──▶ backend
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;

pub use cache::{ResponseCache, CACHED_HEADER};
pub use config::ProxyConfig;
pub use error::{CacheError, ProxyError};
pub use http::{HttpServer, ProxyHandler};
pub use lifecycle::Shutdown;
pub use load_balancer::BackendPool;
