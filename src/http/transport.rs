//! Outbound transport to backends.
//!
//! One pooled client is shared by every request; it is safe for concurrent
//! use and is never guarded by the proxy's own locks.

use axum::body::Body;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};

use crate::config::TransportConfig;

/// Connection-pooled HTTP client used to reach backends.
pub type HttpClient = Client<HttpConnector, Body>;

/// Build the shared backend client from transport settings.
pub fn build_client(config: &TransportConfig) -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(config.connect_timeout()));
    connector.set_keepalive(Some(config.keepalive()));
    connector.set_nodelay(true);

    Client::builder(TokioExecutor::new())
        .pool_timer(TokioTimer::new())
        .pool_idle_timeout(config.idle_timeout())
        .pool_max_idle_per_host(config.max_idle_per_host)
        .http2_only(config.http2_only)
        .build(connector)
}
