//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::{http::StatusCode, Router};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use rp::observability::ProxyMetrics;
use rp::{HttpServer, ProxyConfig, Shutdown};

pub const TEST_HEADER: &str = "x-added-header";
pub const TEST_HEADER_VALUE: &str = "42";

/// Serve `app` on an ephemeral local port.
pub async fn start_backend(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A backend answering every request with `status`, `body` and the test
/// header. Returns its address and a counter of handled requests.
pub async fn start_counting_backend(
    status: StatusCode,
    body: &'static str,
) -> (SocketAddr, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let app = Router::new().fallback(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (status, [(TEST_HEADER, TEST_HEADER_VALUE)], body)
        }
    });
    (start_backend(app).await, calls)
}

/// A backend that always answers 200 with `body`.
pub async fn start_text_backend(body: &'static str) -> SocketAddr {
    start_counting_backend(StatusCode::OK, body).await.0
}

/// A raw TCP backend that announces `Content-Length: 100`, sends five bytes
/// and closes the connection. Returns its address and a connection counter.
pub async fn start_truncating_backend() -> (SocketAddr, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = stream
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nhello")
                    .await;
                let _ = stream.shutdown().await;
            });
        }
    });
    (addr, calls)
}

/// An address nothing listens on.
pub async fn dead_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Default config pointing at `backends`, metrics exporter off.
pub fn config_for(backends: &[SocketAddr]) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.backends = backends.iter().map(ToString::to_string).collect();
    config.observability.metrics_enabled = false;
    config
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(config: ProxyConfig, metrics: Arc<dyn ProxyMetrics>) -> (String, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config, metrics).unwrap();
    let shutdown = Shutdown::new();
    tokio::spawn(server.run(listener, shutdown.signalled()));
    (format!("http://{addr}"), shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
