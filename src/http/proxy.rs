//! Per-request proxy pipeline.
//!
//! ```text
//! CacheLookup ──hit──▶ Respond (stored status, headers, body)
//!      │ miss
//!      ▼
//! SelectBackend ──empty pool──▶ Fail (500)
//!      ▼
//! Forward ──transport error──▶ Fail (500)
//!      ▼
//! BufferResponse ──read error──▶ Fail (500)
//!      ▼ 2xx
//! PopulateCache
//!      ▼
//! Respond
//! ```
//!
//! Without a cache the pipeline skips straight to Forward and streams the
//! backend body to the client.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::{header::CONTENT_LENGTH, HeaderMap, Request},
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use tracing::Instrument;

use crate::cache::ResponseCache;
use crate::config::ProxyConfig;
use crate::error::{CacheError, ProxyError};
use crate::http::request::{cache_key, rewrite_for_backend};
use crate::http::response::{from_cache, strip_hop_by_hop, ClientBody};
use crate::http::transport::{build_client, HttpClient};
use crate::load_balancer::{Backend, BackendPool};
use crate::observability::ProxyMetrics;

/// Round-robin reverse proxy with an optional response cache.
#[derive(Debug)]
pub struct ProxyHandler {
    pool: BackendPool,
    client: HttpClient,
    cache: Option<ResponseCache>,
    metrics: Arc<dyn ProxyMetrics>,
    /// Responses announcing a larger body are streamed instead of cached.
    max_cached_body: Option<u64>,
    http2: bool,
}

impl ProxyHandler {
    /// Assemble a handler from its collaborators.
    pub fn new(
        pool: BackendPool,
        client: HttpClient,
        cache: Option<ResponseCache>,
        metrics: Arc<dyn ProxyMetrics>,
    ) -> Self {
        Self {
            pool,
            client,
            cache,
            metrics,
            max_cached_body: None,
            http2: false,
        }
    }

    /// Build a handler from configuration.
    ///
    /// Fails only if the cache is enabled with an unusable capacity.
    pub fn from_config(config: &ProxyConfig, metrics: Arc<dyn ProxyMetrics>) -> Result<Self, CacheError> {
        let cache = if config.cache.enabled {
            Some(ResponseCache::new(config.cache.size, metrics.clone())?)
        } else {
            None
        };

        let mut handler = Self::new(
            BackendPool::new(config.backends.iter().map(String::as_str)),
            build_client(&config.transport),
            cache,
            metrics,
        );
        handler.max_cached_body = config.cache.max_body_bytes.map(|n| n as u64);
        handler.http2 = config.transport.http2_only;
        Ok(handler)
    }

    pub fn pool(&self) -> &BackendPool {
        &self.pool
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Proxy one inbound request. Never fails: errors become 500 responses.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let span = tracing::debug_span!(
            "proxy",
            request_id = %uuid::Uuid::new_v4(),
            method = %request.method(),
            uri = %request.uri(),
        );

        self.metrics.request();

        let result = async {
            match &self.cache {
                Some(cache) => self.serve_buffered(cache, request).await,
                None => self.serve_streamed(request).await,
            }
        }
        .instrument(span)
        .await;

        let response = result.unwrap_or_else(|err| {
            self.metrics.proxy_error();
            err.into_response()
        });

        self.metrics.request_duration(start.elapsed());
        response
    }

    /// Cache-less path: headers are copied, the body is streamed as it arrives.
    async fn serve_streamed(&self, request: Request<Body>) -> Result<Response, ProxyError> {
        let (backend, response) = self.forward(request).await?;
        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, stream_body(backend, body)))
    }

    /// Cached path: serve hits from memory, buffer misses and store 2xx.
    async fn serve_buffered(&self, cache: &ResponseCache, request: Request<Body>) -> Result<Response, ProxyError> {
        let key = cache_key(request.uri());
        if let Some(hit) = cache.get(&key) {
            tracing::debug!(key = %key, "serving response from the cache");
            return Ok(from_cache(&key, &hit));
        }

        let (backend, response) = self.forward(request).await?;
        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);

        if self.exceeds_cache_limit(&parts.headers) {
            tracing::debug!(key = %key, backend = %backend, "response too large to cache, streaming");
            return Ok(Response::from_parts(parts, stream_body(backend, body)));
        }

        let bytes = match axum::body::to_bytes(Body::new(body), usize::MAX).await {
            Ok(bytes) => bytes,
            Err(source) => {
                tracing::error!(key = %key, backend = %backend, error = %source, "error while reading backend response");
                return Err(ProxyError::ResponseRead {
                    backend: backend.to_string(),
                    source,
                });
            }
        };

        if parts.status.is_success() {
            cache.put(key, parts.status, &parts.headers, &bytes);
        }

        let body = ClientBody::relayed(Body::from(bytes), backend);
        Ok(Response::from_parts(parts, Body::new(body)))
    }

    /// Pick a backend and send the rewritten request to it. No retries.
    async fn forward(&self, request: Request<Body>) -> Result<(Backend, hyper::Response<Incoming>), ProxyError> {
        let backend = self
            .pool
            .pick()
            .inspect_err(|e| tracing::error!(error = %e, "cannot select a backend"))?;
        let request = rewrite_for_backend(request, &backend, self.http2)?;
        let uri = request.uri().clone();

        tracing::debug!(uri = %uri, backend = %backend, "requesting");

        match self.client.request(request).await {
            Ok(response) => Ok((backend, response)),
            Err(source) => {
                tracing::error!(uri = %uri, backend = %backend, error = %source, "error while querying backend");
                Err(ProxyError::Transport {
                    backend: backend.to_string(),
                    source,
                })
            }
        }
    }

    fn exceeds_cache_limit(&self, headers: &HeaderMap) -> bool {
        let Some(limit) = self.max_cached_body else {
            return false;
        };
        headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .is_some_and(|len| len > limit)
    }
}

/// Pass the backend body through. Errors mid-stream are only logged: part of
/// the response may already be on the wire.
fn stream_body(backend: Backend, body: Incoming) -> Body {
    let source = backend.clone();
    let relayed = Body::new(body.map_err(move |e| {
        tracing::debug!(backend = %source, error = %e, "error while responding to client");
        e
    }));
    Body::new(ClientBody::relayed(relayed, backend))
}
