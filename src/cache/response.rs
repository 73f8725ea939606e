//! In-memory cache of backend responses keyed by request URI.
//!
//! This is a quick and dirty cache: it does not implement HTTP caching
//! (no Vary, Cache-Control or conditional requests). The caller decides
//! what gets stored.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use parking_lot::Mutex;

use crate::cache::ArcCache;
use crate::error::CacheError;
use crate::observability::ProxyMetrics;

/// Header added to every response served from the cache.
pub const CACHED_HEADER: &str = "x-cached-response";

/// A captured backend response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    /// Backend headers plus the [`CACHED_HEADER`] marker.
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Shared response cache with ARC eviction.
///
/// Internally synchronized; the lock is held only for the map operation and
/// never across I/O. Entries are handed out as `Arc`s.
#[derive(Debug)]
pub struct ResponseCache {
    inner: Mutex<ArcCache<String, Arc<CachedResponse>>>,
    metrics: Arc<dyn ProxyMetrics>,
}

impl ResponseCache {
    /// Create a cache holding at most `capacity` responses.
    pub fn new(capacity: usize, metrics: Arc<dyn ProxyMetrics>) -> Result<Self, CacheError> {
        Ok(Self {
            inner: Mutex::new(ArcCache::new(capacity)?),
            metrics,
        })
    }

    /// Fetch the response stored under `key`.
    pub fn get(&self, key: &str) -> Option<Arc<CachedResponse>> {
        tracing::debug!(key, "requesting from the cache");
        self.metrics.cache_request();

        let cached = self.inner.lock().get(key).cloned();
        if cached.is_some() {
            self.metrics.cache_hit();
        }
        cached
    }

    /// Store a private copy of a response under `key`, replacing any previous
    /// entry.
    pub fn put(&self, key: impl Into<String>, status: StatusCode, headers: &HeaderMap, body: &[u8]) {
        let key = key.into();
        let mut headers = headers.clone();
        headers.append(CACHED_HEADER, HeaderValue::from_static("true"));

        let entry = Arc::new(CachedResponse {
            status,
            headers,
            body: Bytes::copy_from_slice(body),
        });

        tracing::debug!(key = %key, bytes = body.len(), "putting a response into the cache");
        self.inner.lock().put(key, entry);
    }

    /// Number of cached responses.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::CountingMetrics;

    fn cache(capacity: usize) -> (ResponseCache, Arc<CountingMetrics>) {
        let metrics = Arc::new(CountingMetrics::new());
        let cache = ResponseCache::new(capacity, metrics.clone()).unwrap();
        (cache, metrics)
    }

    #[test]
    fn test_zero_capacity() {
        let err = ResponseCache::new(0, Arc::new(CountingMetrics::new())).unwrap_err();
        assert_eq!(err, CacheError::InvalidCapacity(0));
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let (cache, metrics) = cache(10);
        assert!(cache.get("/a").is_none());
        cache.put("/a", StatusCode::OK, &HeaderMap::new(), b"body");
        assert!(cache.get("/a").is_some());

        assert_eq!(metrics.cache_requests(), 2);
        assert_eq!(metrics.cache_hits(), 1);
    }

    #[test]
    fn test_put_marks_provenance() {
        let (cache, _) = cache(10);
        let mut headers = HeaderMap::new();
        headers.insert("x-added-header", HeaderValue::from_static("42"));
        cache.put("/a?b=c", StatusCode::OK, &headers, b"b1BODY");

        let hit = cache.get("/a?b=c").unwrap();
        assert_eq!(hit.headers.get(CACHED_HEADER).unwrap(), "true");
        assert_eq!(hit.headers.get("x-added-header").unwrap(), "42");
        assert!(!headers.contains_key(CACHED_HEADER));
    }

    #[test]
    fn test_no_aliasing_of_caller_buffers() {
        let (cache, _) = cache(10);
        let mut body = b"original".to_vec();
        let mut headers = HeaderMap::new();
        headers.insert("x-h", HeaderValue::from_static("v"));
        cache.put("/k", StatusCode::OK, &headers, &body);

        body.copy_from_slice(b"mutated!");
        headers.insert("x-h", HeaderValue::from_static("changed"));

        let hit = cache.get("/k").unwrap();
        assert_eq!(&hit.body[..], b"original");
        assert_eq!(hit.headers.get("x-h").unwrap(), "v");
    }

    #[test]
    fn test_repeated_hits_identical() {
        let (cache, _) = cache(10);
        cache.put("/k", StatusCode::OK, &HeaderMap::new(), b"same");
        let first = cache.get("/k").unwrap();
        for _ in 0..5 {
            let again = cache.get("/k").unwrap();
            assert_eq!(again.body, first.body);
            assert_eq!(again.headers, first.headers);
        }
    }

    #[test]
    fn test_overwrite_and_bound() {
        let (cache, _) = cache(2);
        cache.put("/k", StatusCode::OK, &HeaderMap::new(), b"one");
        cache.put("/k", StatusCode::CREATED, &HeaderMap::new(), b"two");
        let hit = cache.get("/k").unwrap();
        assert_eq!(hit.status, StatusCode::CREATED);
        assert_eq!(&hit.body[..], b"two");
        assert_eq!(hit.headers.get_all(CACHED_HEADER).iter().count(), 1);

        for i in 0..10 {
            cache.put(format!("/other/{i}"), StatusCode::OK, &HeaderMap::new(), b"x");
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.capacity(), 2);
    }
}
