//! Request handling and transformation.
//!
//! # Responsibilities
//! - Derive the cache key from the inbound request target
//! - Rewrite the request to the picked backend (scheme, authority, Host)
//! - Drop hop-by-hop headers before forwarding

use std::str::FromStr;

use axum::{
    body::Body,
    http::{
        header::HOST,
        uri::{Authority, PathAndQuery, Scheme},
        HeaderValue, Request, Uri, Version,
    },
};

use crate::error::ProxyError;
use crate::http::response::strip_hop_by_hop;
use crate::load_balancer::Backend;

/// Cache key for a request: the raw request target (path and query as
/// received), without host, scheme or method.
pub fn cache_key(uri: &Uri) -> String {
    uri.to_string()
}

/// Point `request` at `backend`, keeping method, path, query, headers and
/// body. The request is owned here, so the rewrite needs no locking.
pub fn rewrite_for_backend(
    request: Request<Body>,
    backend: &Backend,
    http2: bool,
) -> Result<Request<Body>, ProxyError> {
    let invalid = |source: axum::http::Error| ProxyError::InvalidTarget {
        backend: backend.to_string(),
        source,
    };

    let (mut parts, body) = request.into_parts();

    let authority = Authority::from_str(backend.addr()).map_err(|e| invalid(e.into()))?;
    let host = HeaderValue::from_str(authority.as_str()).map_err(|e| invalid(e.into()))?;

    let mut uri_parts = parts.uri.into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(authority);
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = Uri::from_parts(uri_parts).map_err(|e| invalid(e.into()))?;

    strip_hop_by_hop(&mut parts.headers);
    parts.headers.insert(HOST, host);
    parts.version = if http2 { Version::HTTP_2 } else { Version::HTTP_11 };

    Ok(Request::from_parts(parts, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Method};

    #[test]
    fn test_cache_key_is_raw_target() {
        let uri: Uri = "/search?q=rust&page=2".parse().unwrap();
        assert_eq!(cache_key(&uri), "/search?q=rust&page=2");
    }

    #[test]
    fn test_rewrite_targets_backend() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/items?id=7")
            .header(header::HOST, "proxy.example")
            .header(header::CONNECTION, "keep-alive")
            .header("x-custom", "1")
            .body(Body::from("payload"))
            .unwrap();

        let rewritten = rewrite_for_backend(request, &Backend::new("10.0.0.1:9000"), false).unwrap();

        assert_eq!(rewritten.method(), Method::POST);
        assert_eq!(rewritten.uri().to_string(), "http://10.0.0.1:9000/api/items?id=7");
        assert_eq!(rewritten.headers().get(header::HOST).unwrap(), "10.0.0.1:9000");
        assert_eq!(rewritten.headers().get("x-custom").unwrap(), "1");
        assert!(rewritten.headers().get(header::CONNECTION).is_none());
        assert_eq!(rewritten.version(), Version::HTTP_11);
    }

    #[test]
    fn test_rewrite_rejects_bad_backend() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let err = rewrite_for_backend(request, &Backend::new("not a host"), false).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidTarget { .. }));
    }
}
