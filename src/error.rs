//! Error types for request handling and startup.
//!
//! Every `ProxyError` is request-scoped: it terminates the request that
//! produced it and never touches shared state (pool cursor, cache).

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors that terminate a single proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The backend pool was built with zero backends.
    #[error("no backend available to pick")]
    NoBackendAvailable,

    /// The picked backend address cannot be used as a request target.
    #[error("invalid backend target {backend}: {source}")]
    InvalidTarget {
        backend: String,
        #[source]
        source: axum::http::Error,
    },

    /// Connect, timeout or protocol failure talking to a backend.
    #[error("error querying backend {backend}: {source}")]
    Transport {
        backend: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    /// The backend body could not be buffered.
    #[error("error reading response from backend {backend}: {source}")]
    ResponseRead {
        backend: String,
        #[source]
        source: axum::Error,
    },
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

/// Errors raised while building the response cache.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("invalid cache capacity {0}, must be greater than zero")]
    InvalidCapacity(usize),
}
