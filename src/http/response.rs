//! Response handling and transformation.
//!
//! # Responsibilities
//! - Propagate backend headers to the client, minus hop-by-hop headers
//! - Replay cached responses
//! - Wrap every outbound body so an abandoned client write is logged
//!
//! # Design Decisions
//! - Every value of a multi-valued header is kept, in order
//! - Hop-by-hop headers are connection-scoped and never forwarded

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use axum::{
    body::{Body, Bytes, HttpBody},
    http::{header::CONNECTION, HeaderMap, HeaderName},
    response::Response,
};
use hyper::body::{Frame, SizeHint};

use crate::cache::CachedResponse;
use crate::load_balancer::Backend;

/// Connection-scoped headers (RFC 9110 §7.6.1).
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Header names the sender listed in `Connection`; they are hop-by-hop too.
fn connection_options(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect()
}

/// Remove hop-by-hop headers in place, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed = connection_options(headers);
    let doomed: Vec<HeaderName> = headers
        .keys()
        .filter(|name| is_hop_by_hop(name) || listed.contains(name))
        .cloned()
        .collect();
    for name in doomed {
        headers.remove(&name);
    }
}

/// Build the client response for a cache hit stored under `key`.
pub fn from_cache(key: &str, entry: &CachedResponse) -> Response {
    let body = ClientBody::cached(Body::from(entry.body.clone()), key);
    let mut response = Response::new(Body::new(body));
    *response.status_mut() = entry.status;
    for (name, value) in &entry.headers {
        response.headers_mut().append(name, value.clone());
    }
    response
}

#[derive(Debug)]
enum Origin {
    Backend(Backend),
    Cache(String),
}

/// Body handed to hyper for the client.
///
/// Hyper drops the body without further notice when writing to the client
/// fails, so the drop is where the failure gets logged.
#[derive(Debug)]
pub struct ClientBody {
    inner: Body,
    origin: Origin,
    done: bool,
}

impl ClientBody {
    /// A body relayed from `backend`.
    pub fn relayed(inner: Body, backend: Backend) -> Self {
        Self {
            inner,
            origin: Origin::Backend(backend),
            done: false,
        }
    }

    /// A body replayed from the cache entry under `key`.
    pub fn cached(inner: Body, key: impl Into<String>) -> Self {
        Self {
            inner,
            origin: Origin::Cache(key.into()),
            done: false,
        }
    }
}

impl HttpBody for ClientBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let frame = ready!(Pin::new(&mut this.inner).poll_frame(cx));
        // Read errors are reported where they happen.
        if !matches!(frame, Some(Ok(_))) {
            this.done = true;
        }
        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for ClientBody {
    fn drop(&mut self) {
        if self.done || self.inner.is_end_stream() {
            return;
        }
        match &self.origin {
            Origin::Backend(backend) => {
                tracing::debug!(backend = %backend, "error while responding to client: response abandoned")
            }
            Origin::Cache(key) => {
                tracing::debug!(key = %key, "error while responding to client: response abandoned")
            }
        }
    }
}
