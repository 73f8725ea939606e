//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route, tracing layer)
//!     → proxy.rs (cache lookup, backend pick, forward, buffer, populate)
//!     → request.rs (cache key, rewrite target to the picked backend)
//!     → transport.rs (pooled hyper client to backends)
//!     → response.rs (header propagation, cached replay, client body)
//!     → Send to client
//! ```

pub mod proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod transport;

pub use proxy::ProxyHandler;
pub use server::HttpServer;
