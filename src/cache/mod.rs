//! Response caching subsystem.
//!
//! # Data Flow
//! ```text
//! Proxy handler (cache capability present)
//!     → response.rs (ResponseCache::get by request URI)
//!         hit  → replay stored status, headers, body
//!         miss → forward, buffer, ResponseCache::put on 2xx
//!     → arc.rs (adaptive replacement: admission, promotion, eviction)
//! ```
//!
//! # Design Decisions
//! - Keyed purely by the raw request URI, no HTTP caching semantics
//! - Stored bodies are private copies of the backend bytes
//! - The cache owns its lock; callers never hold it across I/O

pub mod arc;
pub mod response;

pub use arc::ArcCache;
pub use response::{CachedResponse, ResponseCache, CACHED_HEADER};
