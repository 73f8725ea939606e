//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Cache miss
//!     → pool.rs (BackendPool::pick)
//!     → round_robin.rs (advance the shared cursor)
//!     → backend.rs (address handed to the transport)
//! ```
//!
//! # Design Decisions
//! - Backend order is fixed at construction, never reshuffled
//! - The cursor lock covers only the read-and-advance step
//! - No health probing: selection is pure

pub mod backend;
pub mod pool;
pub mod round_robin;

pub use backend::Backend;
pub use pool::BackendPool;
pub use round_robin::RoundRobin;
