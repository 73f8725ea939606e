//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → servers stop accepting → in-flight requests drain → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast coordinator shared by every long-running task
//! - Draining is bounded: the binary exits after a fixed deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
