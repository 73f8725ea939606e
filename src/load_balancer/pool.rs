//! Backend pool management.
//!
//! # Responsibilities
//! - Own the fixed, ordered set of backends
//! - Hand out backends in strict round-robin order, even under concurrency

use crate::error::ProxyError;
use crate::load_balancer::{Backend, RoundRobin};

/// An ordered, immutable set of backends plus a shared cursor.
#[derive(Debug)]
pub struct BackendPool {
    backends: Vec<Backend>,
    cursor: RoundRobin,
}

impl BackendPool {
    /// Create a pool from backend addresses. Order is preserved.
    pub fn new<I, B>(addrs: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Backend>,
    {
        Self {
            backends: addrs.into_iter().map(Into::into).collect(),
            cursor: RoundRobin::new(),
        }
    }

    /// Pick the next backend in round-robin order.
    ///
    /// Fails with [`ProxyError::NoBackendAvailable`] on an empty pool.
    pub fn pick(&self) -> Result<Backend, ProxyError> {
        self.cursor
            .advance(self.backends.len())
            .map(|idx| self.backends[idx].clone())
            .ok_or(ProxyError::NoBackendAvailable)
    }

    /// Number of backends in the pool.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// All backends, in selection order.
    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }
}
