//! Backend abstraction.

use std::fmt;
use std::sync::Arc;

/// A single upstream server, identified by its `host:port` address.
///
/// Cheap to clone; the address is shared and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Backend {
    addr: Arc<str>,
}

impl Backend {
    /// Create a new backend.
    pub fn new(addr: impl Into<Arc<str>>) -> Self {
        Self { addr: addr.into() }
    }

    /// The backend's `host:port` address.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.addr)
    }
}

impl From<&str> for Backend {
    fn from(addr: &str) -> Self {
        Self::new(addr)
    }
}

impl From<String> for Backend {
    fn from(addr: String) -> Self {
        Self::new(addr)
    }
}
