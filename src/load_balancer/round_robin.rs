//! Round-robin cursor.

use parking_lot::Mutex;

/// Shared round-robin cursor.
///
/// The only operation is an atomic advance-and-read; the index itself is
/// never exposed for external mutation.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: Mutex<Option<usize>>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the cursor one position modulo `len` and return the new index.
    ///
    /// The first call returns `0`. Returns `None` when `len` is zero, leaving
    /// the cursor untouched.
    pub fn advance(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }

        let mut cursor = self.cursor.lock();
        let next = match *cursor {
            Some(current) => (current + 1) % len,
            None => 0,
        };
        *cursor = Some(next);
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin() {
        let rr = RoundRobin::new();
        assert_eq!(rr.advance(3), Some(0));
        assert_eq!(rr.advance(3), Some(1));
        assert_eq!(rr.advance(3), Some(2));
        assert_eq!(rr.advance(3), Some(0));
    }

    #[test]
    fn test_empty_len_leaves_cursor() {
        let rr = RoundRobin::new();
        assert_eq!(rr.advance(0), None);
        assert_eq!(rr.advance(2), Some(0));
        assert_eq!(rr.advance(0), None);
        assert_eq!(rr.advance(2), Some(1));
    }
}
