//! Tween identity
//!
//! Ids are issued in increasing order and are independent of where a tween is
//! stored, so a caller can never observe slot reuse through an id.

use std::fmt;

/// Externally visible identity of a tween
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TweenId(u64);

impl TweenId {
    /// Reserved "no tween" value, never issued
    pub const NONE: TweenId = TweenId(0);

    /// Convert to raw u64 (e.g. for storage in an atomic or FFI field)
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw u64
    pub fn from_raw(raw: u64) -> Self {
        TweenId(raw)
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TweenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues monotonically increasing tween ids
///
/// The counter is 64-bit, so exhaustion is not reachable in practice. If it
/// ever is, the allocator wraps back to 1 and the caller skips ids that are
/// still live (see [`IdAllocator::next_where`]).
#[derive(Debug)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Start issuing from `first` (clamped above the reserved sentinel)
    pub fn starting_at(first: u64) -> Self {
        Self { next: first.max(1) }
    }

    /// Issue the next id
    pub fn next_id(&mut self) -> TweenId {
        let id = TweenId(self.next);
        self.next = match self.next.checked_add(1) {
            Some(next) => next,
            None => {
                tracing::warn!("tween id space exhausted, wrapping to 1");
                1
            }
        };
        id
    }

    /// Issue the next id for which `is_free` holds
    ///
    /// Used after wraparound so a live id is never handed out twice.
    pub fn next_where(&mut self, mut is_free: impl FnMut(TweenId) -> bool) -> TweenId {
        loop {
            let id = self.next_id();
            if is_free(id) {
                return id;
            }
        }
    }

    /// The id that the next call to [`IdAllocator::next`] will return
    pub fn peek(&self) -> TweenId {
        TweenId(self.next)
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
