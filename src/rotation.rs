//! Round-robin rotation over a fixed set of endpoints.

use std::sync::Arc;

/// One remote endpoint identity: a label (the region) plus a shared client
/// handle safe for concurrent use by in-flight jobs.
#[derive(Debug)]
pub struct Endpoint<C> {
    pub label: String,
    pub client: Arc<C>,
}

/// Deterministic round-robin cursor over a fixed, non-empty list.
///
/// `next()` returns the element at the cursor and advances it, wrapping to
/// zero. Only the single dispatch loop calls this, so no synchronization is
/// needed on the cursor.
#[derive(Debug)]
pub struct Rotator<T> {
    items: Vec<T>,
    cursor: usize,
}

impl<T> Rotator<T> {
    /// Callers must pass a non-empty list; config validation enforces this
    /// for regions.
    pub fn new(items: Vec<T>) -> Self {
        debug_assert!(!items.is_empty(), "rotator requires at least one item");
        Self { items, cursor: 0 }
    }

    pub fn next(&mut self) -> &T {
        let item = &self.items[self.cursor];
        self.cursor = (self.cursor + 1) % self.items.len();
        item
    }
}
