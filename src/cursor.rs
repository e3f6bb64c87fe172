//! Key Cursors
//!
//! One-shot snapshot cursors over the stored key set, and the tracker the
//! engine consults before structural mutations.
//!
//! ## Lifecycle
//! - `read_keys()` materializes the current key set into a [`KeyCursor`]
//!   and registers it with the [`CursorTracker`].
//! - An insert or delete asks the tracker whether any registered cursor is
//!   still live (not invalidated, not fully consumed). If one is, the
//!   mutation is rejected. The tracked set is discarded either way, so the
//!   next mutation is judged only against cursors handed out after this
//!   point.
//! - `close()` invalidates every tracked cursor; consumers observe
//!   termination instead of stale keys.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Result, StoreError};

/// State shared between a cursor and the tracker.
///
/// The consumer advances `pos`; the tracker only reads it (liveness checks)
/// and only writes `invalidated` (on close). Both sides also synchronize
/// through the engine mutex, so relaxed ordering suffices.
struct CursorState<K> {
    keys: Vec<K>,
    pos: AtomicUsize,
    invalidated: AtomicBool,
}

impl<K> CursorState<K> {
    fn is_live(&self) -> bool {
        !self.invalidated.load(Ordering::Relaxed)
            && self.pos.load(Ordering::Relaxed) < self.keys.len()
    }
}

// =============================================================================
// KeyCursor
// =============================================================================

/// A finite, forward-only cursor over a snapshot of the key set.
///
/// The snapshot is taken when the cursor is created and does not reflect
/// later writes or deletes. Not restartable.
pub struct KeyCursor<K> {
    state: Arc<CursorState<K>>,
}

impl<K> KeyCursor<K> {
    /// Number of keys not yet consumed
    pub fn remaining(&self) -> usize {
        if self.state.invalidated.load(Ordering::Relaxed) {
            return 0;
        }
        self.state
            .keys
            .len()
            .saturating_sub(self.state.pos.load(Ordering::Relaxed))
    }
}

impl<K: Clone> Iterator for KeyCursor<K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        if self.state.invalidated.load(Ordering::Relaxed) {
            return None;
        }

        let pos = self.state.pos.load(Ordering::Relaxed);
        let key = self.state.keys.get(pos)?.clone();
        self.state.pos.store(pos + 1, Ordering::Relaxed);
        Some(key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl<K> std::fmt::Debug for KeyCursor<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCursor")
            .field("remaining", &self.remaining())
            .finish()
    }
}

// =============================================================================
// CursorTracker
// =============================================================================

/// Tracks outstanding cursors so mutations can detect interference.
///
/// Owned by the engine and guarded by its mutex; never shared directly.
pub(crate) struct CursorTracker<K> {
    tracked: Vec<Arc<CursorState<K>>>,
}

impl<K> CursorTracker<K> {
    pub(crate) fn new() -> Self {
        Self {
            tracked: Vec::new(),
        }
    }

    /// Snapshot a key set into a new cursor and start tracking it.
    pub(crate) fn register(&mut self, keys: Vec<K>) -> KeyCursor<K> {
        let state = Arc::new(CursorState {
            keys,
            pos: AtomicUsize::new(0),
            invalidated: AtomicBool::new(false),
        });
        self.tracked.push(Arc::clone(&state));
        KeyCursor { state }
    }

    /// Gate a structural mutation (insert or delete, not overwrite).
    ///
    /// Rejects when any tracked cursor still has unconsumed keys. The
    /// tracked set is discarded on both outcomes: a rejected mutation also
    /// stops blocking on cursors handed out before it. Cursors themselves
    /// stay consumable; only the tracking is dropped.
    pub(crate) fn check_structural_mutation(&mut self) -> Result<()> {
        let blocked = self.tracked.iter().any(|cursor| cursor.is_live());
        self.tracked.clear();

        if blocked {
            Err(StoreError::ConcurrentModification)
        } else {
            Ok(())
        }
    }

    /// Invalidate and drop every tracked cursor (store close).
    pub(crate) fn invalidate_all(&mut self) {
        for cursor in self.tracked.drain(..) {
            cursor.invalidated.store(true, Ordering::Relaxed);
        }
    }

    #[cfg(test)]
    fn tracked_count(&self) -> usize {
        self.tracked.len()
    }
}
