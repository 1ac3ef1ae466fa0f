//! Re-entrancy guard for the redraw sequence.

use std::cell::Cell;
use std::rc::Rc;

/// Shared flag set while a redraw is running.
///
/// Clones share the flag, so a component factory holding a clone can tell
/// that it is being called from inside a redraw.
#[derive(Debug, Clone, Default)]
pub struct RedrawGuard {
    active: Rc<Cell<bool>>,
}

impl RedrawGuard {
    /// Create an inactive guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a redraw is in progress.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Mark the start of a redraw.
    ///
    /// # Panics
    ///
    /// Panics when a redraw is already running. Redraws requested from
    /// inside row rendering must be deferred by the caller.
    pub fn enter(&self) -> RedrawLock {
        if self.active.replace(true) {
            panic!(
                "cannot redraw rows while already redrawing rows; \
                 defer the call, e.g. via a zero-delay timer"
            );
        }
        RedrawLock {
            active: Rc::clone(&self.active),
        }
    }
}

/// Held for the duration of one redraw. Clears the guard on drop, including
/// during unwinding.
#[derive(Debug)]
#[must_use = "the redraw guard is released as soon as the lock is dropped"]
pub struct RedrawLock {
    active: Rc<Cell<bool>>,
}

impl Drop for RedrawLock {
    fn drop(&mut self) {
        self.active.set(false);
    }
}
