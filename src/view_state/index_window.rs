//! Rendered index window

/// Inclusive range of display indices the body renders.
///
/// `last < first` means nothing is rendered; [`IndexWindow::EMPTY`] is
/// `(0, -1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexWindow {
    /// First rendered display index (inclusive).
    pub first: i64,
    /// Last rendered display index (inclusive).
    pub last: i64,
}

impl IndexWindow {
    /// The window with no rows.
    pub const EMPTY: Self = Self { first: 0, last: -1 };

    /// Create a window over `first..=last`.
    pub fn new(first: i64, last: i64) -> Self {
        Self { first, last }
    }

    /// Number of rows in the window.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.last - self.first + 1) as usize
        }
    }

    /// Whether the window holds no rows.
    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }

    /// Iterate the display indices in the window.
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        let first = self.first.max(0);
        let last = self.last;
        (first..=last).map(|i| i as usize)
    }

    /// Check if a display index is inside the window.
    pub fn contains(&self, index: usize) -> bool {
        let index = index as i64;
        index >= self.first && index <= self.last
    }

    /// Whether the window fully covers `start..=end`.
    pub fn covers(&self, start: i64, end: i64) -> bool {
        !self.is_empty() && start >= self.first && end <= self.last
    }
}

impl Default for IndexWindow {
    fn default() -> Self {
        Self::EMPTY
    }
}
