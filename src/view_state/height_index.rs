//! HeightIndex - O(log n) row tops and pixel lookups via Fenwick tree
//!
//! Backs the client-side row model: row `i` covers pixels
//! `[top(i), top(i) + height(i))`.
//!
//! # Complexity
//!
//! - `set`: O(log n)
//! - `prefix_sum` / `top`: O(log n)
//! - `index_at_pixel`: O(log² n)
//! - `push`: O(log n) amortized
//! - `len`: O(1)

/// Fenwick tree over row heights in pixels.
#[derive(Debug, Clone, Default)]
pub struct HeightIndex {
    /// Fenwick storage (1-based semantics over a 0-based slice).
    tree: Vec<i64>,
    /// Number of rows (len <= tree.len()).
    len: usize,
}

impl HeightIndex {
    /// Creates an empty index with room for `capacity` rows.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gridrows::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::new(100);
    /// assert_eq!(index.len(), 0);
    /// assert_eq!(index.total(), 0);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self {
            tree: vec![0; capacity],
            len: 0,
        }
    }

    /// Builds an index from a sequence of heights.
    pub fn from_heights(heights: impl IntoIterator<Item = i64>) -> Self {
        let heights: Vec<i64> = heights.into_iter().collect();
        let mut index = Self::new(heights.len());
        for height in heights {
            index.push(height);
        }
        index
    }

    /// Height of row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn height(&self, index: usize) -> i64 {
        if index == 0 {
            self.prefix_sum(0)
        } else {
            self.prefix_sum(index) - self.prefix_sum(index - 1)
        }
    }

    /// Sets the height of row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gridrows::view_state::height_index::HeightIndex;
    /// let mut index = HeightIndex::from_heights([20, 20, 20]);
    /// index.set(1, 50);
    /// assert_eq!(index.top(2), 70);
    /// ```
    pub fn set(&mut self, index: usize, height: i64) {
        let delta = height - self.height(index);
        if delta != 0 {
            fenwick::array::update(&mut self.tree, index, delta);
        }
    }

    /// Cumulative height of rows `0..=index`, i.e. the bottom of row `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn prefix_sum(&self, index: usize) -> i64 {
        assert!(
            index < self.len,
            "index {} out of bounds (len: {})",
            index,
            self.len
        );
        fenwick::array::prefix_sum(&self.tree, index)
    }

    /// Top pixel of row `index`. `top(len())` is the total height.
    pub fn top(&self, index: usize) -> i64 {
        if index == 0 || self.is_empty() {
            0
        } else {
            self.prefix_sum(index.min(self.len) - 1)
        }
    }

    /// Row covering `pixel`, i.e. the first row whose bottom is past it.
    ///
    /// Returns `None` if `pixel >= total()` or the index is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gridrows::view_state::height_index::HeightIndex;
    /// let index = HeightIndex::from_heights([10, 20, 15]);
    /// assert_eq!(index.index_at_pixel(0), Some(0));
    /// assert_eq!(index.index_at_pixel(10), Some(1));
    /// assert_eq!(index.index_at_pixel(29), Some(1));
    /// assert_eq!(index.index_at_pixel(30), Some(2));
    /// assert_eq!(index.index_at_pixel(45), None);
    /// ```
    pub fn index_at_pixel(&self, pixel: i64) -> Option<usize> {
        if self.is_empty() {
            return None;
        }

        let mut left = 0;
        let mut right = self.len;
        while left < right {
            let mid = left + (right - left) / 2;
            if self.prefix_sum(mid) > pixel {
                right = mid;
            } else {
                left = mid + 1;
            }
        }

        (left < self.len).then_some(left)
    }

    /// Total height of all rows.
    pub fn total(&self) -> i64 {
        self.top(self.len)
    }

    /// Number of rows indexed.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no rows are indexed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a row with the given height, growing storage if needed.
    pub fn push(&mut self, height: i64) {
        if self.len >= self.tree.len() {
            self.grow();
        }
        let idx = self.len;
        self.len += 1;
        fenwick::array::update(&mut self.tree, idx, height);
    }

    /// Removes all rows, keeping capacity.
    pub fn clear(&mut self) {
        // Updates propagate past `len`, so the whole slice is dirty.
        self.tree.fill(0);
        self.len = 0;
    }

    /// Doubles capacity. Fenwick nodes above the old length cover earlier
    /// rows, so the tree is rebuilt rather than zero-extended.
    fn grow(&mut self) {
        let heights: Vec<i64> = (0..self.len).map(|i| self.height(i)).collect();
        let capacity = self.tree.len().max(1) * 2;
        self.tree = vec![0; capacity];
        for (i, height) in heights.into_iter().enumerate() {
            fenwick::array::update(&mut self.tree, i, height);
        }
    }
}
