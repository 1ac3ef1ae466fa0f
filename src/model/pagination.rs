//! Pagination bounds over a row model.

use super::row_model::RowModel;
use super::row_node::NodeId;

/// Row and pixel bounds of the current page.
///
/// `last_row < first_row` means the page is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    /// First display index on the page.
    pub first_row: i64,
    /// Last display index on the page (inclusive).
    pub last_row: i64,
    /// Top pixel of the first row.
    pub first_pixel: i64,
    /// Bottom pixel of the last row.
    pub last_pixel: i64,
    /// Subtracted from row tops so the page starts at body pixel 0.
    pub pixel_offset: i64,
}

impl PageBounds {
    /// Bounds of an empty page.
    pub const EMPTY: Self = Self {
        first_row: 0,
        last_row: -1,
        first_pixel: 0,
        last_pixel: 0,
        pixel_offset: 0,
    };

    /// Height of the page in pixels.
    pub fn height(&self) -> i64 {
        self.last_pixel - self.first_pixel
    }

    /// Whether the page contains no rows.
    pub fn is_empty(&self) -> bool {
        self.last_row < self.first_row
    }

    /// Whether `index` lies on the page.
    pub fn contains_row(&self, index: usize) -> bool {
        let index = index as i64;
        index >= self.first_row && index <= self.last_row
    }
}

/// Page selection. With no page size every row is on page zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    page_size: Option<usize>,
    current_page: usize,
}

impl Pagination {
    /// Create pagination with an optional page size. A size of zero disables
    /// paging.
    pub fn new(page_size: Option<usize>) -> Self {
        Self {
            page_size: page_size.filter(|size| *size > 0),
            current_page: 0,
        }
    }

    /// Whether rows are split into pages.
    pub fn is_paginated(&self) -> bool {
        self.page_size.is_some()
    }

    /// Zero-based index of the shown page.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Number of pages for the model's current row count (at least one).
    pub fn total_pages<M: RowModel + ?Sized>(&self, model: &M) -> usize {
        match self.page_size {
            Some(size) => model.row_count().div_ceil(size).max(1),
            None => 1,
        }
    }

    /// Move to `page`, clamped to the last page. Returns whether the page
    /// changed.
    pub fn set_page<M: RowModel + ?Sized>(&mut self, page: usize, model: &M) -> bool {
        let page = page.min(self.total_pages(model) - 1);
        let changed = page != self.current_page;
        self.current_page = page;
        changed
    }

    /// Bounds of the current page for the model's present layout.
    pub fn bounds<M: RowModel + ?Sized>(&self, model: &M) -> PageBounds {
        let count = model.row_count();
        if count == 0 {
            return PageBounds::EMPTY;
        }

        let (first, last) = match self.page_size {
            Some(size) => {
                let page = self.current_page.min(count.div_ceil(size) - 1);
                let first = page * size;
                (first, (first + size).min(count) - 1)
            }
            None => (0, count - 1),
        };

        let first_pixel = model
            .row_at(first)
            .and_then(|id| model.node(id))
            .and_then(|n| n.row_top)
            .unwrap_or(0);
        let last_pixel = model
            .row_at(last)
            .and_then(|id| model.node(id))
            .and_then(|n| n.row_bottom())
            .unwrap_or(first_pixel);

        PageBounds {
            first_row: first as i64,
            last_row: last as i64,
            first_pixel,
            last_pixel,
            pixel_offset: if self.is_paginated() { first_pixel } else { 0 },
        }
    }

    /// Whether `node` is displayed on the current page.
    pub fn is_row_in_page<M: RowModel + ?Sized>(&self, model: &M, node: NodeId) -> bool {
        model
            .node(node)
            .and_then(|n| n.row_index)
            .is_some_and(|index| self.bounds(model).contains_row(index))
    }
}
