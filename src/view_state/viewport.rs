//! Viewport range calculation.
//!
//! Turns a scroll position into the inclusive window of display indices the
//! body should render. The visible band is widened by the row buffer,
//! clamped to the current page and converted to indices through the row
//! model's pixel lookup.

use tracing::{debug, warn};

use super::index_window::IndexWindow;
use crate::config::{DomLayout, GridOptions};
use crate::model::{PageBounds, Pagination, RowModel};

/// Rendered windows never exceed this many rows unless the restriction is
/// suppressed (or the row buffer alone is larger).
pub const MAX_RENDERED_ROWS: i64 = 500;

/// Scroll state of the body viewport, in body pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportInput {
    /// Body pixel at the top of the viewport.
    pub scroll_top: i64,
    /// Visible body height in pixels.
    pub viewport_height: i64,
}

impl ViewportInput {
    /// Viewport at `scroll_top` showing `viewport_height` pixels.
    pub fn new(scroll_top: i64, viewport_height: i64) -> Self {
        Self {
            scroll_top,
            viewport_height,
        }
    }

    /// Body pixel just below the viewport.
    pub fn scroll_bottom(&self) -> i64 {
        self.scroll_top.saturating_add(self.viewport_height)
    }
}

/// Result of one range computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportRange {
    /// Rows to render.
    pub window: IndexWindow,
    /// First pixel actually on screen (in model pixels).
    pub first_visible_pixel: i64,
    /// Page bounds after any lazy height resolution.
    pub page: PageBounds,
    /// Whether `window` differs from the previous computation.
    pub changed: bool,
    /// Whether lazily computed heights moved any row.
    pub heights_changed: bool,
}

/// Widen the visible band by `buffer_px` on each side and clamp it to the
/// page. Returns `(first_pixel, last_pixel)` in model pixels.
pub fn pixel_band(input: ViewportInput, page: &PageBounds, buffer_px: i64) -> (i64, i64) {
    let offset = page.pixel_offset;
    let first = input
        .scroll_top
        .saturating_add(offset)
        .saturating_sub(buffer_px)
        .max(page.first_pixel);
    let last = input
        .scroll_bottom()
        .saturating_add(offset)
        .saturating_add(buffer_px)
        .min(page.last_pixel);
    (first, last)
}

/// Stateful viewport range calculator.
///
/// Remembers the last window so that "viewport changed" is only reported
/// when the bounds actually move.
#[derive(Debug, Clone)]
pub struct ViewportRangeCalculator {
    row_buffer: i64,
    row_height: i64,
    dom_layout: DomLayout,
    suppress_row_virtualisation: bool,
    suppress_max_rendered_row_restriction: bool,
    window: IndexWindow,
    first_visible_pixel: i64,
    negative_buffer_warned: bool,
}

impl ViewportRangeCalculator {
    /// Calculator configured from `options`, with an empty window.
    pub fn new(options: &GridOptions) -> Self {
        let mut calc = Self {
            row_buffer: 0,
            row_height: options.row_height,
            dom_layout: options.dom_layout,
            suppress_row_virtualisation: options.suppress_row_virtualisation,
            suppress_max_rendered_row_restriction: options.suppress_max_rendered_row_restriction,
            window: IndexWindow::EMPTY,
            first_visible_pixel: 0,
            negative_buffer_warned: false,
        };
        calc.set_row_buffer(options.row_buffer);
        calc
    }

    /// Set the buffer row count. Negative values are treated as zero and
    /// warned about once per calculator.
    pub fn set_row_buffer(&mut self, row_buffer: i64) {
        if row_buffer < 0 {
            if !self.negative_buffer_warned {
                warn!(row_buffer, "rowBuffer should not be negative, using 0");
                self.negative_buffer_warned = true;
            }
            self.row_buffer = 0;
        } else {
            self.row_buffer = row_buffer;
        }
    }

    /// Buffer rows on each side of the visible band.
    pub fn row_buffer(&self) -> i64 {
        self.row_buffer
    }

    /// Buffer size in pixels.
    pub fn row_buffer_px(&self) -> i64 {
        self.row_buffer * self.row_height
    }

    /// Switch body layout. Print layout renders the whole page.
    pub fn set_dom_layout(&mut self, dom_layout: DomLayout) {
        self.dom_layout = dom_layout;
    }

    /// Window from the most recent computation.
    pub fn window(&self) -> IndexWindow {
        self.window
    }

    /// First on-screen pixel from the most recent computation.
    pub fn first_visible_pixel(&self) -> i64 {
        self.first_visible_pixel
    }

    /// Compute the window for `input`.
    ///
    /// Pixel lookups may resolve estimated row heights; when they do the
    /// page bounds are stale and the band is recomputed until stable.
    pub fn compute<M: RowModel + ?Sized>(
        &mut self,
        model: &mut M,
        pagination: &Pagination,
        input: ViewportInput,
    ) -> ViewportRange {
        let mut page = pagination.bounds(&*model);
        let mut heights_changed = false;
        let mut first_visible_pixel = page.first_pixel;

        let window = if !model.is_rows_to_render() {
            IndexWindow::EMPTY
        } else if self.dom_layout == DomLayout::Print {
            IndexWindow::new(page.first_row, page.last_row)
        } else {
            let (first_pixel, last_pixel) = loop {
                let band = if self.suppress_row_virtualisation {
                    (page.first_pixel, page.last_pixel)
                } else {
                    pixel_band(input, &page, self.row_buffer_px())
                };
                first_visible_pixel = input.scroll_top.saturating_add(page.pixel_offset).max(page.first_pixel);

                if !model.ensure_row_heights_valid(band.0, band.1) {
                    break band;
                }
                heights_changed = true;
                page = pagination.bounds(&*model);
            };

            let first = model.row_index_at_pixel(first_pixel).map_or(0, |i| i as i64);
            let last = model.row_index_at_pixel(last_pixel).map_or(-1, |i| i as i64);
            let mut window = IndexWindow::new(first.max(page.first_row), last.min(page.last_row));

            let max_rows = self.row_buffer.max(MAX_RENDERED_ROWS);
            if self.dom_layout == DomLayout::Normal
                && !self.suppress_max_rendered_row_restriction
                && window.last - window.first > max_rows
            {
                window.last = window.first + max_rows;
            }
            window
        };

        let changed = window != self.window;
        if changed {
            debug!(first = window.first, last = window.last, "viewport changed");
        }
        self.window = window;
        self.first_visible_pixel = first_visible_pixel;

        ViewportRange {
            window,
            first_visible_pixel,
            page,
            changed,
            heights_changed,
        }
    }
}
