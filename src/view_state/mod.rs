//! View-state layer - row geometry, viewport ranges and sticky rows
//!
//! Pure computations over a [`RowModel`](crate::model::RowModel) that the
//! renderer turns into row controllers.
//!
//! # Module Structure
//!
//! - `height_index`: HeightIndex - O(log n) row tops via Fenwick tree
//! - `index_window`: IndexWindow - inclusive range of rendered display indices
//! - `viewport`: ViewportRangeCalculator - scroll position to index window
//! - `sticky`: StickyRowEngine - pinned ancestor rows at the top of the body

pub mod height_index;
pub mod index_window;
pub mod sticky;
pub mod viewport;

pub use height_index::HeightIndex;
pub use index_window::IndexWindow;
pub use sticky::{check_sticky_rows, StickyPlan, StickyRowEngine, StickyUpdate};
pub use viewport::{pixel_band, ViewportInput, ViewportRange, ViewportRangeCalculator, MAX_RENDERED_ROWS};
