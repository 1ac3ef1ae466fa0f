//! Render layer - row controllers and redraw orchestration
//!
//! # Module Structure
//!
//! - `row_ctrl`: RowCtrl - runtime state of one rendered row
//! - `lifecycle`: RowLifecycleCache - live map, recycling, zombies
//! - `detail_cache`: DetailRowCache - LRU side cache for detail rows
//! - `renderer`: RowRenderer - the redraw sequence
//! - `guard`: RedrawGuard - re-entrancy flag
//! - `task_queue`, `debounce`: deferred work primitives
//! - `focus`, `events`, `components`: host-facing state and hooks

pub mod components;
pub mod debounce;
pub mod detail_cache;
pub mod events;
pub mod focus;
pub mod guard;
pub mod lifecycle;
pub mod renderer;
pub mod row_ctrl;
pub mod task_queue;

pub use components::{NoopComponents, RowComponentFactory};
pub use debounce::Debouncer;
pub use detail_cache::{CacheLookup, DetailRowCache, DEFAULT_DETAIL_CACHE_CAPACITY, FALLBACK_DETAIL_CACHE_CAPACITY};
pub use events::RenderEvent;
pub use focus::{FocusState, FocusTarget, FocusedCell};
pub use guard::{RedrawGuard, RedrawLock};
pub use lifecycle::{BuildMode, RecycledRows, RowLifecycleCache};
pub use renderer::{ModelUpdate, RowRenderer};
pub use row_ctrl::{RowContainer, RowCtrl, RowCtrlId};
pub use task_queue::{DeferredTask, FrameTask, TaskQueue};
