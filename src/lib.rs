//! gridrows
//!
//! Row virtualization and rendering pipeline for data grids: works out which
//! rows of a (possibly huge, possibly grouped) row model must exist for the
//! current scroll position, and keeps their row controllers alive, recycled
//! or torn down across scrolls and model updates.
//!
//! Layers, bottom-up:
//! - `model`: row nodes and the row models that lay them out
//! - `view_state`: pure geometry (index windows, sticky rows)
//! - `render`: row controller lifecycle and the redraw orchestrator

pub mod config;
pub mod logging;
pub mod model;
pub mod render;
pub mod view_state;

pub use model::GridError;
