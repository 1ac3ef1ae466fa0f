//! Row models and the node data they own.
//!
//! The rendering pipeline only sees the [`RowModel`] trait. Both concrete
//! models keep their nodes in a [`RowNodeTable`] and hand out [`NodeId`]
//! handles.

pub mod client_side;
pub mod error;
pub mod pagination;
pub mod row_model;
pub mod row_node;
pub mod server_side;

// Re-export for convenience
pub use client_side::{ClientSideRowModel, RowHeightFn};
pub use error::{GridError, ModelError};
pub use pagination::{PageBounds, Pagination};
pub use row_model::{RowModel, RowModelKind};
pub use row_node::{NodeId, RowId, RowNode, RowNodeTable, RowPinned, StoreId};
pub use server_side::{ServerSideRowModel, ServerSideStore};
