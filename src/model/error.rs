//! Error types for gridrows.
//!
//! The rendering pipeline itself is infallible: it logs and degrades on
//! inconsistent input and panics only on re-entrant redraws. Fallible
//! surfaces are the row-model mutation APIs ([`ModelError`]) and the ambient
//! setup (configuration and logging), all of which fold into [`GridError`].
//!
//! # Error Hierarchy
//!
//! - [`GridError`] - Top-level error for host applications
//!   - [`ModelError`] - Invalid node/store handles or node-kind mismatches
//!   - [`ConfigError`](crate::config::ConfigError) - Config file read/parse failures
//!   - [`LoggingError`](crate::logging::LoggingError) - Subscriber setup failures

use thiserror::Error;

use super::row_node::{NodeId, StoreId};
use crate::config::ConfigError;
use crate::logging::LoggingError;

/// Top-level error for host applications embedding the grid.
///
/// # Examples
///
/// ```
/// use gridrows::model::error::{GridError, ModelError};
/// use gridrows::model::{ClientSideRowModel, RowModel};
///
/// fn expand_first(model: &mut ClientSideRowModel) -> Result<(), GridError> {
///     let first = model.row_at(0).ok_or(ModelError::EmptyModel)?;
///     model.set_expanded(first, true)?;
///     Ok(())
/// }
///
/// let mut model = ClientSideRowModel::new(20);
/// assert!(expand_first(&mut model).is_err());
/// ```
#[derive(Debug, Error)]
pub enum GridError {
    /// A row-model operation was given a bad handle or the wrong node kind.
    #[error("Row model error: {0}")]
    Model(#[from] ModelError),

    /// The configuration file exists but could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The tracing subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

/// Errors raised by row-model mutation APIs.
///
/// These indicate a caller holding a stale or foreign handle. They are
/// never produced by the rendering pipeline, which skips missing nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The node handle does not belong to this model's table.
    #[error("Unknown row node {0:?}")]
    UnknownNode(NodeId),

    /// The store handle does not belong to this model.
    #[error("Unknown server-side store {0:?}")]
    UnknownStore(StoreId),

    /// Children were attached to a node that is not a group.
    #[error("Row node {0:?} is not a group")]
    NotAGroup(NodeId),

    /// A detail row was requested for a node that is not a master row.
    #[error("Row node {0:?} is not a master row")]
    NotAMaster(NodeId),

    /// The model holds no displayed rows.
    #[error("Row model has no displayed rows")]
    EmptyModel,
}
