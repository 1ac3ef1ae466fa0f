//! Host hooks for building and tearing down row components.

use super::focus::FocusedCell;
use super::row_ctrl::RowCtrl;
use crate::model::RowNode;

/// Builds the visual components behind row controllers.
///
/// Called synchronously from inside a redraw. Implementations must not call
/// back into the renderer; a redraw requested from here has to be deferred
/// by the host (for example onto a zero-delay timer).
pub trait RowComponentFactory {
    /// Build the components for a controller that just became visible.
    fn create_row(&mut self, ctrl: &RowCtrl, node: &RowNode);

    /// Tear down the components of a destroyed controller.
    fn destroy_row(&mut self, _ctrl: &RowCtrl) {}

    /// Focus was moved back onto `cell` after a redraw rebuilt its row.
    fn on_focus_restored(&mut self, _cell: &FocusedCell) {}
}

/// Factory that renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopComponents;

impl RowComponentFactory for NoopComponents {
    fn create_row(&mut self, _ctrl: &RowCtrl, _node: &RowNode) {}
}
