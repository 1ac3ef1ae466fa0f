//! Focused cell bookkeeping across redraws.

use super::row_ctrl::RowCtrlId;
use crate::model::RowPinned;

/// Logical position of the focused cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FocusedCell {
    /// Display index of the row.
    pub row_index: usize,
    /// Floating section, or `None` for the body.
    pub row_pinned: Option<RowPinned>,
    /// Column id.
    pub column: String,
}

impl FocusedCell {
    /// Cell at `row_index` in `column`.
    pub fn new(row_index: usize, row_pinned: Option<RowPinned>, column: impl Into<String>) -> Self {
        Self {
            row_index,
            row_pinned,
            column: column.into(),
        }
    }

    /// Whether this cell sits on the row at `index` in the given floating
    /// section.
    pub fn is_on_row(&self, index: usize, pinned: Option<RowPinned>) -> bool {
        self.row_index == index && self.row_pinned == pinned
    }
}

/// What actually holds input focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    /// A cell inside the given row controller.
    Cell(RowCtrlId),
    /// A full-width row controller.
    Row(RowCtrlId),
    /// A cell editor.
    Editor,
    /// Something outside the grid, or nothing.
    #[default]
    Outside,
}

impl FocusTarget {
    /// Controller holding focus, if focus is on a cell or row.
    pub fn ctrl(&self) -> Option<RowCtrlId> {
        match self {
            FocusTarget::Cell(id) | FocusTarget::Row(id) => Some(*id),
            FocusTarget::Editor | FocusTarget::Outside => None,
        }
    }
}

/// Focused cell plus the element holding focus.
#[derive(Debug, Clone, Default)]
pub struct FocusState {
    cell: Option<FocusedCell>,
    target: FocusTarget,
}

impl FocusState {
    /// Logically focused cell.
    pub fn cell(&self) -> Option<&FocusedCell> {
        self.cell.as_ref()
    }

    /// Element holding input focus.
    pub fn target(&self) -> FocusTarget {
        self.target
    }

    /// Replace both the focused cell and the focus target.
    pub fn set(&mut self, cell: Option<FocusedCell>, target: FocusTarget) {
        self.cell = cell;
        self.target = target;
    }

    /// Move input focus without changing the logical cell.
    pub fn set_target(&mut self, target: FocusTarget) {
        self.target = target;
    }

    /// Called when a controller is destroyed; focus on it is lost.
    pub fn on_ctrl_destroyed(&mut self, ctrl: RowCtrlId) {
        if self.target.ctrl() == Some(ctrl) {
            self.target = FocusTarget::Outside;
        }
    }

    /// The cell worth restoring after a redraw, if focus is on a grid cell or
    /// row right now.
    pub fn cell_to_restore(&self) -> Option<FocusedCell> {
        self.target.ctrl().and(self.cell.clone())
    }
}
