use crate::models::dto::StaffSystemDto;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A recorded edit: the staff system before and after it was applied
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    /// Name of the editor operation, for display
    pub label: String,
    pub before: StaffSystemDto,
    pub after: StaffSystemDto,
}

/// Manages undo/redo history of staff system snapshots
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UndoStack {
    /// Edits in the order they were made
    pub edits: VecDeque<Edit>,
    /// Edits before this index are undoable, the rest redoable
    pub current_index: usize,
    /// Oldest edits are dropped past this
    max_size: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(100)
    }
}

impl UndoStack {
    /// Stack keeping at most `max_size` edits
    pub fn new(max_size: usize) -> Self {
        Self {
            edits: VecDeque::new(),
            current_index: 0,
            max_size: max_size.max(1),
        }
    }

    /// Record an edit. Anything that was undone is no longer redoable.
    pub fn push(&mut self, edit: Edit) {
        // Truncate any redo history when new edit is added
        self.edits.truncate(self.current_index);
        self.edits.push_back(edit);
        self.current_index = self.edits.len();

        // Enforce max size
        if self.edits.len() > self.max_size {
            self.edits.pop_front();
            self.current_index = self.current_index.saturating_sub(1);
        }
    }

    /// Step back one edit, returning the state to restore
    pub fn undo(&mut self) -> Option<&StaffSystemDto> {
        if !self.can_undo() {
            return None;
        }
        self.current_index -= 1;
        self.edits.get(self.current_index).map(|edit| &edit.before)
    }

    /// Re-apply the last undone edit, returning the state to restore
    pub fn redo(&mut self) -> Option<&StaffSystemDto> {
        if !self.can_redo() {
            return None;
        }
        self.current_index += 1;
        self.edits.get(self.current_index - 1).map(|edit| &edit.after)
    }

    /// Whether an edit is left to revert
    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    /// Whether an undone edit can be re-applied
    pub fn can_redo(&self) -> bool {
        self.current_index < self.edits.len()
    }

    /// Label of the edit `undo` would revert
    pub fn undo_label(&self) -> Option<&str> {
        self.current_index
            .checked_sub(1)
            .and_then(|index| self.edits.get(index))
            .map(|edit| edit.label.as_str())
    }

    /// Forget every recorded edit
    pub fn clear(&mut self) {
        self.edits.clear();
        self.current_index = 0;
    }

    pub fn undo_count(&self) -> usize {
        self.current_index
    }

    pub fn redo_count(&self) -> usize {
        self.edits.len() - self.current_index
    }
}
