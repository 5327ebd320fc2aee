//! Cursor-driven editing of a staff system tree
//!
//! The editor owns a `StaffSystemDto` and a cursor pointing at one note or
//! rest. Every operation returns `Ok(true)` when it changed something and
//! `Ok(false)` when the request was a no-op (a limit was reached, or the
//! cursor could not move).
//!
//! After each operation the editor "settles": the cursor is checked against
//! the tree, stored in the staff system metadata (`cursorId`), and the
//! highlight metadata of notes and rests is redrawn around it.

mod layout;
mod navigation;
mod operations;

use crate::config::EditorConfig;
use crate::error::{Result, ScoreError};
use crate::models::cursor::Cursor;
use crate::models::dto::*;
use crate::models::ids::{GroupingEntryId, MeasureId};
use crate::models::metadata::{HighlightMetadata, StaffSystemMetadata};
use crate::undo::{Edit, UndoStack};

pub struct StaffSystemEditor {
    staff_system: StaffSystemDto,
    cursor: Cursor,
    config: EditorConfig,
    history: UndoStack,
}

impl StaffSystemEditor {
    /// Take ownership of a tree and place the cursor.
    ///
    /// The tree is normalized first: empty entries are pruned, a measure
    /// without voices gets a whole rest, and an empty staff system gets one
    /// staff with one whole-rest measure.
    pub fn new(staff_system: StaffSystemDto, config: EditorConfig) -> Result<Self> {
        staff_system.validate()?;
        let mut staff_system = staff_system;
        normalize(&mut staff_system);

        let cursor = restore_cursor(&staff_system, &config)
            .ok_or_else(|| ScoreError::invalid("staff system has no grouping entries"))?;
        let history = UndoStack::new(config.undo_history);
        let mut editor = Self {
            staff_system,
            cursor,
            config,
            history,
        };
        editor.settle();
        log::debug!(
            "Editing staff system {} at {:?}",
            editor.staff_system.staff_system_id,
            editor.cursor
        );
        Ok(editor)
    }

    /// Copy of the current tree
    pub fn staff_system(&self) -> StaffSystemDto {
        self.staff_system.clone()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn measure_count(&self) -> usize {
        self.staff_system
            .staves
            .first()
            .map(|staff| staff.measures.len())
            .unwrap_or(0)
    }

    pub fn staff_count(&self) -> usize {
        self.staff_system.staves.len()
    }

    // ========================================================================
    // History
    // ========================================================================

    pub fn undo(&mut self) -> bool {
        let Some(tree) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(tree);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(tree) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(tree);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn restore(&mut self, tree: StaffSystemDto) {
        self.staff_system = tree;
        if let Some(cursor) = restore_cursor(&self.staff_system, &self.config) {
            self.cursor = cursor;
        }
        self.settle();
    }

    // ========================================================================
    // Operation plumbing
    // ========================================================================

    /// Run a tree edit, roll back on error, and record it when the tree changed
    fn edit<F>(&mut self, label: &str, op: F) -> Result<bool>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let before = self.staff_system.clone();
        let cursor = self.cursor;

        let outcome = op(self);
        let outcome = outcome.and_then(|_| self.staff_system.validate());
        if let Err(e) = outcome {
            log::warn!("{} failed: {}", label, e);
            self.staff_system = before;
            self.cursor = cursor;
            return Err(e);
        }

        self.settle();
        if self.staff_system == before {
            return Ok(false);
        }
        log::debug!("{}", label);
        self.history.push(Edit {
            label: label.to_string(),
            before,
            after: self.staff_system.clone(),
        });
        Ok(true)
    }

    /// Move the cursor to whatever `target` picks; navigation is not recorded
    fn navigate<F>(&mut self, target: F) -> bool
    where
        F: FnOnce(&Self) -> Option<Cursor>,
    {
        match target(self) {
            Some(cursor) if cursor != self.cursor => {
                self.cursor = cursor;
                self.settle();
                true
            }
            _ => false,
        }
    }

    /// Re-anchor the cursor, persist it and redraw highlights
    fn settle(&mut self) {
        if !cursor_exists(&self.staff_system, &self.cursor) {
            let measure_id = self.cursor.grouping_entry_id().measure_id();
            let fallback = self
                .staff_system
                .measure(&measure_id)
                .and_then(|measure| measure.first_entry())
                .and_then(cursor_on)
                .or_else(|| first_cursor(&self.staff_system));
            if let Some(cursor) = fallback {
                self.cursor = cursor;
            }
        }

        let mut metadata = self.system_metadata();
        let rows = metadata.row_lengths.clone();
        metadata.normalize_rows(self.measure_count());
        if metadata.cursor_id != Some(self.cursor) || metadata.row_lengths != rows {
            metadata.cursor_id = Some(self.cursor);
            self.staff_system.metadata_json = metadata.to_json();
        }
        self.redraw_highlight();
    }

    /// Highlight the cursor and its grouping; clear stale highlights elsewhere
    fn redraw_highlight(&mut self) {
        let cursor = self.cursor;
        let grouping_id = cursor.grouping_entry_id().grouping_id;
        let cursor_alpha = self.config.cursor_alpha.clone();
        let grouping_alpha = self.config.grouping_alpha.clone();

        let groupings = self
            .staff_system
            .staves
            .iter_mut()
            .flat_map(|staff| staff.measures.iter_mut())
            .flat_map(|measure| measure.voices.iter_mut())
            .flat_map(|voice| voice.groupings.iter_mut());
        for grouping in groupings {
            let in_grouping = grouping.grouping_id == grouping_id;
            for entry in grouping.grouping_entries.iter_mut() {
                if let Some(rest) = entry.rest.as_mut() {
                    let alpha = if !in_grouping {
                        None
                    } else if cursor == Cursor::Rest(rest.rest_id) {
                        Some(cursor_alpha.as_str())
                    } else {
                        Some(grouping_alpha.as_str())
                    };
                    set_highlight(&mut rest.metadata_json, alpha);
                }
                if let Some(chord) = entry.chord.as_mut() {
                    for note in chord.notes.iter_mut() {
                        let alpha = if !in_grouping {
                            None
                        } else if cursor == Cursor::Note(note.note_id) {
                            Some(cursor_alpha.as_str())
                        } else {
                            Some(grouping_alpha.as_str())
                        };
                        set_highlight(&mut note.metadata_json, alpha);
                    }
                }
            }
        }
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    fn system_metadata(&self) -> StaffSystemMetadata {
        StaffSystemMetadata::parse(
            &self.staff_system.metadata_json,
            self.measure_count(),
            &self.config,
        )
    }

    fn write_system_metadata(&mut self, mut metadata: StaffSystemMetadata) {
        metadata.normalize_rows(self.measure_count());
        self.staff_system.metadata_json = metadata.to_json();
    }

    fn cursor_entry_id(&self) -> GroupingEntryId {
        self.cursor.grouping_entry_id()
    }

    fn cursor_measure_id(&self) -> MeasureId {
        self.cursor.grouping_entry_id().measure_id()
    }

    fn cursor_entry(&self) -> Result<&GroupingEntryDto> {
        let id = self.cursor_entry_id();
        self.staff_system
            .grouping_entry(&id)
            .ok_or_else(|| ScoreError::not_found("GroupingEntry", id))
    }

    fn cursor_entry_mut(&mut self) -> Result<&mut GroupingEntryDto> {
        let id = self.cursor_entry_id();
        self.staff_system
            .grouping_entry_mut(&id)
            .ok_or_else(|| ScoreError::not_found("GroupingEntry", id))
    }

    fn cursor_measure_mut(&mut self) -> Result<&mut MeasureDto> {
        let id = self.cursor_measure_id();
        self.staff_system
            .measure_mut(&id)
            .ok_or_else(|| ScoreError::not_found("Measure", id))
    }
}

// ============================================================================
// Free helpers
// ============================================================================

/// Cursor on an entry: its rest, or the lowest note of its chord
fn cursor_on(entry: &GroupingEntryDto) -> Option<Cursor> {
    if let Some(rest) = &entry.rest {
        return Some(Cursor::Rest(rest.rest_id));
    }
    let note = entry.chord.as_ref()?.notes.first()?;
    Some(Cursor::Note(note.note_id))
}

fn cursor_exists(tree: &StaffSystemDto, cursor: &Cursor) -> bool {
    match cursor {
        Cursor::Note(id) => tree.note(id).is_some(),
        Cursor::Rest(id) => tree.rest(id).is_some(),
    }
}

fn first_cursor(tree: &StaffSystemDto) -> Option<Cursor> {
    tree.staves
        .first()?
        .measures
        .first()?
        .first_entry()
        .and_then(cursor_on)
}

/// The cursor stored in the metadata if it still points somewhere
fn restore_cursor(tree: &StaffSystemDto, config: &EditorConfig) -> Option<Cursor> {
    let measure_count = tree.measure_count().unwrap_or(0);
    StaffSystemMetadata::parse(&tree.metadata_json, measure_count, config)
        .cursor_id
        .filter(|cursor| cursor_exists(tree, cursor))
        .or_else(|| first_cursor(tree))
}

fn set_highlight(metadata_json: &mut String, alpha: Option<&str>) {
    let mut metadata = HighlightMetadata::parse(metadata_json);
    match alpha {
        Some(alpha) => {
            if metadata.highlight && metadata.alpha == alpha {
                return;
            }
            metadata.highlight = true;
            metadata.set_alpha(alpha);
        }
        None => {
            if !metadata.highlight {
                return;
            }
            metadata.highlight = false;
        }
    }
    *metadata_json = metadata.to_json();
}

/// Give every staff at least one measure and every measure at least one voice
fn normalize(tree: &mut StaffSystemDto) {
    tree.prune();
    if tree.staves.is_empty() {
        tree.staves.push(StaffDto {
            staff_id: tree.staff_system_id.staff(0),
            metadata_json: String::new(),
            measures: Vec::new(),
        });
    }
    if tree.staves.iter().all(|staff| staff.measures.is_empty()) {
        for staff in tree.staves.iter_mut() {
            staff.measures.push(MeasureDto::whole_rest(
                staff.staff_id.measure(0),
                Default::default(),
                Default::default(),
                Default::default(),
            ));
        }
    }
    for measure in tree
        .staves
        .iter_mut()
        .flat_map(|staff| staff.measures.iter_mut())
    {
        if measure.voices.is_empty() {
            measure
                .voices
                .push(VoiceDto::whole_rest(measure.measure_id.voice(0)));
        }
    }
    tree.sync_ids();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::elements::{RestType, StemType};
    use crate::models::ids::StaffSystemId;

    /// One staff, two measures: quarters at 0, 2, 4 then a whole rest
    pub(crate) fn small_tree() -> StaffSystemDto {
        let id = StaffSystemId::new();
        let mut tree = StaffSystemDto::new(id, "");
        let staff_id = id.staff(0);
        let mut first = MeasureDto::whole_rest(
            staff_id.measure(0),
            Default::default(),
            Default::default(),
            Default::default(),
        );
        let grouping = &mut first.voices[0].groupings[0];
        let grouping_id = grouping.grouping_id;
        grouping.grouping_entries = [0, 2, 4]
            .iter()
            .enumerate()
            .map(|(i, &p)| GroupingEntryDto::chord(grouping_id.entry(i as u32), StemType::Quarter, &[p]))
            .collect();
        let second = MeasureDto::whole_rest(
            staff_id.measure(1),
            Default::default(),
            Default::default(),
            Default::default(),
        );
        tree.staves.push(StaffDto {
            staff_id,
            metadata_json: String::new(),
            measures: vec![first, second],
        });
        tree
    }

    #[test]
    fn test_new_places_cursor_on_first_note() {
        let tree = small_tree();
        let first = tree.staves[0].measures[0].first_entry().unwrap().grouping_entry_id;
        let editor = StaffSystemEditor::new(tree, EditorConfig::default()).unwrap();

        assert_eq!(editor.cursor(), Cursor::Note(first.chord().note(0)));
        let metadata = StaffSystemMetadata::parse(
            &editor.staff_system().metadata_json,
            2,
            editor.config(),
        );
        assert_eq!(metadata.cursor_id, Some(editor.cursor()));
    }

    #[test]
    fn test_new_highlights_cursor_and_grouping() {
        let editor = StaffSystemEditor::new(small_tree(), EditorConfig::default()).unwrap();
        let tree = editor.staff_system();
        let grouping = &tree.staves[0].measures[0].voices[0].groupings[0];
        let alphas: Vec<_> = grouping
            .grouping_entries
            .iter()
            .map(|entry| HighlightMetadata::parse(&entry.chord.as_ref().unwrap().notes[0].metadata_json))
            .map(|meta| (meta.highlight, meta.alpha))
            .collect();
        assert_eq!(
            alphas,
            vec![
                (true, "ff".to_string()),
                (true, "32".to_string()),
                (true, "32".to_string())
            ]
        );

        let rest = tree.staves[0].measures[1].first_entry().unwrap().rest.as_ref().unwrap();
        assert!(!HighlightMetadata::parse(&rest.metadata_json).highlight);
    }

    #[test]
    fn test_new_restores_stored_cursor() {
        let tree = small_tree();
        let rest = tree.staves[0].measures[1].first_entry().unwrap().grouping_entry_id.rest();
        let mut tree = tree;
        tree.metadata_json = serde_json::json!({ "cursorId": Cursor::Rest(rest) }).to_string();

        let editor = StaffSystemEditor::new(tree, EditorConfig::default()).unwrap();
        assert_eq!(editor.cursor(), Cursor::Rest(rest));
    }

    #[test]
    fn test_new_fills_empty_staff_system() {
        let tree = StaffSystemDto::new(StaffSystemId::new(), "");
        let editor = StaffSystemEditor::new(tree, EditorConfig::default()).unwrap();
        let tree = editor.staff_system();

        assert_eq!(tree.staves.len(), 1);
        assert_eq!(tree.staves[0].measures.len(), 1);
        let rest = tree.staves[0].measures[0].first_entry().unwrap().rest.as_ref().unwrap();
        assert_eq!(rest.rest_type, RestType::Whole);
        assert!(matches!(editor.cursor(), Cursor::Rest(_)));
    }

    #[test]
    fn test_undo_redo_restore_tree() {
        let mut editor = StaffSystemEditor::new(small_tree(), EditorConfig::default()).unwrap();
        let before = editor.staff_system();
        assert!(!editor.can_undo());

        assert!(editor.insert_note_top().unwrap());
        let after = editor.staff_system();
        assert!(editor.can_undo());

        assert!(editor.undo());
        assert_eq!(editor.staff_system(), before);
        assert!(editor.can_redo());

        assert!(editor.redo());
        assert_eq!(editor.staff_system(), after);
        assert!(!editor.redo());
    }

    #[test]
    fn test_navigation_is_not_recorded() {
        let mut editor = StaffSystemEditor::new(small_tree(), EditorConfig::default()).unwrap();
        assert!(editor.move_cursor_right());
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_failed_edit_rolls_back() {
        let mut editor = StaffSystemEditor::new(small_tree(), EditorConfig::default()).unwrap();
        let before = editor.staff_system();
        let result = editor.edit("broken", |editor| {
            editor.staff_system.staves[0].measures.pop();
            Err(ScoreError::invalid("nope"))
        });
        assert!(result.is_err());
        assert_eq!(editor.staff_system(), before);
        assert!(!editor.can_undo());
    }
}
