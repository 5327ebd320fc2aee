//! Staff system layout metadata: rows, staff gap, name and connector

use super::StaffSystemEditor;
use crate::error::Result;
use crate::models::elements::ConnectorType;

impl StaffSystemEditor {
    /// Pull the first measure of the next row into the cursor row
    pub fn join(&mut self) -> Result<bool> {
        let row = self.cursor_row_index();
        self.edit("Join rows", |editor| {
            let mut metadata = editor.system_metadata();
            if row + 1 >= metadata.row_lengths.len() {
                return Ok(());
            }
            metadata.row_lengths[row] += 1;
            metadata.row_lengths[row + 1] -= 1;
            editor.write_system_metadata(metadata);
            Ok(())
        })
    }

    /// Push the last measure of the cursor row down into the next row
    pub fn break_row(&mut self) -> Result<bool> {
        let row = self.cursor_row_index();
        self.edit("Break row", |editor| {
            let mut metadata = editor.system_metadata();
            match metadata.row_lengths.get(row) {
                Some(len) if *len > 1 => {}
                _ => return Ok(()),
            }
            metadata.row_lengths[row] -= 1;
            match metadata.row_lengths.get_mut(row + 1) {
                Some(next) => *next += 1,
                None => metadata.row_lengths.push(1),
            }
            editor.write_system_metadata(metadata);
            Ok(())
        })
    }

    /// Change the gap between staves by `amount`; refused outside the limits
    pub fn shift_space_between_staves(&mut self, amount: i32) -> Result<bool> {
        let gap = self.system_metadata().gap.saturating_add(amount);
        if gap < self.config.min_staff_system_gap || gap > self.config.max_staff_system_gap {
            return Ok(false);
        }
        self.set_space_between_staves(gap)
    }

    /// Set the gap between staves, clamped to the configured limits
    pub fn set_space_between_staves(&mut self, gap: i32) -> Result<bool> {
        let gap = gap.clamp(
            self.config.min_staff_system_gap,
            self.config.max_staff_system_gap,
        );
        self.edit("Set staff gap", |editor| {
            let mut metadata = editor.system_metadata();
            metadata.gap = gap;
            editor.write_system_metadata(metadata);
            Ok(())
        })
    }

    /// Name the staff system; an empty name clears it
    pub fn set_staff_system_name(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        self.edit("Rename staff system", |editor| {
            let mut metadata = editor.system_metadata();
            metadata.name = (!name.is_empty()).then(|| name.to_string());
            editor.write_system_metadata(metadata);
            Ok(())
        })
    }

    pub fn set_staff_system_connector(&mut self, connector_type: ConnectorType) -> Result<bool> {
        self.edit("Set connector", |editor| {
            let mut metadata = editor.system_metadata();
            metadata.connector_type = connector_type;
            editor.write_system_metadata(metadata);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editor::tests::small_tree;
    use crate::models::metadata::StaffSystemMetadata;

    fn editor() -> StaffSystemEditor {
        StaffSystemEditor::new(small_tree(), EditorConfig::default()).unwrap()
    }

    fn metadata(editor: &StaffSystemEditor) -> StaffSystemMetadata {
        StaffSystemMetadata::parse(
            &editor.staff_system().metadata_json,
            editor.measure_count(),
            editor.config(),
        )
    }

    #[test]
    fn test_break_and_join_rows() {
        let mut editor = editor();
        assert_eq!(metadata(&editor).row_lengths, vec![2]);

        assert!(editor.break_row().unwrap());
        assert_eq!(metadata(&editor).row_lengths, vec![1, 1]);
        assert!(!editor.break_row().unwrap());

        assert!(editor.join().unwrap());
        assert_eq!(metadata(&editor).row_lengths, vec![2]);
        assert!(!editor.join().unwrap());
    }

    #[test]
    fn test_shift_space_between_staves() {
        let mut editor = editor();
        assert!(editor.shift_space_between_staves(4).unwrap());
        assert_eq!(metadata(&editor).gap, 16);
        assert!(!editor.shift_space_between_staves(100).unwrap());
        assert!(!editor.shift_space_between_staves(-13).unwrap());

        assert!(editor.set_space_between_staves(100).unwrap());
        assert_eq!(metadata(&editor).gap, 32);
    }

    #[test]
    fn test_name_and_connector() {
        let mut editor = editor();
        assert!(editor.set_staff_system_name(" Etude ").unwrap());
        assert!(editor.set_staff_system_connector(ConnectorType::Bracket).unwrap());
        let meta = metadata(&editor);
        assert_eq!(meta.name.as_deref(), Some("Etude"));
        assert_eq!(meta.connector_type, ConnectorType::Bracket);

        assert!(editor.set_staff_system_name("").unwrap());
        assert_eq!(metadata(&editor).name, None);
        assert!(editor.can_undo());
    }
}
