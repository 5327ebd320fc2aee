// Editing the sample score end to end: cursor moves, edits, history, export

use kme_wasm::config::EditorConfig;
use kme_wasm::editor::StaffSystemEditor;
use kme_wasm::models::cursor::Cursor;
use kme_wasm::models::elements::{Accidental, ConnectorType, StemType};
use kme_wasm::models::metadata::StaffSystemMetadata;
use kme_wasm::renderers::{to_lilypond, to_musicxml};
use kme_wasm::service::{build_sample_staff_system, ScoreService};

fn sample_editor(config: EditorConfig) -> (ScoreService, StaffSystemEditor) {
    let mut service = ScoreService::new();
    let id = build_sample_staff_system(&mut service).unwrap();
    let tree = service.to_dto(&id).unwrap();
    let editor = StaffSystemEditor::new(tree, config).unwrap();
    (service, editor)
}

fn first_staff_lilypond(editor: &StaffSystemEditor) -> String {
    let ly = to_lilypond(&editor.staff_system()).unwrap();
    ly.split("\\new Staff {").nth(1).unwrap().to_string()
}

#[test]
fn test_cursor_starts_on_first_note() {
    let (_, editor) = sample_editor(EditorConfig::default());
    let Cursor::Note(id) = editor.cursor() else {
        panic!("cursor should start on a note");
    };
    assert_eq!(id.position, 8);
    assert_eq!(id.chord_id.grouping_entry_id.index(), 0);
    assert_eq!(editor.cursor_row_index(), 0);
}

#[test]
fn test_walk_right_into_next_measure_and_down_a_staff() {
    let (_, mut editor) = sample_editor(EditorConfig::default());
    for _ in 0..4 {
        assert!(editor.move_cursor_right());
    }
    // the whole rest of the second measure
    assert!(!editor.cursor().is_note());
    assert_eq!(editor.cursor().grouping_entry_id().measure_id().index(), 1);

    assert!(editor.increase_cursor_staff());
    let entry = editor.cursor().grouping_entry_id();
    assert_eq!(entry.measure_id().staff_id.staves_order, 1);
    assert_eq!(entry.measure_id().index(), 1);
    assert!(!editor.increase_cursor_staff(), "there is no third staff");

    // navigation is not an edit
    assert!(!editor.can_undo());
}

#[test]
fn test_accidental_edit_and_undo() {
    let (_, mut editor) = sample_editor(EditorConfig::default());
    assert!(editor.move_cursor_right());
    assert!(editor.set_accidental(Accidental::Sharp).unwrap());
    assert!(first_staff_lilypond(&editor).contains("f4 eis,4 ees,4 ees,4"));

    assert!(editor.undo());
    assert!(first_staff_lilypond(&editor).contains("f4 ees,4 ees,4 ees,4"));
    assert!(editor.can_redo());

    assert!(editor.redo());
    assert!(first_staff_lilypond(&editor).contains("eis,4"));
}

#[test]
fn test_build_a_chord_and_change_its_length() {
    let (_, mut editor) = sample_editor(EditorConfig::default());
    assert!(editor.move_cursor_right());
    assert!(editor.insert_note_top().unwrap());
    assert!(editor.set_duration(StemType::Half).unwrap());

    assert!(first_staff_lilypond(&editor).contains("<ees, f,>2"));
    let xml = to_musicxml(&editor.staff_system()).unwrap();
    assert!(xml.contains("<chord/>"));
    assert!(xml.contains("<type>half</type>"));
}

#[test]
fn test_measure_limits() {
    let (_, mut editor) = sample_editor(EditorConfig::default());
    assert_eq!(editor.measure_count(), 4);
    for _ in 0..3 {
        assert!(editor.remove_measures().unwrap());
    }
    assert_eq!(editor.measure_count(), 1);
    assert!(!editor.remove_measures().unwrap(), "the last measure stays");

    assert!(editor.insert_measure(1).unwrap());
    let tree = editor.staff_system();
    assert!(tree.staves.iter().all(|staff| staff.measures.len() == 2));
    assert_eq!(tree.staves[0].measures[1].entry_count(), 1);
}

#[test]
fn test_staff_limit_from_yaml_config() {
    let config = EditorConfig::from_yaml("max_staves: 2\n").unwrap();
    let (_, mut editor) = sample_editor(config);
    assert!(!editor.insert_staff(2).unwrap());

    let config = EditorConfig::from_yaml("max_staves: 3\n").unwrap();
    let (_, mut editor) = sample_editor(config);
    assert!(editor.insert_staff(2).unwrap());
    assert_eq!(editor.staff_count(), 3);
    assert!(editor.delete_staff().is_ok());
}

#[test]
fn test_layout_metadata_survives_save() {
    let (mut service, mut editor) = sample_editor(EditorConfig::default());
    assert!(editor.set_staff_system_name("Sample").unwrap());
    assert!(editor.set_staff_system_connector(ConnectorType::Bracket).unwrap());
    assert!(editor.break_row().unwrap());

    let id = service.save_dto(&editor.staff_system()).unwrap();
    let stored = service.to_dto(&id).unwrap();
    let metadata = StaffSystemMetadata::parse(&stored.metadata_json, 4, editor.config());
    assert_eq!(metadata.name.as_deref(), Some("Sample"));
    assert_eq!(metadata.connector_type, ConnectorType::Bracket);
    assert_eq!(metadata.row_lengths, vec![2, 2]);
    assert!(metadata.cursor_id.is_some());

    let ly = to_lilypond(&stored).unwrap();
    assert!(ly.contains("\\new StaffGroup <<"));
    assert!(ly.contains("title = \"Sample\""));
}

#[test]
fn test_reopened_editor_restores_cursor() {
    let (mut service, mut editor) = sample_editor(EditorConfig::default());
    editor.move_cursor_right();
    editor.move_cursor_right();
    let cursor = editor.cursor();

    let id = service.save_dto(&editor.staff_system()).unwrap();
    let reopened = StaffSystemEditor::new(service.to_dto(&id).unwrap(), EditorConfig::default()).unwrap();
    assert_eq!(reopened.cursor(), cursor);
}
