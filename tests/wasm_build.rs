//! WASM build test
//!
//! Smoke tests of the JavaScript-facing API; they only build for wasm32.

#![cfg(target_arch = "wasm32")]

use kme_wasm::api::*;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn sample_id() -> String {
    let tree = get_sample_staff_system().unwrap();
    let tree = js_sys::JSON::stringify(&tree).unwrap().as_string().unwrap();
    let tree: kme_wasm::StaffSystemDto = serde_json::from_str(&tree).unwrap();
    tree.staff_system_id.to_string()
}

#[wasm_bindgen_test]
fn test_sample_is_stored() {
    let id = sample_id();
    assert!(get_staff_system(&id).is_ok());
    assert!(get_staff_system("not-a-uuid").is_err());
    assert!(export_musicxml("not-a-uuid").is_err());
    assert!(get_staff_system(&format!(" {} ", id)).is_ok());
}

#[wasm_bindgen_test]
fn test_exports() {
    let id = sample_id();
    let ly = export_lilypond(&id).unwrap();
    assert!(ly.contains("\\new PianoStaff"));
    let xml = export_musicxml(&id).unwrap();
    assert!(xml.contains("<score-partwise version=\"3.1\">"));
}

#[wasm_bindgen_test]
fn test_editor_round_trip() {
    let id = sample_id();
    let mut editor = ScoreEditor::open(&id).unwrap();
    assert!(editor.move_cursor_right());
    assert!(editor.set_accidental("Sharp").unwrap());
    assert!(editor.set_accidental("Sharpest").is_err());
    assert!(editor.can_undo());
    assert_eq!(editor.save().unwrap(), id);
    assert!(export_lilypond(&id).unwrap().contains("eis,4"));
}

#[wasm_bindgen_test]
fn test_editor_config() {
    assert!(set_editor_config("max_staves: 2\n").is_ok());
    assert!(get_editor_config().unwrap().contains("max_staves: 2"));
    assert!(set_editor_config("max_staves: [").is_err());
    assert!(set_editor_config("").is_ok());
}

#[wasm_bindgen_test]
fn test_create_and_delete() {
    let tree = create_staff_system("{\"name\":\"Empty\"}").unwrap();
    assert!(tree != JsValue::UNDEFINED);
    let all = find_all_staff_systems().unwrap();
    assert!(js_sys::Array::is_array(&all));
}
