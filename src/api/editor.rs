//! Editor operations for the WASM API
//!
//! `ScoreEditor` wraps a `StaffSystemEditor` for JavaScript. Edits return
//! `true` when the tree changed; enum arguments are passed by variant name.

use std::sync::Mutex;

use lazy_static::lazy_static;
use wasm_bindgen::prelude::*;

use crate::api::helpers::{deserialize, parse_enum, parse_staff_system_id, serialize, to_js_error};
use crate::api::staff_system::lock_service;
use crate::config::EditorConfig;
use crate::editor::StaffSystemEditor;
use crate::error::Result;
use crate::models::dto::StaffSystemDto;
use crate::{wasm_info, wasm_log, wasm_warn};

lazy_static! {
    static ref CONFIG: Mutex<EditorConfig> = Mutex::new(EditorConfig::default());
}

fn current_config() -> Result<EditorConfig, JsValue> {
    CONFIG
        .lock()
        .map(|config| config.clone())
        .map_err(|_| js_sys::Error::new("Editor config lock poisoned").into())
}

// ============================================================================
// Configuration
// ============================================================================

/// Replace the editor configuration used by editors opened afterwards
#[wasm_bindgen(js_name = setEditorConfig)]
pub fn set_editor_config(yaml: &str) -> Result<(), JsValue> {
    let config = EditorConfig::from_yaml(yaml).map_err(to_js_error)?;
    let mut current = CONFIG
        .lock()
        .map_err(|_| JsValue::from(js_sys::Error::new("Editor config lock poisoned")))?;
    *current = config;
    wasm_info!("setEditorConfig: max_staves={}, max_voices={}", current.max_staves, current.max_voices);
    Ok(())
}

/// Current editor configuration as YAML
#[wasm_bindgen(js_name = getEditorConfig)]
pub fn get_editor_config() -> Result<String, JsValue> {
    current_config()?.to_yaml().map_err(to_js_error)
}

// ============================================================================
// ScoreEditor
// ============================================================================

#[wasm_bindgen]
pub struct ScoreEditor {
    inner: StaffSystemEditor,
}

#[wasm_bindgen]
impl ScoreEditor {
    /// Open an editor on a stored staff system
    pub fn open(id: &str) -> Result<ScoreEditor, JsValue> {
        let id = parse_staff_system_id(id)?;
        let tree = lock_service()?.to_dto(&id).map_err(to_js_error)?;
        wasm_info!("ScoreEditor.open: {}", id);
        Self::with_tree(tree)
    }

    /// Open an editor on a tree that is not stored yet
    #[wasm_bindgen(js_name = fromTree)]
    pub fn from_tree(tree_js: JsValue) -> Result<ScoreEditor, JsValue> {
        let tree: StaffSystemDto = deserialize(tree_js, "Invalid staff system")?;
        Self::with_tree(tree)
    }

    #[wasm_bindgen(js_name = staffSystem)]
    pub fn staff_system(&self) -> Result<JsValue, JsValue> {
        serialize(&self.inner.staff_system(), "Failed to serialize staff system")
    }

    pub fn cursor(&self) -> Result<JsValue, JsValue> {
        serialize(&self.inner.cursor(), "Failed to serialize cursor")
    }

    /// Write the edited tree back to the store, returning its id
    pub fn save(&self) -> Result<String, JsValue> {
        let id = lock_service()?
            .save_dto(&self.inner.staff_system())
            .map_err(to_js_error)?;
        wasm_info!("ScoreEditor.save: {}", id);
        Ok(id.to_string())
    }

    #[wasm_bindgen(js_name = cursorRowIndex)]
    pub fn cursor_row_index(&self) -> usize {
        self.inner.cursor_row_index()
    }

    // ---- history ----

    pub fn undo(&mut self) -> bool {
        self.inner.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.inner.redo()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.inner.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.inner.can_redo()
    }

    // ---- navigation ----

    #[wasm_bindgen(js_name = moveCursorLeft)]
    pub fn move_cursor_left(&mut self) -> bool {
        self.inner.move_cursor_left()
    }

    #[wasm_bindgen(js_name = moveCursorRight)]
    pub fn move_cursor_right(&mut self) -> bool {
        self.inner.move_cursor_right()
    }

    #[wasm_bindgen(js_name = increaseCursorNote)]
    pub fn increase_cursor_note(&mut self) -> bool {
        self.inner.increase_cursor_note()
    }

    #[wasm_bindgen(js_name = decreaseCursorNote)]
    pub fn decrease_cursor_note(&mut self) -> bool {
        self.inner.decrease_cursor_note()
    }

    #[wasm_bindgen(js_name = increaseCursorVoice)]
    pub fn increase_cursor_voice(&mut self) -> bool {
        self.inner.increase_cursor_voice()
    }

    #[wasm_bindgen(js_name = decreaseCursorVoice)]
    pub fn decrease_cursor_voice(&mut self) -> bool {
        self.inner.decrease_cursor_voice()
    }

    #[wasm_bindgen(js_name = increaseCursorStaff)]
    pub fn increase_cursor_staff(&mut self) -> bool {
        self.inner.increase_cursor_staff()
    }

    #[wasm_bindgen(js_name = decreaseCursorStaff)]
    pub fn decrease_cursor_staff(&mut self) -> bool {
        self.inner.decrease_cursor_staff()
    }

    // ---- measures and staves ----

    #[wasm_bindgen(js_name = insertMeasure)]
    pub fn insert_measure(&mut self, index: usize) -> Result<bool, JsValue> {
        edited("insertMeasure", self.inner.insert_measure(index))
    }

    #[wasm_bindgen(js_name = removeMeasures)]
    pub fn remove_measures(&mut self) -> Result<bool, JsValue> {
        edited("removeMeasures", self.inner.remove_measures())
    }

    #[wasm_bindgen(js_name = swapMeasureLeft)]
    pub fn swap_measure_left(&mut self) -> Result<bool, JsValue> {
        edited("swapMeasureLeft", self.inner.swap_measure_left())
    }

    #[wasm_bindgen(js_name = swapMeasureRight)]
    pub fn swap_measure_right(&mut self) -> Result<bool, JsValue> {
        edited("swapMeasureRight", self.inner.swap_measure_right())
    }

    #[wasm_bindgen(js_name = insertStaff)]
    pub fn insert_staff(&mut self, index: usize) -> Result<bool, JsValue> {
        edited("insertStaff", self.inner.insert_staff(index))
    }

    #[wasm_bindgen(js_name = deleteStaff)]
    pub fn delete_staff(&mut self) -> Result<bool, JsValue> {
        edited("deleteStaff", self.inner.delete_staff())
    }

    #[wasm_bindgen(js_name = swapStaffUp)]
    pub fn swap_staff_up(&mut self) -> Result<bool, JsValue> {
        edited("swapStaffUp", self.inner.swap_staff_up())
    }

    #[wasm_bindgen(js_name = swapStaffDown)]
    pub fn swap_staff_down(&mut self) -> Result<bool, JsValue> {
        edited("swapStaffDown", self.inner.swap_staff_down())
    }

    #[wasm_bindgen(js_name = appendVoice)]
    pub fn append_voice(&mut self) -> Result<bool, JsValue> {
        edited("appendVoice", self.inner.append_voice())
    }

    // ---- notes ----

    #[wasm_bindgen(js_name = moveCursorPosition)]
    pub fn move_cursor_position(&mut self, delta: i32) -> Result<bool, JsValue> {
        edited("moveCursorPosition", self.inner.move_cursor_position(delta))
    }

    #[wasm_bindgen(js_name = insertNoteTop)]
    pub fn insert_note_top(&mut self) -> Result<bool, JsValue> {
        edited("insertNoteTop", self.inner.insert_note_top())
    }

    #[wasm_bindgen(js_name = insertNoteBottom)]
    pub fn insert_note_bottom(&mut self) -> Result<bool, JsValue> {
        edited("insertNoteBottom", self.inner.insert_note_bottom())
    }

    #[wasm_bindgen(js_name = insertNoteRelativeToCursor)]
    pub fn insert_note_relative_to_cursor(
        &mut self,
        offset: i32,
        keep_grouping: bool,
    ) -> Result<bool, JsValue> {
        edited(
            "insertNoteRelativeToCursor",
            self.inner.insert_note_relative_to_cursor(offset, keep_grouping),
        )
    }

    #[wasm_bindgen(js_name = deleteNote)]
    pub fn delete_note(&mut self) -> Result<bool, JsValue> {
        edited("deleteNote", self.inner.delete_note())
    }

    #[wasm_bindgen(js_name = toggleType)]
    pub fn toggle_type(&mut self) -> Result<bool, JsValue> {
        edited("toggleType", self.inner.toggle_type())
    }

    /// Set the cursor entry length, e.g. `"Eight"`
    #[wasm_bindgen(js_name = setDuration)]
    pub fn set_duration(&mut self, stem_type: &str) -> Result<bool, JsValue> {
        let stem_type = parse_enum(stem_type)?;
        edited("setDuration", self.inner.set_duration(stem_type))
    }

    #[wasm_bindgen(js_name = setAccidental)]
    pub fn set_accidental(&mut self, accidental: &str) -> Result<bool, JsValue> {
        let accidental = parse_enum(accidental)?;
        edited("setAccidental", self.inner.set_accidental(accidental))
    }

    // ---- groupings ----

    #[wasm_bindgen(js_name = splitGrouping)]
    pub fn split_grouping(&mut self) -> Result<bool, JsValue> {
        edited("splitGrouping", self.inner.split_grouping())
    }

    #[wasm_bindgen(js_name = mergeGrouping)]
    pub fn merge_grouping(&mut self) -> Result<bool, JsValue> {
        edited("mergeGrouping", self.inner.merge_grouping())
    }

    #[wasm_bindgen(js_name = toggleGroupStemDirection)]
    pub fn toggle_group_stem_direction(&mut self) -> Result<bool, JsValue> {
        edited("toggleGroupStemDirection", self.inner.toggle_group_stem_direction())
    }

    // ---- measure attributes ----

    #[wasm_bindgen(js_name = setClef)]
    pub fn set_clef(&mut self, clef: &str) -> Result<bool, JsValue> {
        let clef = parse_enum(clef)?;
        edited("setClef", self.inner.set_clef(clef))
    }

    #[wasm_bindgen(js_name = setKeySignature)]
    pub fn set_key_signature(&mut self, key_signature: &str) -> Result<bool, JsValue> {
        let key_signature = parse_enum(key_signature)?;
        edited("setKeySignature", self.inner.set_key_signature(key_signature))
    }

    #[wasm_bindgen(js_name = setTimeSignature)]
    pub fn set_time_signature(&mut self, time_signature: &str) -> Result<bool, JsValue> {
        let time_signature = parse_enum(time_signature)?;
        edited("setTimeSignature", self.inner.set_time_signature(time_signature))
    }

    // ---- layout ----

    pub fn join(&mut self) -> Result<bool, JsValue> {
        edited("join", self.inner.join())
    }

    #[wasm_bindgen(js_name = breakRow)]
    pub fn break_row(&mut self) -> Result<bool, JsValue> {
        edited("breakRow", self.inner.break_row())
    }

    #[wasm_bindgen(js_name = shiftSpaceBetweenStaves)]
    pub fn shift_space_between_staves(&mut self, amount: i32) -> Result<bool, JsValue> {
        edited("shiftSpaceBetweenStaves", self.inner.shift_space_between_staves(amount))
    }

    #[wasm_bindgen(js_name = setSpaceBetweenStaves)]
    pub fn set_space_between_staves(&mut self, gap: i32) -> Result<bool, JsValue> {
        edited("setSpaceBetweenStaves", self.inner.set_space_between_staves(gap))
    }

    #[wasm_bindgen(js_name = setStaffSystemName)]
    pub fn set_staff_system_name(&mut self, name: &str) -> Result<bool, JsValue> {
        edited("setStaffSystemName", self.inner.set_staff_system_name(name))
    }

    #[wasm_bindgen(js_name = setStaffSystemConnector)]
    pub fn set_staff_system_connector(&mut self, connector_type: &str) -> Result<bool, JsValue> {
        let connector_type = parse_enum(connector_type)?;
        edited(
            "setStaffSystemConnector",
            self.inner.set_staff_system_connector(connector_type),
        )
    }
}

impl ScoreEditor {
    fn with_tree(tree: StaffSystemDto) -> Result<ScoreEditor, JsValue> {
        let inner = StaffSystemEditor::new(tree, current_config()?).map_err(to_js_error)?;
        Ok(ScoreEditor { inner })
    }
}

/// Log the outcome of an edit and convert its error for JavaScript
fn edited(operation: &str, result: Result<bool>) -> Result<bool, JsValue> {
    match result {
        Ok(true) => {
            wasm_log!("{}: applied", operation);
            Ok(true)
        }
        Ok(false) => {
            wasm_warn!("{}: nothing to do", operation);
            Ok(false)
        }
        Err(e) => Err(to_js_error(e)),
    }
}
