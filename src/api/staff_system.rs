//! Staff system storage operations for the WASM API
//!
//! The score store lives in WASM memory; JavaScript reads and writes whole
//! staff system trees by id.

use std::sync::{Mutex, MutexGuard};

use lazy_static::lazy_static;
use wasm_bindgen::prelude::*;

use crate::api::helpers::{deserialize, parse_staff_system_id, serialize, to_js_error};
use crate::models::dto::StaffSystemDto;
use crate::service::{build_sample_staff_system, ScoreService};
use crate::{wasm_info, wasm_log};

// WASM-owned score storage (canonical source of truth)
lazy_static! {
    static ref SERVICE: Mutex<ScoreService> = Mutex::new(ScoreService::new());
}

/// Lock the global score service
pub(crate) fn lock_service() -> Result<MutexGuard<'static, ScoreService>, JsValue> {
    SERVICE
        .lock()
        .map_err(|_| js_sys::Error::new("Score store lock poisoned").into())
}

/// Tree of one stored staff system
#[wasm_bindgen(js_name = getStaffSystem)]
pub fn get_staff_system(id: &str) -> Result<JsValue, JsValue> {
    wasm_log!("getStaffSystem called: {}", id);
    let id = parse_staff_system_id(id)?;
    let service = lock_service()?;
    let tree = service.to_dto(&id).map_err(to_js_error)?;
    serialize(&tree, "Failed to serialize staff system")
}

/// Store a tree, replacing the staff system with the same id.
///
/// # Returns
/// The staff system id
#[wasm_bindgen(js_name = setStaffSystem)]
pub fn set_staff_system(tree_js: JsValue) -> Result<String, JsValue> {
    let tree: StaffSystemDto = deserialize(tree_js, "Invalid staff system")?;
    let mut service = lock_service()?;
    let id = service.save_dto(&tree).map_err(to_js_error)?;
    wasm_info!("setStaffSystem stored {} ({} staves)", id, tree.staves.len());
    Ok(id.to_string())
}

#[wasm_bindgen(js_name = deleteStaffSystem)]
pub fn delete_staff_system(id: &str) -> Result<(), JsValue> {
    let id = parse_staff_system_id(id)?;
    let mut service = lock_service()?;
    service.delete_staff_system(&id).map_err(to_js_error)?;
    wasm_info!("deleteStaffSystem removed {}", id);
    Ok(())
}

/// Trees of every stored staff system
#[wasm_bindgen(js_name = findAllStaffSystems)]
pub fn find_all_staff_systems() -> Result<JsValue, JsValue> {
    let service = lock_service()?;
    let trees = service.find_all_dtos().map_err(to_js_error)?;
    wasm_log!("findAllStaffSystems: {} staff systems", trees.len());
    serialize(&trees, "Failed to serialize staff systems")
}

/// Build and store the sample score, returning its tree
#[wasm_bindgen(js_name = getSampleStaffSystem)]
pub fn get_sample_staff_system() -> Result<JsValue, JsValue> {
    let mut service = lock_service()?;
    let id = build_sample_staff_system(&mut service).map_err(to_js_error)?;
    let tree = service.to_dto(&id).map_err(to_js_error)?;
    wasm_info!("getSampleStaffSystem built {}", id);
    serialize(&tree, "Failed to serialize sample staff system")
}

/// Create an empty staff system, returning its tree
#[wasm_bindgen(js_name = createStaffSystem)]
pub fn create_staff_system(metadata_json: &str) -> Result<JsValue, JsValue> {
    let mut service = lock_service()?;
    let id = service.create_staff_system(metadata_json);
    let tree = service.to_dto(&id).map_err(to_js_error)?;
    wasm_info!("createStaffSystem created {}", id);
    serialize(&tree, "Failed to serialize staff system")
}
