//! Export operations for the WASM API
//!
//! - LilyPond: engraving source for a stored staff system
//! - MusicXML: interchange format for a stored staff system

use wasm_bindgen::prelude::*;

use crate::api::helpers::{parse_staff_system_id, to_js_error};
use crate::api::staff_system::lock_service;
use crate::renderers::{to_lilypond, to_musicxml};
use crate::wasm_info;

// ============================================================================
// LilyPond Export
// ============================================================================

/// Export a stored staff system as LilyPond source
#[wasm_bindgen(js_name = exportLilyPond)]
pub fn export_lilypond(id: &str) -> Result<String, JsValue> {
    let id = parse_staff_system_id(id)?;
    let service = lock_service()?;
    let tree = service.to_dto(&id).map_err(to_js_error)?;
    let lilypond = to_lilypond(&tree).map_err(to_js_error)?;
    wasm_info!("exportLilyPond: {} bytes", lilypond.len());
    Ok(lilypond)
}

// ============================================================================
// MusicXML Export
// ============================================================================

/// Export a stored staff system as MusicXML 3.1
#[wasm_bindgen(js_name = exportMusicXML)]
pub fn export_musicxml(id: &str) -> Result<String, JsValue> {
    let id = parse_staff_system_id(id)?;
    let service = lock_service()?;
    let tree = service.to_dto(&id).map_err(to_js_error)?;
    let musicxml = to_musicxml(&tree).map_err(to_js_error)?;
    wasm_info!("exportMusicXML: {} bytes", musicxml.len());
    Ok(musicxml)
}
