//! Shared helpers for WASM API operations
//!
//! Logging macros, JS value conversion, enum argument parsing and error
//! conversion used by every API module.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::error::ScoreError;
use crate::models::ids::StaffSystemId;

// ============================================================================
// Logging Macros
// ============================================================================

/// Log a debug message with [WASM] prefix
#[macro_export]
macro_rules! wasm_log {
    ($($arg:tt)*) => {
        log::debug!("[WASM] {}", format!($($arg)*))
    };
}

/// Log an info message with [WASM] prefix
#[macro_export]
macro_rules! wasm_info {
    ($($arg:tt)*) => {
        log::info!("[WASM] {}", format!($($arg)*))
    };
}

/// Log a warning message with [WASM] ⚠️ prefix
#[macro_export]
macro_rules! wasm_warn {
    ($($arg:tt)*) => {
        log::warn!("[WASM] ⚠️ {}", format!($($arg)*))
    };
}

/// Log an error message with [WASM] ❌ prefix
#[macro_export]
macro_rules! wasm_error {
    ($($arg:tt)*) => {
        log::error!("[WASM] ❌ {}", format!($($arg)*))
    };
}

// ============================================================================
// Serialization/Deserialization Helpers
// ============================================================================

/// Deserialize a value from JavaScript with automatic error handling
pub fn deserialize<T: DeserializeOwned>(value: JsValue, error_context: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| {
        let msg = format!("{}: {}", error_context, e);
        wasm_error!("{}", msg);
        js_sys::Error::new(&msg).into()
    })
}

/// Serialize a value to JavaScript with automatic error handling
pub fn serialize<T: Serialize>(value: &T, error_context: &str) -> Result<JsValue, JsValue> {
    // maps become plain objects, not JS Maps
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).map_err(|e| {
        let msg = format!("{}: {}", error_context, e);
        wasm_error!("{}", msg);
        js_sys::Error::new(&msg).into()
    })
}

// ============================================================================
// Result Conversion Helpers
// ============================================================================

/// Log a score error and turn it into a JS `Error`
pub fn to_js_error(error: ScoreError) -> JsValue {
    wasm_error!("{}", error);
    js_sys::Error::new(&error.to_string()).into()
}

/// Parse an enum argument passed by variant name, e.g. `"Sharp"`
pub fn parse_enum<T>(name: &str) -> Result<T, JsValue>
where
    T: FromStr<Err = ScoreError>,
{
    name.parse().map_err(to_js_error)
}

/// Parse a staff system id passed as a UUID string
pub fn parse_staff_system_id(id: &str) -> Result<StaffSystemId, JsValue> {
    StaffSystemId::from_str(id).map_err(to_js_error)
}
