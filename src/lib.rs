//! Score Editor WASM Module
//!
//! Core of a staff notation editor: the score store, the cursor-driven
//! editor and LilyPond/MusicXML export, exposed to JavaScript through `api`.

pub mod api;
pub mod config;
pub mod editor;
pub mod error;
pub mod models;
pub mod renderers;
pub mod repository;
pub mod service;
pub mod undo;

// Re-export commonly used types
pub use config::EditorConfig;
pub use editor::StaffSystemEditor;
pub use error::{Result, ScoreError};
pub use models::core::*;
pub use models::cursor::Cursor;
pub use models::dto::*;
pub use models::elements::*;
pub use models::ids::*;
pub use service::ScoreService;

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    if console_log::init_with_level(log::Level::Debug).is_err() {
        log::warn!("Logger already initialized");
    }

    log::info!("Score editor WASM module initialized");
}
