//! Score editor WASM API
//!
//! The JavaScript-facing surface, organized by functional domain.
//!
//! # Module Structure
//!
//! - `helpers`: logging macros, JS value conversion and error conversion
//! - `staff_system`: the in-memory score store (get, set, delete, list, sample)
//! - `export`: LilyPond and MusicXML export of stored staff systems
//! - `editor`: the `ScoreEditor` class and the editor configuration

pub mod helpers;
pub mod staff_system;
pub mod export;
pub mod editor;

pub use staff_system::{
    create_staff_system, delete_staff_system, find_all_staff_systems, get_sample_staff_system,
    get_staff_system, set_staff_system,
};
pub use export::{export_lilypond, export_musicxml};
pub use editor::{get_editor_config, set_editor_config, ScoreEditor};
