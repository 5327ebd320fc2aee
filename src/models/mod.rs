//! Models module for the score editor
//!
//! This module contains the score hierarchy in its two shapes: flat stored
//! records (`core`) and the nested tree exchanged with clients (`dto`).

pub mod core;
pub mod cursor;
pub mod dto;
pub mod elements;
pub mod ids;
pub mod metadata;

// Re-export commonly used types
pub use self::core::*;
pub use cursor::Cursor;
pub use dto::*;
pub use elements::*;
pub use ids::*;
pub use metadata::{
    GroupingMetadata, HighlightMetadata, MeasureMetadata, NoteMetadata, RestMetadata,
    StaffMetadata, StaffSystemMetadata,
};
