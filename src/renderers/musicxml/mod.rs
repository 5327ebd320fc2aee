//! MusicXML export
//!
//! - **builder**: XML structure building (parts, measures, notes)
//! - **export**: walks a staff system tree and drives the builder

pub mod builder;
pub mod export;

pub use builder::{Attributes, MusicXmlBuilder, NoteSpec};
pub use export::{to_musicxml, DIVISIONS};
