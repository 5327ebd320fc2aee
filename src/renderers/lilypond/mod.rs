//! LilyPond export
//!
//! Staves become `\new Staff` blocks inside a group chosen by the staff
//! system connector. Pitches are written in absolute mode.

pub mod export;
pub mod templates;

pub use export::to_lilypond;
