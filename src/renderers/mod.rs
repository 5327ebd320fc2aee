//! Export of staff systems to notation formats
//!
//! Both exporters share the staff position to pitch rule in `pitch`.

pub mod lilypond;
pub mod musicxml;
pub mod pitch;

pub use lilypond::to_lilypond;
pub use musicxml::to_musicxml;
pub use pitch::Pitch;
