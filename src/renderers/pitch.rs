//! Staff position to sounding pitch
//!
//! A position counts diatonic steps on the staff. Under the treble clef
//! position 0 is middle C (C4); other clefs shift by `Clef::position_offset`.

use crate::models::elements::{Accidental, Clef, KeySignature};

const LETTERS: [char; 7] = ['c', 'd', 'e', 'f', 'g', 'a', 'b'];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pitch {
    /// Lowercase diatonic letter
    pub letter: char,
    /// Scientific octave; 4 holds middle C
    pub octave: i32,
    /// Semitones from the natural letter
    pub alter: i8,
}

impl Pitch {
    /// Resolve a note; an explicit accidental overrides the key signature
    pub fn resolve(position: i32, clef: Clef, key: KeySignature, accidental: Accidental) -> Self {
        let step = position + clef.position_offset();
        let letter = LETTERS[step.rem_euclid(7) as usize];
        Self {
            letter,
            octave: 4 + step.div_euclid(7),
            alter: accidental
                .alter()
                .unwrap_or_else(|| key.alteration_for(letter)),
        }
    }

    /// MusicXML `<step>`
    pub fn step(&self) -> char {
        self.letter.to_ascii_uppercase()
    }

    /// Absolute LilyPond pitch, e.g. `bes'` or `fis,,`
    pub fn lilypond(&self) -> String {
        let mut name = self.letter.to_string();
        let suffix = match self.alter {
            a if a <= -2 => "eses",
            -1 => "es",
            1 => "is",
            a if a >= 2 => "isis",
            _ => "",
        };
        name.push_str(suffix);
        // LilyPond's unmarked octave is the one below middle C
        let marks = self.octave - 3;
        let mark = if marks > 0 { '\'' } else { ',' };
        name.extend(std::iter::repeat(mark).take(marks.unsigned_abs() as usize));
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_treble_zero_is_middle_c() {
        let pitch = Pitch::resolve(0, Clef::Treble, KeySignature::None, Accidental::None);
        assert_eq!(pitch, Pitch { letter: 'c', octave: 4, alter: 0 });
        assert_eq!(pitch.lilypond(), "c'");
    }

    #[test]
    fn test_clef_offsets() {
        let bass = Pitch::resolve(0, Clef::Bass, KeySignature::None, Accidental::None);
        assert_eq!((bass.letter, bass.octave), ('e', 2));
        assert_eq!(bass.lilypond(), "e,");

        let alto = Pitch::resolve(0, Clef::Alto, KeySignature::None, Accidental::None);
        assert_eq!((alto.letter, alto.octave), ('d', 3));
        assert_eq!(alto.lilypond(), "d");
    }

    #[test]
    fn test_key_and_accidental() {
        // B flat major flattens b and e
        let b = Pitch::resolve(6, Clef::Treble, KeySignature::Flat2, Accidental::None);
        assert_eq!(b.lilypond(), "bes'");
        let natural = Pitch::resolve(6, Clef::Treble, KeySignature::Flat2, Accidental::Natural);
        assert_eq!(natural.lilypond(), "b'");
        let sharp = Pitch::resolve(7, Clef::Treble, KeySignature::None, Accidental::DoubleSharp);
        assert_eq!(sharp.lilypond(), "cisis''");
        assert_eq!(sharp.step(), 'C');
    }

    #[test]
    fn test_negative_positions() {
        let low = Pitch::resolve(-8, Clef::Treble, KeySignature::None, Accidental::None);
        assert_eq!((low.letter, low.octave), ('b', 2));
        assert_eq!(low.lilypond(), "b,");
    }
}
