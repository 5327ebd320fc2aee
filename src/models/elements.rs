//! Enumerations for musical attributes
//!
//! Every enum is serialized by variant name (`"Sharp3"`, `"Treble"`, ...)
//! and can be parsed back from the same string, which is how the JS side
//! passes them in.

use std::fmt;
use std::str::FromStr;

use num_rational::Ratio;
use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// Generates `ALL`, `name()`, `Display` and `FromStr` from the variant list
macro_rules! variant_names {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn name(&self) -> &'static str {
                match self {
                    $($ty::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = ScoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok($ty::$variant),)+
                    _ => Err(ScoreError::Parse(format!(
                        "unknown {} '{}'",
                        stringify!($ty),
                        s
                    ))),
                }
            }
        }
    };
}

/// Key signature, from seven flats to seven sharps
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum KeySignature {
    Flat7,
    Flat6,
    Flat5,
    Flat4,
    Flat3,
    Flat2,
    Flat1,
    #[default]
    None,
    Sharp1,
    Sharp2,
    Sharp3,
    Sharp4,
    Sharp5,
    Sharp6,
    Sharp7,
}

variant_names!(KeySignature {
    Flat7, Flat6, Flat5, Flat4, Flat3, Flat2, Flat1, None,
    Sharp1, Sharp2, Sharp3, Sharp4, Sharp5, Sharp6, Sharp7,
});

/// Order in which sharps are added to a key signature
const SHARP_ORDER: [char; 7] = ['f', 'c', 'g', 'd', 'a', 'e', 'b'];
/// Order in which flats are added to a key signature
const FLAT_ORDER: [char; 7] = ['b', 'e', 'a', 'd', 'g', 'c', 'f'];

impl KeySignature {
    /// Signed number of accidentals: negative for flats, positive for sharps.
    /// This is also the circle-of-fifths position used by MusicXML.
    pub fn armor(&self) -> i8 {
        // Flat7 is variant 0, None is variant 7
        *self as i8 - 7
    }

    pub fn from_armor(armor: i8) -> Option<Self> {
        if !(-7..=7).contains(&armor) {
            return None;
        }
        Self::ALL.get((armor + 7) as usize).copied()
    }

    /// Alteration (in semitones) this key imposes on a diatonic letter
    pub fn alteration_for(&self, letter: char) -> i8 {
        let armor = self.armor();
        let count = armor.unsigned_abs() as usize;
        if armor > 0 && SHARP_ORDER[..count].contains(&letter) {
            1
        } else if armor < 0 && FLAT_ORDER[..count].contains(&letter) {
            -1
        } else {
            0
        }
    }

    /// Major-key tonic in LilyPond's dutch note names
    pub fn lilypond_name(&self) -> &'static str {
        match self {
            KeySignature::Flat7 => "ces",
            KeySignature::Flat6 => "ges",
            KeySignature::Flat5 => "des",
            KeySignature::Flat4 => "aes",
            KeySignature::Flat3 => "ees",
            KeySignature::Flat2 => "bes",
            KeySignature::Flat1 => "f",
            KeySignature::None => "c",
            KeySignature::Sharp1 => "g",
            KeySignature::Sharp2 => "d",
            KeySignature::Sharp3 => "a",
            KeySignature::Sharp4 => "e",
            KeySignature::Sharp5 => "b",
            KeySignature::Sharp6 => "fis",
            KeySignature::Sharp7 => "cis",
        }
    }
}

/// Time signature of a measure
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TimeSignature {
    Common,
    #[default]
    FourFour,
    ThreeFour,
    TwoFour,
}

variant_names!(TimeSignature { Common, FourFour, ThreeFour, TwoFour });

impl TimeSignature {
    pub fn beats(&self) -> u32 {
        match self {
            TimeSignature::Common | TimeSignature::FourFour => 4,
            TimeSignature::ThreeFour => 3,
            TimeSignature::TwoFour => 2,
        }
    }

    pub fn beat_unit(&self) -> u32 {
        4
    }

    /// Length of a full measure in whole notes
    pub fn measure_length(&self) -> Ratio<u32> {
        Ratio::new(self.beats(), self.beat_unit())
    }
}

/// Clef of a measure
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Clef {
    #[default]
    Treble,
    Alto,
    Bass,
}

variant_names!(Clef { Treble, Alto, Bass });

impl Clef {
    /// Diatonic steps between this clef's pitch at a staff position and the
    /// treble pitch at the same position.
    pub fn position_offset(&self) -> i32 {
        match self {
            Clef::Treble => 0,
            Clef::Alto => -6,
            Clef::Bass => -12,
        }
    }

    /// MusicXML `<sign>` and `<line>`
    pub fn sign(&self) -> (&'static str, u8) {
        match self {
            Clef::Treble => ("G", 2),
            Clef::Alto => ("C", 3),
            Clef::Bass => ("F", 4),
        }
    }

    pub fn lilypond_name(&self) -> &'static str {
        match self {
            Clef::Treble => "treble",
            Clef::Alto => "alto",
            Clef::Bass => "bass",
        }
    }
}

/// Accidental written on a note
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Accidental {
    DoubleFlat,
    Flat,
    #[default]
    None,
    Natural,
    Sharp,
    DoubleSharp,
}

variant_names!(Accidental { DoubleFlat, Flat, None, Natural, Sharp, DoubleSharp });

impl Accidental {
    /// Explicit alteration in semitones; `None` means "follow the key signature"
    pub fn alter(&self) -> Option<i8> {
        match self {
            Accidental::DoubleFlat => Some(-2),
            Accidental::Flat => Some(-1),
            Accidental::None => None,
            Accidental::Natural => Some(0),
            Accidental::Sharp => Some(1),
            Accidental::DoubleSharp => Some(2),
        }
    }

    /// MusicXML `<accidental>` value for explicit accidentals
    pub fn xml_name(&self) -> Option<&'static str> {
        match self {
            Accidental::DoubleFlat => Some("flat-flat"),
            Accidental::Flat => Some("flat"),
            Accidental::None => None,
            Accidental::Natural => Some("natural"),
            Accidental::Sharp => Some("sharp"),
            Accidental::DoubleSharp => Some("double-sharp"),
        }
    }
}

/// Note value of a chord stem
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum StemType {
    Whole,
    Half,
    #[default]
    Quarter,
    Eight,
    Sixteenth,
    Thirtysecond,
    Sixtyfourth,
}

variant_names!(StemType { Whole, Half, Quarter, Eight, Sixteenth, Thirtysecond, Sixtyfourth });

/// Note value of a rest
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RestType {
    Whole,
    Half,
    #[default]
    Quarter,
    Eight,
    Sixteenth,
    Thirtysecond,
    Sixtyfourth,
}

variant_names!(RestType { Whole, Half, Quarter, Eight, Sixteenth, Thirtysecond, Sixtyfourth });

/// Finest length a score may hold, as a fraction of a whole note
pub const DURATION_RESOLUTION: u32 = 256;

fn denominator_of(index: usize) -> u32 {
    1 << index
}

/// MusicXML `<type>` names, indexed like the note value enums
const XML_TYPES: [&str; 7] = ["whole", "half", "quarter", "eighth", "16th", "32nd", "64th"];

impl StemType {
    /// 1 for whole, 2 for half, ... 64 for sixty-fourth
    pub fn denominator(&self) -> u32 {
        denominator_of(*self as usize)
    }

    /// Undotted length in whole notes
    pub fn duration(&self) -> Ratio<u32> {
        Ratio::new(1, self.denominator())
    }

    /// Length with `dots` augmentation dots
    pub fn dotted_duration(&self, dots: u8) -> Ratio<u32> {
        let dots = dots.min(6) as u32;
        // d * (2 - 1/2^n) = d * (2^(n+1) - 1) / 2^n
        self.duration() * Ratio::new((1 << (dots + 1)) - 1, 1 << dots)
    }

    /// Whether the dotted length is a whole number of `DURATION_RESOLUTION` steps
    pub fn is_representable(&self, dots: u8) -> bool {
        (self.dotted_duration(dots) * Ratio::from_integer(DURATION_RESOLUTION)).is_integer()
    }

    /// Eighths and shorter carry flags and may be beamed
    pub fn is_beamable(&self) -> bool {
        *self as usize >= StemType::Eight as usize
    }

    pub fn xml_type(&self) -> &'static str {
        XML_TYPES[*self as usize]
    }
}

impl RestType {
    pub fn denominator(&self) -> u32 {
        denominator_of(*self as usize)
    }

    pub fn duration(&self) -> Ratio<u32> {
        Ratio::new(1, self.denominator())
    }

    pub fn xml_type(&self) -> &'static str {
        XML_TYPES[*self as usize]
    }
}

impl From<RestType> for StemType {
    fn from(rest_type: RestType) -> Self {
        StemType::ALL[rest_type as usize]
    }
}

impl From<StemType> for RestType {
    fn from(stem_type: StemType) -> Self {
        RestType::ALL[stem_type as usize]
    }
}

/// How the staves of a staff system are joined at the left edge
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ConnectorType {
    #[default]
    None,
    Brace,
    Bracket,
}

variant_names!(ConnectorType { None, Brace, Bracket });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_armor_round_trips_through_variants() {
        assert_eq!(KeySignature::Flat7.armor(), -7);
        assert_eq!(KeySignature::None.armor(), 0);
        assert_eq!(KeySignature::Sharp3.armor(), 3);
        assert_eq!(KeySignature::from_armor(-2), Some(KeySignature::Flat2));
        assert_eq!(KeySignature::from_armor(8), None);
    }

    #[test]
    fn test_key_signature_alterations() {
        // B flat major: b and e are flat
        assert_eq!(KeySignature::Flat2.alteration_for('b'), -1);
        assert_eq!(KeySignature::Flat2.alteration_for('e'), -1);
        assert_eq!(KeySignature::Flat2.alteration_for('a'), 0);
        // A major: f, c, g sharp
        assert_eq!(KeySignature::Sharp3.alteration_for('g'), 1);
        assert_eq!(KeySignature::Sharp3.alteration_for('d'), 0);
    }

    #[test]
    fn test_durations() {
        assert_eq!(StemType::Whole.duration(), Ratio::new(1, 1));
        assert_eq!(StemType::Sixtyfourth.duration(), Ratio::new(1, 64));
        assert_eq!(StemType::Quarter.dotted_duration(1), Ratio::new(3, 8));
        assert_eq!(StemType::Half.dotted_duration(2), Ratio::new(7, 8));
        assert_eq!(TimeSignature::ThreeFour.measure_length(), Ratio::new(3, 4));
    }

    #[test]
    fn test_representable_dots() {
        assert!(StemType::Quarter.is_representable(6));
        assert!(StemType::Sixtyfourth.is_representable(2));
        assert!(!StemType::Sixtyfourth.is_representable(3));
        assert!(StemType::Thirtysecond.is_representable(3));
        assert!(!StemType::Thirtysecond.is_representable(4));
    }

    #[test]
    fn test_stem_and_rest_types_convert() {
        assert_eq!(StemType::from(RestType::Sixteenth), StemType::Sixteenth);
        assert_eq!(RestType::from(StemType::Whole), RestType::Whole);
        assert!(StemType::Eight.is_beamable());
        assert!(!StemType::Quarter.is_beamable());
    }

    #[test]
    fn test_parse_by_variant_name() {
        assert_eq!("Bass".parse::<Clef>().unwrap(), Clef::Bass);
        assert_eq!("DoubleSharp".parse::<Accidental>().unwrap(), Accidental::DoubleSharp);
        assert!("bass".parse::<Clef>().is_err());
        assert_eq!(ConnectorType::Brace.to_string(), "Brace");
    }
}
