//! Stored records of the score hierarchy
//!
//! These are the flat rows kept by the store: each carries its own id and
//! attributes but no children. The nested view lives in `models::dto`.

use serde::{Deserialize, Serialize};

use super::elements::{Accidental, Clef, KeySignature, RestType, StemType, TimeSignature};
use super::ids::*;

/// A record addressable by a unique id
pub trait Entity {
    type Id: Ord + Copy + std::fmt::Debug;

    /// Human-readable kind name used in error messages
    const KIND: &'static str;

    fn id(&self) -> &Self::Id;
}

/// Top-level score document: an ordered collection of staves
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffSystem {
    pub id: StaffSystemId,
    #[serde(default)]
    pub metadata_json: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: StaffId,
    #[serde(default)]
    pub metadata_json: String,
}

/// A bar of music: clef, time signature and key signature ("armor")
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub id: MeasureId,
    pub key_signature: KeySignature,
    pub time_signature: TimeSignature,
    pub clef: Clef,
    #[serde(default)]
    pub metadata_json: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    pub id: VoiceId,
    #[serde(default)]
    pub metadata_json: String,
}

/// A beam group inside a voice
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Grouping {
    pub id: GroupingId,
    #[serde(default)]
    pub metadata_json: String,
}

/// One rhythmic slot of a grouping; a chord or a rest is stored under its id
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupingEntry {
    pub id: GroupingEntryId,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Stem {
    pub stem_type: StemType,
    #[serde(default)]
    pub metadata_json: String,
}

impl Stem {
    pub fn new(stem_type: StemType) -> Self {
        Self {
            stem_type,
            metadata_json: String::new(),
        }
    }
}

/// Notes sharing one stem
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chord {
    pub id: ChordId,
    pub stem: Stem,
    #[serde(default)]
    pub dot_count: u8,
    #[serde(default)]
    pub metadata_json: String,
}

/// A pitched event; its length is the stem type of the owning chord and its
/// vertical offset is `id.position`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub accidental: Accidental,
    #[serde(default)]
    pub metadata_json: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rest {
    pub id: RestId,
    pub rest_type: RestType,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub metadata_json: String,
}

macro_rules! entity {
    ($ty:ident, $id:ty) => {
        impl Entity for $ty {
            type Id = $id;
            const KIND: &'static str = stringify!($ty);

            fn id(&self) -> &$id {
                &self.id
            }
        }
    };
}

entity!(StaffSystem, StaffSystemId);
entity!(Staff, StaffId);
entity!(Measure, MeasureId);
entity!(Voice, VoiceId);
entity!(Grouping, GroupingId);
entity!(GroupingEntry, GroupingEntryId);
entity!(Chord, ChordId);
entity!(Note, NoteId);
entity!(Rest, RestId);
