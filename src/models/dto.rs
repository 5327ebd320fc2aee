//! Nested score tree exchanged with clients
//!
//! The tree mirrors the stored records with their children attached. Ids in
//! a tree are kept in step with list positions by `sync_ids`, which is what
//! lets the lookups below index straight into the vectors.

use num_rational::Ratio;
use serde::{Deserialize, Serialize};

use super::core::Stem;
use super::elements::{
    Accidental, Clef, KeySignature, RestType, StemType, TimeSignature, DURATION_RESOLUTION,
};
use super::ids::*;
use crate::error::{Result, ScoreError};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffSystemDto {
    pub staff_system_id: StaffSystemId,
    #[serde(default)]
    pub metadata_json: String,
    #[serde(default)]
    pub staves: Vec<StaffDto>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffDto {
    pub staff_id: StaffId,
    #[serde(default)]
    pub metadata_json: String,
    #[serde(default)]
    pub measures: Vec<MeasureDto>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeasureDto {
    pub measure_id: MeasureId,
    #[serde(default)]
    pub metadata_json: String,
    pub key_signature: KeySignature,
    pub time_signature: TimeSignature,
    pub clef: Clef,
    #[serde(default)]
    pub voices: Vec<VoiceDto>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDto {
    pub voice_id: VoiceId,
    #[serde(default)]
    pub metadata_json: String,
    #[serde(default)]
    pub groupings: Vec<GroupingDto>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupingDto {
    pub grouping_id: GroupingId,
    #[serde(default)]
    pub metadata_json: String,
    #[serde(default)]
    pub grouping_entries: Vec<GroupingEntryDto>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupingEntryDto {
    pub grouping_entry_id: GroupingEntryId,
    #[serde(default)]
    pub chord: Option<ChordDto>,
    #[serde(default)]
    pub rest: Option<RestDto>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChordDto {
    pub chord_id: ChordId,
    pub stem: StemDto,
    #[serde(default)]
    pub dot_count: u8,
    #[serde(default)]
    pub metadata_json: String,
    #[serde(default)]
    pub notes: Vec<NoteDto>,
}

pub type StemDto = Stem;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteDto {
    pub note_id: NoteId,
    pub accidental: Accidental,
    #[serde(default)]
    pub metadata_json: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestDto {
    pub rest_id: RestId,
    pub rest_type: RestType,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub metadata_json: String,
}

// ============================================================================
// Constructors
// ============================================================================

impl StaffSystemDto {
    pub fn new(staff_system_id: StaffSystemId, metadata_json: impl Into<String>) -> Self {
        Self {
            staff_system_id,
            metadata_json: metadata_json.into(),
            staves: Vec::new(),
        }
    }
}

impl MeasureDto {
    /// A measure holding one voice with a single whole rest
    pub fn whole_rest(
        measure_id: MeasureId,
        clef: Clef,
        key_signature: KeySignature,
        time_signature: TimeSignature,
    ) -> Self {
        let mut measure = Self {
            measure_id,
            metadata_json: String::new(),
            key_signature,
            time_signature,
            clef,
            voices: Vec::new(),
        };
        measure.voices.push(VoiceDto::whole_rest(measure_id.voice(0)));
        measure
    }

    /// Number of grouping entries across all voices
    pub fn entry_count(&self) -> usize {
        self.voices.iter().map(|voice| voice.entries().count()).sum()
    }

    pub fn first_entry(&self) -> Option<&GroupingEntryDto> {
        self.voices.first()?.entries().next()
    }

    pub fn last_entry_of_first_voice(&self) -> Option<&GroupingEntryDto> {
        self.voices.first()?.entries().last()
    }
}

impl VoiceDto {
    pub fn whole_rest(voice_id: VoiceId) -> Self {
        let grouping_id = voice_id.grouping(0);
        Self {
            voice_id,
            metadata_json: String::new(),
            groupings: vec![GroupingDto {
                grouping_id,
                metadata_json: String::new(),
                grouping_entries: vec![GroupingEntryDto::rest(
                    grouping_id.entry(0),
                    RestType::Whole,
                    0,
                )],
            }],
        }
    }

    /// Grouping entries of the voice in order, across groupings
    pub fn entries(&self) -> impl Iterator<Item = &GroupingEntryDto> + '_ {
        self.groupings
            .iter()
            .flat_map(|grouping| grouping.grouping_entries.iter())
    }

    /// Position of `entry` in `entries()`
    pub fn flat_index_of(&self, entry: &GroupingEntryId) -> Option<usize> {
        self.entries()
            .position(|candidate| candidate.grouping_entry_id == *entry)
    }
}

impl GroupingEntryDto {
    pub fn rest(grouping_entry_id: GroupingEntryId, rest_type: RestType, position: i32) -> Self {
        Self {
            grouping_entry_id,
            chord: None,
            rest: Some(RestDto {
                rest_id: grouping_entry_id.rest(),
                rest_type,
                position,
                metadata_json: String::new(),
            }),
        }
    }

    pub fn chord(grouping_entry_id: GroupingEntryId, stem_type: StemType, positions: &[i32]) -> Self {
        let chord_id = grouping_entry_id.chord();
        Self {
            grouping_entry_id,
            rest: None,
            chord: Some(ChordDto {
                chord_id,
                stem: Stem::new(stem_type),
                dot_count: 0,
                metadata_json: String::new(),
                notes: positions
                    .iter()
                    .map(|&position| NoteDto {
                        note_id: chord_id.note(position),
                        accidental: Accidental::None,
                        metadata_json: String::new(),
                    })
                    .collect(),
            }),
        }
    }

    /// True when the entry holds nothing that can be drawn
    pub fn is_empty(&self) -> bool {
        let has_notes = self
            .chord
            .as_ref()
            .map(|chord| !chord.notes.is_empty())
            .unwrap_or(false);
        !has_notes && self.rest.is_none()
    }

    /// Length of the entry in whole notes
    pub fn duration(&self) -> Ratio<u32> {
        if let Some(rest) = &self.rest {
            rest.rest_type.duration()
        } else if let Some(chord) = &self.chord {
            chord.stem.stem_type.dotted_duration(chord.dot_count)
        } else {
            Ratio::from_integer(0)
        }
    }
}

// ============================================================================
// Id synchronisation and pruning
// ============================================================================

impl StaffSystemDto {
    /// Rewrite every id from list positions and sort chord notes by position
    pub fn sync_ids(&mut self) {
        let staff_system_id = self.staff_system_id;
        for (index, staff) in self.staves.iter_mut().enumerate() {
            staff.sync_ids(staff_system_id.staff(index as u32));
        }
    }

    /// Drop empty grouping entries, groupings and voices, then resync ids
    pub fn prune(&mut self) {
        for measure in self.staves.iter_mut().flat_map(|s| s.measures.iter_mut()) {
            for voice in measure.voices.iter_mut() {
                for grouping in voice.groupings.iter_mut() {
                    grouping.grouping_entries.retain(|entry| !entry.is_empty());
                    for entry in grouping.grouping_entries.iter_mut() {
                        // the rest wins when both are present
                        if entry.rest.is_some() {
                            entry.chord = None;
                        }
                    }
                }
                voice
                    .groupings
                    .retain(|grouping| !grouping.grouping_entries.is_empty());
            }
            measure.voices.retain(|voice| !voice.groupings.is_empty());
        }
        self.sync_ids();
    }
}

impl StaffDto {
    fn sync_ids(&mut self, staff_id: StaffId) {
        self.staff_id = staff_id;
        for (index, measure) in self.measures.iter_mut().enumerate() {
            measure.sync_ids(staff_id.measure(index as u32));
        }
    }
}

impl MeasureDto {
    fn sync_ids(&mut self, measure_id: MeasureId) {
        self.measure_id = measure_id;
        for (index, voice) in self.voices.iter_mut().enumerate() {
            voice.sync_ids(measure_id.voice(index as u32));
        }
    }
}

impl VoiceDto {
    fn sync_ids(&mut self, voice_id: VoiceId) {
        self.voice_id = voice_id;
        for (index, grouping) in self.groupings.iter_mut().enumerate() {
            grouping.sync_ids(voice_id.grouping(index as u32));
        }
    }
}

impl GroupingDto {
    fn sync_ids(&mut self, grouping_id: GroupingId) {
        self.grouping_id = grouping_id;
        for (index, entry) in self.grouping_entries.iter_mut().enumerate() {
            entry.sync_ids(grouping_id.entry(index as u32));
        }
    }
}

impl GroupingEntryDto {
    fn sync_ids(&mut self, grouping_entry_id: GroupingEntryId) {
        self.grouping_entry_id = grouping_entry_id;
        if let Some(chord) = &mut self.chord {
            chord.chord_id = grouping_entry_id.chord();
            chord.notes.sort_by_key(|note| note.note_id.position);
            for note in chord.notes.iter_mut() {
                note.note_id = chord.chord_id.note(note.note_id.position);
            }
        }
        if let Some(rest) = &mut self.rest {
            rest.rest_id = grouping_entry_id.rest();
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

impl StaffSystemDto {
    /// Number of measures per staff; all staves must agree
    pub fn measure_count(&self) -> Result<usize> {
        let Some(first) = self.staves.first() else {
            return Ok(0);
        };
        let count = first.measures.len();
        if self.staves.iter().any(|staff| staff.measures.len() != count) {
            return Err(ScoreError::invalid(
                "All staves must have the same number of measures",
            ));
        }
        Ok(count)
    }

    /// Check the structural invariants that ids cannot repair
    pub fn validate(&self) -> Result<()> {
        self.measure_count()?;
        for staff in &self.staves {
            for measure in &staff.measures {
                for voice in &measure.voices {
                    for entry in voice.entries() {
                        entry.validate()?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl GroupingEntryDto {
    fn validate(&self) -> Result<()> {
        match (&self.chord, &self.rest) {
            (Some(_), Some(_)) => {
                return Err(ScoreError::invalid(format!(
                    "Grouping entry {:?} holds both a chord and a rest",
                    self.grouping_entry_id
                )))
            }
            (None, None) => {
                return Err(ScoreError::invalid(format!(
                    "Grouping entry {:?} is empty",
                    self.grouping_entry_id
                )))
            }
            _ => {}
        }
        if let Some(chord) = &self.chord {
            if !chord.stem.stem_type.is_representable(chord.dot_count) {
                return Err(ScoreError::invalid(format!(
                    "Chord {:?}: {} with {} dots is shorter than a {}th note",
                    chord.chord_id, chord.stem.stem_type, chord.dot_count, DURATION_RESOLUTION
                )));
            }
            let mut positions: Vec<i32> = chord.notes.iter().map(|n| n.note_id.position).collect();
            positions.sort_unstable();
            if let Some(pair) = positions.windows(2).find(|pair| pair[0] == pair[1]) {
                return Err(ScoreError::PositionOccupied {
                    chord: format!("{:?}", chord.chord_id),
                    position: pair[0],
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Lookups
// ============================================================================

impl StaffSystemDto {
    pub fn staff(&self, id: &StaffId) -> Option<&StaffDto> {
        if id.staff_system_id != self.staff_system_id {
            return None;
        }
        self.staves.get(id.index())
    }

    pub fn staff_mut(&mut self, id: &StaffId) -> Option<&mut StaffDto> {
        if id.staff_system_id != self.staff_system_id {
            return None;
        }
        self.staves.get_mut(id.index())
    }

    pub fn measure(&self, id: &MeasureId) -> Option<&MeasureDto> {
        self.staff(&id.staff_id)?.measures.get(id.index())
    }

    pub fn measure_mut(&mut self, id: &MeasureId) -> Option<&mut MeasureDto> {
        self.staff_mut(&id.staff_id)?.measures.get_mut(id.index())
    }

    pub fn voice(&self, id: &VoiceId) -> Option<&VoiceDto> {
        self.measure(&id.measure_id)?.voices.get(id.index())
    }

    pub fn voice_mut(&mut self, id: &VoiceId) -> Option<&mut VoiceDto> {
        self.measure_mut(&id.measure_id)?.voices.get_mut(id.index())
    }

    pub fn grouping(&self, id: &GroupingId) -> Option<&GroupingDto> {
        self.voice(&id.voice_id)?.groupings.get(id.index())
    }

    pub fn grouping_mut(&mut self, id: &GroupingId) -> Option<&mut GroupingDto> {
        self.voice_mut(&id.voice_id)?.groupings.get_mut(id.index())
    }

    pub fn grouping_entry(&self, id: &GroupingEntryId) -> Option<&GroupingEntryDto> {
        self.grouping(&id.grouping_id)?.grouping_entries.get(id.index())
    }

    pub fn grouping_entry_mut(&mut self, id: &GroupingEntryId) -> Option<&mut GroupingEntryDto> {
        self.grouping_mut(&id.grouping_id)?
            .grouping_entries
            .get_mut(id.index())
    }

    pub fn chord(&self, id: &ChordId) -> Option<&ChordDto> {
        self.grouping_entry(&id.grouping_entry_id)?.chord.as_ref()
    }

    pub fn chord_mut(&mut self, id: &ChordId) -> Option<&mut ChordDto> {
        self.grouping_entry_mut(&id.grouping_entry_id)?.chord.as_mut()
    }

    pub fn rest(&self, id: &RestId) -> Option<&RestDto> {
        self.grouping_entry(&id.grouping_entry_id)?.rest.as_ref()
    }

    pub fn rest_mut(&mut self, id: &RestId) -> Option<&mut RestDto> {
        self.grouping_entry_mut(&id.grouping_entry_id)?.rest.as_mut()
    }

    pub fn note(&self, id: &NoteId) -> Option<&NoteDto> {
        self.chord(&id.chord_id)?
            .notes
            .iter()
            .find(|note| note.note_id.position == id.position)
    }

    pub fn note_mut(&mut self, id: &NoteId) -> Option<&mut NoteDto> {
        self.chord_mut(&id.chord_id)?
            .notes
            .iter_mut()
            .find(|note| note.note_id.position == id.position)
    }

    /// Every measure of every staff, staff by staff
    pub fn measures(&self) -> impl Iterator<Item = &MeasureDto> + '_ {
        self.staves.iter().flat_map(|staff| staff.measures.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_entry_tree() -> StaffSystemDto {
        let id = StaffSystemId::new();
        let mut tree = StaffSystemDto::new(id, "");
        let measure_id = id.staff(0).measure(0);
        let mut measure =
            MeasureDto::whole_rest(measure_id, Clef::Treble, KeySignature::None, TimeSignature::FourFour);
        measure.voices[0].groupings[0]
            .grouping_entries
            .push(GroupingEntryDto::chord(measure_id.voice(0).grouping(0).entry(1), StemType::Quarter, &[4, 0]));
        tree.staves.push(StaffDto {
            staff_id: id.staff(0),
            metadata_json: String::new(),
            measures: vec![measure],
        });
        tree
    }

    #[test]
    fn test_sync_ids_sorts_notes_and_renumbers() {
        let mut tree = two_entry_tree();
        let grouping = &mut tree.staves[0].measures[0].voices[0].groupings[0];
        grouping.grouping_entries.swap(0, 1);
        tree.sync_ids();

        let entry = &tree.staves[0].measures[0].voices[0].groupings[0].grouping_entries[0];
        let chord = entry.chord.as_ref().unwrap();
        assert_eq!(entry.grouping_entry_id.index(), 0);
        assert_eq!(chord.chord_id.grouping_entry_id, entry.grouping_entry_id);
        let positions: Vec<i32> = chord.notes.iter().map(|n| n.note_id.position).collect();
        assert_eq!(positions, vec![0, 4]);
    }

    #[test]
    fn test_prune_removes_empty_entries() {
        let mut tree = two_entry_tree();
        tree.staves[0].measures[0].voices[0].groupings[0].grouping_entries[1]
            .chord
            .as_mut()
            .unwrap()
            .notes
            .clear();
        tree.prune();
        assert_eq!(tree.staves[0].measures[0].entry_count(), 1);
    }

    #[test]
    fn test_validate_rejects_duplicate_positions() {
        let mut tree = two_entry_tree();
        let chord = tree.staves[0].measures[0].voices[0].groupings[0].grouping_entries[1]
            .chord
            .as_mut()
            .unwrap();
        chord.notes[1].note_id.position = 4;
        assert!(matches!(
            tree.validate(),
            Err(ScoreError::PositionOccupied { position: 4, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unrepresentable_dots() {
        let mut tree = two_entry_tree();
        let chord = tree.staves[0].measures[0].voices[0].groupings[0].grouping_entries[1]
            .chord
            .as_mut()
            .unwrap();
        chord.stem.stem_type = StemType::Sixtyfourth;
        chord.dot_count = 2;
        assert!(tree.validate().is_ok());

        let chord = tree.staves[0].measures[0].voices[0].groupings[0].grouping_entries[1]
            .chord
            .as_mut()
            .unwrap();
        chord.dot_count = 3;
        assert!(matches!(tree.validate(), Err(ScoreError::InvalidScore(_))));
    }

    #[test]
    fn test_lookup_by_id() {
        let tree = two_entry_tree();
        let entry_id = tree.staff_system_id.staff(0).measure(0).voice(0).grouping(0).entry(1);
        assert!(tree.chord(&entry_id.chord()).is_some());
        assert!(tree.rest(&entry_id.rest()).is_none());
        assert!(tree.note(&entry_id.chord().note(4)).is_some());
        assert!(tree.measure(&StaffSystemId::new().staff(0).measure(0)).is_none());
    }

    #[test]
    fn test_entry_duration() {
        let tree = two_entry_tree();
        let voice = &tree.staves[0].measures[0].voices[0];
        let total: Ratio<u32> = voice.entries().map(|e| e.duration()).sum();
        assert_eq!(total, Ratio::new(5, 4));
    }
}
