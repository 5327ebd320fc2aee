//! Score services over the record store
//!
//! `ScoreService` owns a `ScoreStore` and provides the operations the rest of
//! the crate builds on: upserts and lookups per record kind, appends that
//! assign the next order index under a parent, child listings, and cascading
//! deletes that keep sibling orders contiguous.

pub mod builder;
pub mod converter;
pub mod sample;

pub use builder::ScoreBuilder;
pub use sample::build_sample_staff_system;

use crate::error::{Result, ScoreError};
use crate::models::core::*;
use crate::models::dto::StaffSystemDto;
use crate::models::elements::{Accidental, Clef, KeySignature, RestType, TimeSignature};
use crate::models::ids::*;
use crate::repository::{Repository, ScoreStore};

#[derive(Clone, Debug, Default)]
pub struct ScoreService {
    store: ScoreStore,
}

/// Generates `save_*`, `find_*_by_id` and `exists_*` for one record kind
macro_rules! record_access {
    ($table:ident, $entity:ty, $id:ty, $save:ident, $find:ident, $exists:ident) => {
        /// Insert or replace the record
        pub fn $save(&mut self, record: $entity) -> $id {
            self.store.$table.add(record)
        }

        pub fn $find(&self, id: &$id) -> Option<&$entity> {
            self.store.$table.get(id)
        }

        pub fn $exists(&self, id: &$id) -> bool {
            self.store.$table.exists(id)
        }
    };
}

impl ScoreService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &ScoreStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut ScoreStore {
        &mut self.store
    }

    record_access!(staff_systems, StaffSystem, StaffSystemId, save_staff_system, find_staff_system_by_id, exists_staff_system);
    record_access!(staves, Staff, StaffId, save_staff, find_staff_by_id, exists_staff);
    record_access!(measures, Measure, MeasureId, save_measure, find_measure_by_id, exists_measure);
    record_access!(voices, Voice, VoiceId, save_voice, find_voice_by_id, exists_voice);
    record_access!(groupings, Grouping, GroupingId, save_grouping, find_grouping_by_id, exists_grouping);
    record_access!(grouping_entries, GroupingEntry, GroupingEntryId, save_grouping_entry, find_grouping_entry_by_id, exists_grouping_entry);
    record_access!(chords, Chord, ChordId, save_chord, find_chord_by_id, exists_chord);
    record_access!(rests, Rest, RestId, save_rest, find_rest_by_id, exists_rest);
    record_access!(notes, Note, NoteId, save_note, find_note_by_id, exists_note);

    pub fn find_all_staff_systems(&self) -> Vec<&StaffSystem> {
        self.store.staff_systems.get_all()
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Create an empty staff system under a fresh id
    pub fn create_staff_system(&mut self, metadata_json: impl Into<String>) -> StaffSystemId {
        let id = StaffSystemId::new();
        self.store.staff_systems.add(StaffSystem {
            id,
            metadata_json: metadata_json.into(),
        });
        log::debug!("Created staff system {}", id);
        id
    }

    pub fn append_staff(
        &mut self,
        staff_system_id: &StaffSystemId,
        metadata_json: impl Into<String>,
    ) -> Result<StaffId> {
        let order = self.count_staves(staff_system_id)?;
        let id = staff_system_id.staff(order as u32);
        self.store.staves.add(Staff {
            id,
            metadata_json: metadata_json.into(),
        });
        Ok(id)
    }

    pub fn append_measure(
        &mut self,
        staff_id: &StaffId,
        key_signature: KeySignature,
        time_signature: TimeSignature,
        clef: Clef,
        metadata_json: impl Into<String>,
    ) -> Result<MeasureId> {
        let order = self.count_measures(staff_id)?;
        let id = staff_id.measure(order as u32);
        self.store.measures.add(Measure {
            id,
            key_signature,
            time_signature,
            clef,
            metadata_json: metadata_json.into(),
        });
        Ok(id)
    }

    pub fn append_voice(
        &mut self,
        measure_id: &MeasureId,
        metadata_json: impl Into<String>,
    ) -> Result<VoiceId> {
        let order = self.count_voices(measure_id)?;
        let id = measure_id.voice(order as u32);
        self.store.voices.add(Voice {
            id,
            metadata_json: metadata_json.into(),
        });
        Ok(id)
    }

    pub fn append_grouping(
        &mut self,
        voice_id: &VoiceId,
        metadata_json: impl Into<String>,
    ) -> Result<GroupingId> {
        let order = self.count_groupings(voice_id)?;
        let id = voice_id.grouping(order as u32);
        self.store.groupings.add(Grouping {
            id,
            metadata_json: metadata_json.into(),
        });
        Ok(id)
    }

    fn append_grouping_entry(&mut self, grouping_id: &GroupingId) -> Result<GroupingEntryId> {
        let order = self.count_grouping_entries(grouping_id)?;
        let id = grouping_id.entry(order as u32);
        self.store.grouping_entries.add(GroupingEntry { id });
        Ok(id)
    }

    /// Append a chord in a new grouping entry at the end of the grouping
    pub fn append_chord(
        &mut self,
        grouping_id: &GroupingId,
        stem: Stem,
        dot_count: u8,
        metadata_json: impl Into<String>,
    ) -> Result<ChordId> {
        let id = self.append_grouping_entry(grouping_id)?.chord();
        self.store.chords.add(Chord {
            id,
            stem,
            dot_count,
            metadata_json: metadata_json.into(),
        });
        Ok(id)
    }

    /// Append a rest in a new grouping entry at the end of the grouping
    pub fn append_rest(
        &mut self,
        grouping_id: &GroupingId,
        rest_type: RestType,
        position: i32,
        metadata_json: impl Into<String>,
    ) -> Result<RestId> {
        let id = self.append_grouping_entry(grouping_id)?.rest();
        self.store.rests.add(Rest {
            id,
            rest_type,
            position,
            metadata_json: metadata_json.into(),
        });
        Ok(id)
    }

    /// Add a note to a chord. Notes are keyed by position, so a position can
    /// hold only one note.
    pub fn insert_note(
        &mut self,
        chord_id: &ChordId,
        position: i32,
        accidental: Accidental,
        metadata_json: impl Into<String>,
    ) -> Result<NoteId> {
        if !self.exists_chord(chord_id) {
            return Err(ScoreError::not_found(Chord::KIND, chord_id));
        }
        let id = chord_id.note(position);
        if self.exists_note(&id) {
            return Err(ScoreError::PositionOccupied {
                chord: format!("{:?}", chord_id),
                position,
            });
        }
        self.store.notes.add(Note {
            id,
            accidental,
            metadata_json: metadata_json.into(),
        });
        Ok(id)
    }

    // ========================================================================
    // Children
    // ========================================================================

    fn require<E: Entity>(&self, found: bool, id: &E::Id) -> Result<()> {
        if found {
            Ok(())
        } else {
            Err(ScoreError::not_found(E::KIND, id))
        }
    }

    pub fn staves_of(&self, id: &StaffSystemId) -> Result<Vec<&Staff>> {
        self.require::<StaffSystem>(self.exists_staff_system(id), id)?;
        Ok(self.store.staves.children(*id))
    }

    pub fn count_staves(&self, id: &StaffSystemId) -> Result<usize> {
        self.require::<StaffSystem>(self.exists_staff_system(id), id)?;
        Ok(self.store.staves.count_children(*id))
    }

    pub fn measures_of(&self, id: &StaffId) -> Result<Vec<&Measure>> {
        self.require::<Staff>(self.exists_staff(id), id)?;
        Ok(self.store.measures.children(*id))
    }

    pub fn count_measures(&self, id: &StaffId) -> Result<usize> {
        self.require::<Staff>(self.exists_staff(id), id)?;
        Ok(self.store.measures.count_children(*id))
    }

    pub fn voices_of(&self, id: &MeasureId) -> Result<Vec<&Voice>> {
        self.require::<Measure>(self.exists_measure(id), id)?;
        Ok(self.store.voices.children(*id))
    }

    pub fn count_voices(&self, id: &MeasureId) -> Result<usize> {
        self.require::<Measure>(self.exists_measure(id), id)?;
        Ok(self.store.voices.count_children(*id))
    }

    pub fn groupings_of(&self, id: &VoiceId) -> Result<Vec<&Grouping>> {
        self.require::<Voice>(self.exists_voice(id), id)?;
        Ok(self.store.groupings.children(*id))
    }

    pub fn count_groupings(&self, id: &VoiceId) -> Result<usize> {
        self.require::<Voice>(self.exists_voice(id), id)?;
        Ok(self.store.groupings.count_children(*id))
    }

    pub fn grouping_entries_of(&self, id: &GroupingId) -> Result<Vec<&GroupingEntry>> {
        self.require::<Grouping>(self.exists_grouping(id), id)?;
        Ok(self.store.grouping_entries.children(*id))
    }

    pub fn count_grouping_entries(&self, id: &GroupingId) -> Result<usize> {
        self.require::<Grouping>(self.exists_grouping(id), id)?;
        Ok(self.store.grouping_entries.count_children(*id))
    }

    /// Chords of a grouping, in entry order
    pub fn chords_of(&self, id: &GroupingId) -> Result<Vec<&Chord>> {
        Ok(self
            .grouping_entries_of(id)?
            .into_iter()
            .filter_map(|entry| self.store.chords.get(&entry.id.chord()))
            .collect())
    }

    pub fn count_chords(&self, id: &GroupingId) -> Result<usize> {
        Ok(self.chords_of(id)?.len())
    }

    /// Rests of a grouping, in entry order
    pub fn rests_of(&self, id: &GroupingId) -> Result<Vec<&Rest>> {
        Ok(self
            .grouping_entries_of(id)?
            .into_iter()
            .filter_map(|entry| self.store.rests.get(&entry.id.rest()))
            .collect())
    }

    pub fn count_rests(&self, id: &GroupingId) -> Result<usize> {
        Ok(self.rests_of(id)?.len())
    }

    pub fn chord_of_entry(&self, id: &GroupingEntryId) -> Result<Option<&Chord>> {
        self.require::<GroupingEntry>(self.exists_grouping_entry(id), id)?;
        Ok(self.store.chords.get(&id.chord()))
    }

    pub fn rest_of_entry(&self, id: &GroupingEntryId) -> Result<Option<&Rest>> {
        self.require::<GroupingEntry>(self.exists_grouping_entry(id), id)?;
        Ok(self.store.rests.get(&id.rest()))
    }

    /// Notes of a chord, lowest position first
    pub fn notes_of(&self, id: &ChordId) -> Result<Vec<&Note>> {
        self.require::<Chord>(self.exists_chord(id), id)?;
        Ok(self.store.notes.children(*id))
    }

    pub fn count_notes(&self, id: &ChordId) -> Result<usize> {
        self.require::<Chord>(self.exists_chord(id), id)?;
        Ok(self.store.notes.count_children(*id))
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    /// Remove a staff system and everything below it
    pub fn delete_staff_system(&mut self, id: &StaffSystemId) -> Result<()> {
        self.require::<StaffSystem>(self.exists_staff_system(id), id)?;
        let removed = self.store.remove_staff_system(id);
        log::debug!("Deleted staff system {} ({} records)", id, removed);
        Ok(())
    }

    /// Load the staff system as a tree, edit it, renumber and store it back
    fn rewrite<F>(&mut self, id: &StaffSystemId, edit: F) -> Result<()>
    where
        F: FnOnce(&mut StaffSystemDto),
    {
        let mut tree = self.to_dto(id)?;
        edit(&mut tree);
        tree.sync_ids();
        self.replace_tree(&tree);
        Ok(())
    }

    pub fn delete_staff(&mut self, id: &StaffId) -> Result<()> {
        self.require::<Staff>(self.exists_staff(id), id)?;
        let target = *id;
        self.rewrite(&id.staff_system_id, |tree| {
            tree.staves.retain(|staff| staff.staff_id != target);
        })
    }

    /// Delete the measure at this position from every staff of the system
    pub fn delete_measure(&mut self, id: &MeasureId) -> Result<()> {
        self.require::<Measure>(self.exists_measure(id), id)?;
        let order = id.measures_order;
        self.rewrite(&id.staff_system_id(), |tree| {
            for staff in tree.staves.iter_mut() {
                staff
                    .measures
                    .retain(|measure| measure.measure_id.measures_order != order);
            }
        })
    }

    pub fn delete_voice(&mut self, id: &VoiceId) -> Result<()> {
        self.require::<Voice>(self.exists_voice(id), id)?;
        let target = *id;
        self.rewrite(&id.staff_system_id(), |tree| {
            for measure in tree.staves.iter_mut().flat_map(|s| s.measures.iter_mut()) {
                measure.voices.retain(|voice| voice.voice_id != target);
            }
        })
    }

    pub fn delete_grouping(&mut self, id: &GroupingId) -> Result<()> {
        self.require::<Grouping>(self.exists_grouping(id), id)?;
        let target = *id;
        self.rewrite(&id.staff_system_id(), |tree| {
            for voice in tree
                .staves
                .iter_mut()
                .flat_map(|s| s.measures.iter_mut())
                .flat_map(|m| m.voices.iter_mut())
            {
                voice.groupings.retain(|grouping| grouping.grouping_id != target);
            }
        })
    }

    pub fn delete_grouping_entry(&mut self, id: &GroupingEntryId) -> Result<()> {
        self.require::<GroupingEntry>(self.exists_grouping_entry(id), id)?;
        let target = *id;
        self.rewrite(&id.staff_system_id(), |tree| {
            for grouping in tree
                .staves
                .iter_mut()
                .flat_map(|s| s.measures.iter_mut())
                .flat_map(|m| m.voices.iter_mut())
                .flat_map(|v| v.groupings.iter_mut())
            {
                grouping
                    .grouping_entries
                    .retain(|entry| entry.grouping_entry_id != target);
            }
        })
    }

    /// Notes are keyed by position, so removing one leaves no gap to close
    pub fn delete_note(&mut self, id: &NoteId) -> Result<()> {
        match self.store.notes.remove(id) {
            Some(_) => Ok(()),
            None => Err(ScoreError::not_found(Note::KIND, id)),
        }
    }

    pub fn delete_all(&mut self) {
        self.store.clear();
        log::debug!("Cleared score store");
    }
}
