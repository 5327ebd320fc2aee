//! Conversion between stored records and the nested tree

use super::ScoreService;
use crate::error::{Result, ScoreError};
use crate::models::core::*;
use crate::models::dto::*;
use crate::models::ids::StaffSystemId;
use crate::repository::Repository;

impl ScoreService {
    /// Assemble the nested tree of a stored staff system
    pub fn to_dto(&self, id: &StaffSystemId) -> Result<StaffSystemDto> {
        let staff_system = self
            .find_staff_system_by_id(id)
            .ok_or_else(|| ScoreError::not_found(StaffSystem::KIND, id))?;
        Ok(StaffSystemDto {
            staff_system_id: *id,
            metadata_json: staff_system.metadata_json.clone(),
            staves: self
                .store()
                .staves
                .children(*id)
                .into_iter()
                .map(|staff| self.staff_to_dto(staff))
                .collect(),
        })
    }

    /// Trees of every stored staff system
    pub fn find_all_dtos(&self) -> Result<Vec<StaffSystemDto>> {
        self.find_all_staff_systems()
            .into_iter()
            .map(|staff_system| self.to_dto(&staff_system.id))
            .collect()
    }

    /// Store a tree, replacing whatever was stored under its id.
    ///
    /// Ids inside the tree are re-derived from list positions first, so a
    /// client may reorder or insert children without fixing ids itself.
    pub fn save_dto(&mut self, dto: &StaffSystemDto) -> Result<StaffSystemId> {
        dto.validate()?;
        let mut tree = dto.clone();
        tree.sync_ids();
        self.replace_tree(&tree);
        log::debug!(
            "Saved staff system {} ({} staves)",
            tree.staff_system_id,
            tree.staves.len()
        );
        Ok(tree.staff_system_id)
    }

    /// Swap the stored records of one staff system for those of `tree`
    pub(crate) fn replace_tree(&mut self, tree: &StaffSystemDto) {
        let store = self.store_mut();
        store.remove_staff_system(&tree.staff_system_id);
        store.staff_systems.add(StaffSystem {
            id: tree.staff_system_id,
            metadata_json: tree.metadata_json.clone(),
        });
        for staff in &tree.staves {
            store.staves.add(Staff {
                id: staff.staff_id,
                metadata_json: staff.metadata_json.clone(),
            });
            for measure in &staff.measures {
                store.measures.add(Measure {
                    id: measure.measure_id,
                    key_signature: measure.key_signature,
                    time_signature: measure.time_signature,
                    clef: measure.clef,
                    metadata_json: measure.metadata_json.clone(),
                });
                for voice in &measure.voices {
                    store.voices.add(Voice {
                        id: voice.voice_id,
                        metadata_json: voice.metadata_json.clone(),
                    });
                    for grouping in &voice.groupings {
                        store.groupings.add(Grouping {
                            id: grouping.grouping_id,
                            metadata_json: grouping.metadata_json.clone(),
                        });
                        for entry in &grouping.grouping_entries {
                            store.grouping_entries.add(GroupingEntry {
                                id: entry.grouping_entry_id,
                            });
                            if let Some(chord) = &entry.chord {
                                store.chords.add(Chord {
                                    id: chord.chord_id,
                                    stem: chord.stem.clone(),
                                    dot_count: chord.dot_count,
                                    metadata_json: chord.metadata_json.clone(),
                                });
                                for note in &chord.notes {
                                    store.notes.add(Note {
                                        id: note.note_id,
                                        accidental: note.accidental,
                                        metadata_json: note.metadata_json.clone(),
                                    });
                                }
                            }
                            if let Some(rest) = &entry.rest {
                                store.rests.add(Rest {
                                    id: rest.rest_id,
                                    rest_type: rest.rest_type,
                                    position: rest.position,
                                    metadata_json: rest.metadata_json.clone(),
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    fn staff_to_dto(&self, staff: &Staff) -> StaffDto {
        StaffDto {
            staff_id: staff.id,
            metadata_json: staff.metadata_json.clone(),
            measures: self
                .store()
                .measures
                .children(staff.id)
                .into_iter()
                .map(|measure| self.measure_to_dto(measure))
                .collect(),
        }
    }

    fn measure_to_dto(&self, measure: &Measure) -> MeasureDto {
        MeasureDto {
            measure_id: measure.id,
            metadata_json: measure.metadata_json.clone(),
            key_signature: measure.key_signature,
            time_signature: measure.time_signature,
            clef: measure.clef,
            voices: self
                .store()
                .voices
                .children(measure.id)
                .into_iter()
                .map(|voice| self.voice_to_dto(voice))
                .collect(),
        }
    }

    fn voice_to_dto(&self, voice: &Voice) -> VoiceDto {
        VoiceDto {
            voice_id: voice.id,
            metadata_json: voice.metadata_json.clone(),
            groupings: self
                .store()
                .groupings
                .children(voice.id)
                .into_iter()
                .map(|grouping| self.grouping_to_dto(grouping))
                .collect(),
        }
    }

    fn grouping_to_dto(&self, grouping: &Grouping) -> GroupingDto {
        GroupingDto {
            grouping_id: grouping.id,
            metadata_json: grouping.metadata_json.clone(),
            grouping_entries: self
                .store()
                .grouping_entries
                .children(grouping.id)
                .into_iter()
                .map(|entry| self.grouping_entry_to_dto(entry))
                .collect(),
        }
    }

    fn grouping_entry_to_dto(&self, entry: &GroupingEntry) -> GroupingEntryDto {
        let store = self.store();
        GroupingEntryDto {
            grouping_entry_id: entry.id,
            chord: store.chords.get(&entry.id.chord()).map(|chord| ChordDto {
                chord_id: chord.id,
                stem: chord.stem.clone(),
                dot_count: chord.dot_count,
                metadata_json: chord.metadata_json.clone(),
                notes: store
                    .notes
                    .children(chord.id)
                    .into_iter()
                    .map(|note| NoteDto {
                        note_id: note.id,
                        accidental: note.accidental,
                        metadata_json: note.metadata_json.clone(),
                    })
                    .collect(),
            }),
            rest: store.rests.get(&entry.id.rest()).map(|rest| RestDto {
                rest_id: rest.id,
                rest_type: rest.rest_type,
                position: rest.position,
                metadata_json: rest.metadata_json.clone(),
            }),
        }
    }
}
