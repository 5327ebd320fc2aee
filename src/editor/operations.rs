//! Structural edits: measures, staves, voices, notes and groupings

use super::{cursor_on, StaffSystemEditor};
use crate::error::{Result, ScoreError};
use crate::models::cursor::Cursor;
use crate::models::dto::*;
use crate::models::elements::{Accidental, Clef, KeySignature, StemType, TimeSignature};
use crate::models::ids::GroupingEntryId;
use crate::models::metadata::GroupingMetadata;

impl StaffSystemEditor {
    // ========================================================================
    // Measures
    // ========================================================================

    /// Insert a whole-rest measure at `index` on every staff.
    ///
    /// Clef, key and time are copied from the measure before the new one,
    /// or from the first measure when inserting at the front.
    pub fn insert_measure(&mut self, index: usize) -> Result<bool> {
        self.edit("Insert measure", |editor| {
            let index = index.min(editor.measure_count());
            let mut metadata = editor.system_metadata();

            for staff in editor.staff_system.staves.iter_mut() {
                let neighbour = match index {
                    0 => staff.measures.first(),
                    _ => staff.measures.get(index - 1),
                };
                let (clef, key, time) = neighbour
                    .map(|m| (m.clef, m.key_signature, m.time_signature))
                    .unwrap_or_default();
                let measure_id = staff.staff_id.measure(index as u32);
                staff
                    .measures
                    .insert(index, MeasureDto::whole_rest(measure_id, clef, key, time));
            }
            editor.staff_system.sync_ids();

            if editor.cursor_measure_id().index() >= index {
                editor.rebase_cursor(|entry| {
                    entry.grouping_id.voice_id.measure_id.measures_order += 1
                });
            }

            let row = metadata.row_of(index);
            match metadata.row_lengths.get_mut(row) {
                Some(len) => *len = len.saturating_add(1),
                None => metadata.row_lengths.push(1),
            }
            editor.write_system_metadata(metadata);
            Ok(())
        })
    }

    /// Remove the cursor measure from every staff; the last measure stays
    pub fn remove_measures(&mut self) -> Result<bool> {
        if self.measure_count() <= 1 {
            return Ok(false);
        }
        self.edit("Remove measure", |editor| {
            let measure_id = editor.cursor_measure_id();
            let index = measure_id.index();
            let mut metadata = editor.system_metadata();

            let mut next_id = measure_id;
            next_id.measures_order += 1;
            let next = editor
                .staff_system
                .measure(&next_id)
                .and_then(MeasureDto::first_entry)
                .and_then(cursor_on);
            let target = match next {
                Some(cursor) => {
                    // shifts left once the cursor measure is gone
                    let mut entry = cursor.grouping_entry_id();
                    entry.grouping_id.voice_id.measure_id.measures_order -= 1;
                    Some(cursor.moved_to(entry))
                }
                None => index.checked_sub(1).and_then(|previous| {
                    editor
                        .staff_system
                        .measure(&measure_id.staff_id.measure(previous as u32))
                        .and_then(MeasureDto::last_entry_of_first_voice)
                        .and_then(cursor_on)
                }),
            };

            for staff in editor.staff_system.staves.iter_mut() {
                if index < staff.measures.len() {
                    staff.measures.remove(index);
                }
            }
            editor.staff_system.sync_ids();
            if let Some(cursor) = target {
                editor.cursor = cursor;
            }

            let row = metadata.row_of(index);
            if let Some(len) = metadata.row_lengths.get_mut(row) {
                *len = len.saturating_sub(1);
            }
            editor.write_system_metadata(metadata);
            Ok(())
        })
    }

    pub fn swap_measure_left(&mut self) -> Result<bool> {
        self.swap_measure(-1)
    }

    pub fn swap_measure_right(&mut self) -> Result<bool> {
        self.swap_measure(1)
    }

    /// Swap the cursor measure with a neighbour on the cursor staff
    fn swap_measure(&mut self, delta: i32) -> Result<bool> {
        let measure_id = self.cursor_measure_id();
        let index = measure_id.index();
        let Some(other) = step(index, delta, self.measure_count()) else {
            return Ok(false);
        };
        self.edit("Swap measure", |editor| {
            let staff = editor
                .staff_system
                .staff_mut(&measure_id.staff_id)
                .ok_or_else(|| ScoreError::not_found("Staff", measure_id.staff_id))?;
            staff.measures.swap(index, other);
            editor.staff_system.sync_ids();
            editor.rebase_cursor(|entry| {
                entry.grouping_id.voice_id.measure_id.measures_order = other as u32
            });
            Ok(())
        })
    }

    // ========================================================================
    // Staves and voices
    // ========================================================================

    /// Insert a staff of whole-rest measures at `index`.
    ///
    /// Key and time follow the first staff measure by measure; the clef is
    /// treble.
    pub fn insert_staff(&mut self, index: usize) -> Result<bool> {
        if self.staff_count() >= self.config.max_staves {
            return Ok(false);
        }
        self.edit("Insert staff", |editor| {
            let index = index.min(editor.staff_count());
            let staff_id = editor.staff_system.staff_system_id.staff(index as u32);
            let measures: Vec<MeasureDto> = match editor.staff_system.staves.first() {
                Some(template) => template
                    .measures
                    .iter()
                    .map(|m| {
                        MeasureDto::whole_rest(
                            staff_id.measure(m.measure_id.measures_order),
                            Clef::Treble,
                            m.key_signature,
                            m.time_signature,
                        )
                    })
                    .collect(),
                None => Vec::new(),
            };
            editor.staff_system.staves.insert(
                index,
                StaffDto {
                    staff_id,
                    metadata_json: String::new(),
                    measures,
                },
            );
            editor.staff_system.sync_ids();

            let cursor_staff = editor.cursor_measure_id().staff_id.index();
            if cursor_staff >= index {
                editor.rebase_cursor(|entry| {
                    entry.grouping_id.voice_id.measure_id.staff_id.staves_order += 1
                });
            }
            Ok(())
        })
    }

    /// Delete the cursor staff; the last staff stays
    pub fn delete_staff(&mut self) -> Result<bool> {
        if self.staff_count() <= 1 {
            return Ok(false);
        }
        self.edit("Delete staff", |editor| {
            let index = editor.cursor_measure_id().staff_id.index();
            let target_index = if index > 0 { index - 1 } else { index + 1 };
            let target = editor
                .staff_system
                .staves
                .get(target_index)
                .and_then(|staff| staff.measures.first())
                .and_then(MeasureDto::first_entry)
                .and_then(cursor_on);

            editor.staff_system.staves.remove(index);
            editor.staff_system.sync_ids();

            if let Some(cursor) = target {
                editor.cursor = cursor;
                if target_index > index {
                    editor.rebase_cursor(|entry| {
                        entry.grouping_id.voice_id.measure_id.staff_id.staves_order -= 1
                    });
                }
            }
            Ok(())
        })
    }

    pub fn swap_staff_up(&mut self) -> Result<bool> {
        self.swap_staff(-1)
    }

    pub fn swap_staff_down(&mut self) -> Result<bool> {
        self.swap_staff(1)
    }

    fn swap_staff(&mut self, delta: i32) -> Result<bool> {
        let index = self.cursor_measure_id().staff_id.index();
        let Some(other) = step(index, delta, self.staff_count()) else {
            return Ok(false);
        };
        self.edit("Swap staff", |editor| {
            editor.staff_system.staves.swap(index, other);
            editor.staff_system.sync_ids();
            editor.rebase_cursor(|entry| {
                entry.grouping_id.voice_id.measure_id.staff_id.staves_order = other as u32
            });
            Ok(())
        })
    }

    /// Add a voice holding one whole rest to the cursor measure
    pub fn append_voice(&mut self) -> Result<bool> {
        let voice_count = self
            .staff_system
            .measure(&self.cursor_measure_id())
            .map(|measure| measure.voices.len())
            .unwrap_or(0);
        if voice_count >= self.config.max_voices {
            return Ok(false);
        }
        self.edit("Append voice", |editor| {
            let measure = editor.cursor_measure_mut()?;
            let voice_id = measure.measure_id.voice(measure.voices.len() as u32);
            measure.voices.push(VoiceDto::whole_rest(voice_id));
            Ok(())
        })
    }

    // ========================================================================
    // Notes and rests
    // ========================================================================

    /// Move the cursor note or rest up or down by `delta` staff positions
    pub fn move_cursor_position(&mut self, delta: i32) -> Result<bool> {
        match self.cursor {
            Cursor::Rest(id) => {
                let rest = self
                    .staff_system
                    .rest(&id)
                    .ok_or_else(|| ScoreError::not_found("Rest", id))?;
                let position = rest.position + delta;
                if !self.config.position_in_range(position) {
                    return Ok(false);
                }
                self.edit("Move rest", |editor| {
                    if let Some(rest) = editor.staff_system.rest_mut(&id) {
                        rest.position = position;
                    }
                    Ok(())
                })
            }
            Cursor::Note(id) => {
                let position = id.position + delta;
                let chord = self
                    .staff_system
                    .chord(&id.chord_id)
                    .ok_or_else(|| ScoreError::not_found("Chord", id.chord_id))?;
                let occupied = chord.notes.iter().any(|n| n.note_id.position == position);
                if occupied || !self.config.position_in_range(position) {
                    return Ok(false);
                }
                self.edit("Move note", |editor| {
                    let note = editor
                        .staff_system
                        .note_mut(&id)
                        .ok_or_else(|| ScoreError::not_found("Note", id))?;
                    note.note_id.position = position;
                    editor.staff_system.sync_ids();
                    editor.cursor = Cursor::Note(id.chord_id.note(position));
                    Ok(())
                })
            }
        }
    }

    /// Add a note one position above the highest note of the cursor chord
    pub fn insert_note_top(&mut self) -> Result<bool> {
        self.insert_note_at_edge(true)
    }

    /// Add a note one position below the lowest note of the cursor chord
    pub fn insert_note_bottom(&mut self) -> Result<bool> {
        self.insert_note_at_edge(false)
    }

    fn insert_note_at_edge(&mut self, top: bool) -> Result<bool> {
        let Cursor::Note(id) = self.cursor else {
            return Ok(false);
        };
        let chord = self
            .staff_system
            .chord(&id.chord_id)
            .ok_or_else(|| ScoreError::not_found("Chord", id.chord_id))?;
        if chord.notes.len() >= self.config.max_chord_notes {
            return Ok(false);
        }
        let positions = chord.notes.iter().map(|note| note.note_id.position);
        let position = if top {
            positions.max().unwrap_or(id.position) + 1
        } else {
            positions.min().unwrap_or(id.position) - 1
        };
        if !self.config.position_in_range(position) {
            return Ok(false);
        }

        self.edit("Insert note", |editor| {
            let chord = editor
                .staff_system
                .chord_mut(&id.chord_id)
                .ok_or_else(|| ScoreError::not_found("Chord", id.chord_id))?;
            chord.notes.push(NoteDto {
                note_id: id.chord_id.note(position),
                accidental: Accidental::None,
                metadata_json: String::new(),
            });
            editor.staff_system.sync_ids();
            Ok(())
        })
    }

    /// Insert a new entry right after the cursor entry, `offset` positions
    /// away from the cursor, and move the cursor onto it.
    ///
    /// The new entry copies the cursor's kind and duration. With
    /// `keep_grouping` it joins the cursor grouping; otherwise the grouping
    /// is split after the cursor and the entry gets a grouping of its own.
    pub fn insert_note_relative_to_cursor(&mut self, offset: i32, keep_grouping: bool) -> Result<bool> {
        let entry_id = self.cursor_entry_id();
        let entry_count = self
            .staff_system
            .voice(&entry_id.voice_id())
            .map(|voice| voice.entries().count())
            .unwrap_or(0);
        if entry_count >= self.config.max_grouping_entries_in_voice {
            return Ok(false);
        }

        let entry = self.cursor_entry()?;
        let (position, new_entry) = match self.cursor {
            Cursor::Rest(id) => {
                let rest = entry
                    .rest
                    .as_ref()
                    .ok_or_else(|| ScoreError::not_found("Rest", id))?;
                let position = rest.position + offset;
                (position, GroupingEntryDto::rest(entry_id, rest.rest_type, position))
            }
            Cursor::Note(id) => {
                let chord = entry
                    .chord
                    .as_ref()
                    .ok_or_else(|| ScoreError::not_found("Chord", id.chord_id))?;
                let position = id.position + offset;
                let mut new_entry =
                    GroupingEntryDto::chord(entry_id, chord.stem.stem_type, &[position]);
                if let Some(new_chord) = new_entry.chord.as_mut() {
                    new_chord.stem = chord.stem.clone();
                    new_chord.dot_count = chord.dot_count;
                }
                (position, new_entry)
            }
        };
        if !self.config.position_in_range(position) {
            return Ok(false);
        }

        self.edit("Insert entry", move |editor| {
            let new_entry_id = if keep_grouping {
                let grouping = editor
                    .staff_system
                    .grouping_mut(&entry_id.grouping_id)
                    .ok_or_else(|| ScoreError::not_found("Grouping", entry_id.grouping_id))?;
                let index = (entry_id.index() + 1).min(grouping.grouping_entries.len());
                grouping.grouping_entries.insert(index, new_entry);
                entry_id.grouping_id.entry(index as u32)
            } else {
                editor.split_after(entry_id)?;
                let voice_id = entry_id.voice_id();
                let voice = editor
                    .staff_system
                    .voice_mut(&voice_id)
                    .ok_or_else(|| ScoreError::not_found("Voice", voice_id))?;
                let index = entry_id.grouping_id.index() + 1;
                let grouping_id = voice_id.grouping(index as u32);
                voice.groupings.insert(
                    index,
                    GroupingDto {
                        grouping_id,
                        metadata_json: String::new(),
                        grouping_entries: vec![new_entry],
                    },
                );
                grouping_id.entry(0)
            };
            editor.staff_system.sync_ids();
            if let Some(cursor) = editor
                .staff_system
                .grouping_entry(&new_entry_id)
                .and_then(cursor_on)
            {
                editor.cursor = cursor;
            }
            Ok(())
        })
    }

    /// Delete the cursor note or rest.
    ///
    /// An entry is never removed when it is the only one in its measure.
    /// The cursor moves to the lowest remaining note of the chord, or to the
    /// first entry of the measure when the entry is gone.
    pub fn delete_note(&mut self) -> Result<bool> {
        let entry_count = self
            .staff_system
            .measure(&self.cursor_measure_id())
            .map(MeasureDto::entry_count)
            .unwrap_or(0);
        let removes_entry = match self.cursor {
            Cursor::Note(id) => self
                .staff_system
                .chord(&id.chord_id)
                .map(|chord| chord.notes.len() <= 1)
                .unwrap_or(true),
            Cursor::Rest(_) => true,
        };
        if removes_entry && entry_count <= 1 {
            return Ok(false);
        }

        self.edit("Delete note", |editor| {
            let entry_id = editor.cursor_entry_id();
            let measure_id = entry_id.measure_id();
            match editor.cursor {
                Cursor::Rest(_) => editor.cursor_entry_mut()?.rest = None,
                Cursor::Note(id) => {
                    let chord = editor
                        .staff_system
                        .chord_mut(&id.chord_id)
                        .ok_or_else(|| ScoreError::not_found("Chord", id.chord_id))?;
                    chord.notes.retain(|note| note.note_id != id);
                }
            }
            editor.staff_system.prune();

            let target = if removes_entry {
                editor
                    .staff_system
                    .measure(&measure_id)
                    .and_then(MeasureDto::first_entry)
            } else {
                editor.staff_system.grouping_entry(&entry_id)
            };
            if let Some(cursor) = target.and_then(cursor_on) {
                editor.cursor = cursor;
            }
            Ok(())
        })
    }

    /// Turn the cursor rest into a one-note chord, or the cursor chord into a rest
    pub fn toggle_type(&mut self) -> Result<bool> {
        self.edit("Toggle type", |editor| {
            let cursor = editor.cursor;
            let entry = editor.cursor_entry_mut()?;
            let entry_id = entry.grouping_entry_id;
            let next = match cursor {
                Cursor::Rest(id) => {
                    let rest = entry
                        .rest
                        .take()
                        .ok_or_else(|| ScoreError::not_found("Rest", id))?;
                    entry.chord =
                        GroupingEntryDto::chord(entry_id, rest.rest_type.into(), &[rest.position]).chord;
                    Cursor::Note(entry_id.chord().note(rest.position))
                }
                Cursor::Note(id) => {
                    let chord = entry
                        .chord
                        .take()
                        .ok_or_else(|| ScoreError::not_found("Chord", id.chord_id))?;
                    entry.rest =
                        GroupingEntryDto::rest(entry_id, chord.stem.stem_type.into(), id.position).rest;
                    Cursor::Rest(entry_id.rest())
                }
            };
            editor.cursor = next;
            Ok(())
        })
    }

    /// Set the note value of the cursor chord or rest
    pub fn set_duration(&mut self, stem_type: StemType) -> Result<bool> {
        self.edit("Set duration", |editor| {
            let entry = editor.cursor_entry_mut()?;
            if let Some(rest) = entry.rest.as_mut() {
                rest.rest_type = stem_type.into();
            }
            if let Some(chord) = entry.chord.as_mut() {
                chord.stem.stem_type = stem_type;
            }
            Ok(())
        })
    }

    pub fn set_accidental(&mut self, accidental: Accidental) -> Result<bool> {
        let Cursor::Note(id) = self.cursor else {
            return Ok(false);
        };
        self.edit("Set accidental", |editor| {
            let note = editor
                .staff_system
                .note_mut(&id)
                .ok_or_else(|| ScoreError::not_found("Note", id))?;
            note.accidental = accidental;
            Ok(())
        })
    }

    // ========================================================================
    // Groupings
    // ========================================================================

    /// Split the cursor grouping right after the cursor entry
    pub fn split_grouping(&mut self) -> Result<bool> {
        self.edit("Split grouping", |editor| {
            if editor.split_after(editor.cursor_entry_id())? {
                editor.staff_system.sync_ids();
            }
            Ok(())
        })
    }

    /// Append the next grouping of the voice to the cursor grouping
    pub fn merge_grouping(&mut self) -> Result<bool> {
        self.edit("Merge grouping", |editor| {
            let grouping_id = editor.cursor_entry_id().grouping_id;
            let voice = editor
                .staff_system
                .voice_mut(&grouping_id.voice_id)
                .ok_or_else(|| ScoreError::not_found("Voice", grouping_id.voice_id))?;
            let index = grouping_id.index();
            if index + 1 >= voice.groupings.len() {
                return Ok(());
            }
            let next = voice.groupings.remove(index + 1);
            if let Some(grouping) = voice.groupings.get_mut(index) {
                grouping.grouping_entries.extend(next.grouping_entries);
            }
            editor.staff_system.sync_ids();
            Ok(())
        })
    }

    /// Flip the stem direction stored on the cursor grouping
    pub fn toggle_group_stem_direction(&mut self) -> Result<bool> {
        self.edit("Toggle stem direction", |editor| {
            let grouping_id = editor.cursor_entry_id().grouping_id;
            let grouping = editor
                .staff_system
                .grouping_mut(&grouping_id)
                .ok_or_else(|| ScoreError::not_found("Grouping", grouping_id))?;
            let mut metadata = GroupingMetadata::parse(&grouping.metadata_json, &grouping_id.voice_id);
            metadata.stem_up = !metadata.stem_up;
            grouping.metadata_json = metadata.to_json();
            Ok(())
        })
    }

    /// Move the entries after `entry_id` into a new grouping right behind
    /// its own. Ids of later groupings are left stale.
    fn split_after(&mut self, entry_id: GroupingEntryId) -> Result<bool> {
        let voice_id = entry_id.voice_id();
        let voice = self
            .staff_system
            .voice_mut(&voice_id)
            .ok_or_else(|| ScoreError::not_found("Voice", voice_id))?;
        let index = entry_id.grouping_id.index();
        let grouping = voice
            .groupings
            .get_mut(index)
            .ok_or_else(|| ScoreError::not_found("Grouping", entry_id.grouping_id))?;
        let at = (entry_id.index() + 1).min(grouping.grouping_entries.len());
        let tail = grouping.grouping_entries.split_off(at);
        if tail.is_empty() {
            return Ok(false);
        }
        let second = GroupingDto {
            grouping_id: voice_id.grouping(index as u32 + 1),
            metadata_json: grouping.metadata_json.clone(),
            grouping_entries: tail,
        };
        voice.groupings.insert(index + 1, second);
        Ok(true)
    }

    // ========================================================================
    // Measure attributes
    // ========================================================================

    pub fn set_clef(&mut self, clef: Clef) -> Result<bool> {
        self.edit("Set clef", |editor| {
            editor.cursor_measure_mut()?.clef = clef;
            Ok(())
        })
    }

    pub fn set_key_signature(&mut self, key_signature: KeySignature) -> Result<bool> {
        self.edit("Set key signature", |editor| {
            editor.cursor_measure_mut()?.key_signature = key_signature;
            Ok(())
        })
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) -> Result<bool> {
        self.edit("Set time signature", |editor| {
            editor.cursor_measure_mut()?.time_signature = time_signature;
            Ok(())
        })
    }

    /// Point the cursor at the same kind of target in another entry
    fn rebase_cursor<F>(&mut self, f: F)
    where
        F: FnOnce(&mut GroupingEntryId),
    {
        let mut entry = self.cursor_entry_id();
        f(&mut entry);
        self.cursor = self.cursor.moved_to(entry);
    }
}

/// `index + delta` when it stays below `len`
fn step(index: usize, delta: i32, len: usize) -> Option<usize> {
    let target = usize::try_from(index as i64 + delta as i64).ok()?;
    (target < len).then_some(target)
}
