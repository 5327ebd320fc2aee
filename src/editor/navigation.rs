//! Cursor movement

use num_rational::Ratio;

use super::{cursor_on, StaffSystemEditor};
use crate::models::cursor::Cursor;
use crate::models::dto::{GroupingEntryDto, MeasureDto, VoiceDto};
use crate::models::ids::GroupingEntryId;

impl StaffSystemEditor {
    /// Previous entry of the voice, continuing into the previous measure
    pub fn move_cursor_left(&mut self) -> bool {
        self.navigate(|editor| editor.previous_cursor())
    }

    /// Next entry of the voice, continuing into the next measure
    pub fn move_cursor_right(&mut self) -> bool {
        self.navigate(|editor| editor.next_cursor())
    }

    /// Next higher note of the cursor chord
    pub fn increase_cursor_note(&mut self) -> bool {
        self.navigate(|editor| {
            let Cursor::Note(id) = editor.cursor else {
                return None;
            };
            let chord = editor.staff_system.chord(&id.chord_id)?;
            chord
                .notes
                .iter()
                .find(|note| note.note_id.position > id.position)
                .map(|note| Cursor::Note(note.note_id))
        })
    }

    /// Next lower note of the cursor chord
    pub fn decrease_cursor_note(&mut self) -> bool {
        self.navigate(|editor| {
            let Cursor::Note(id) = editor.cursor else {
                return None;
            };
            let chord = editor.staff_system.chord(&id.chord_id)?;
            chord
                .notes
                .iter()
                .rev()
                .find(|note| note.note_id.position < id.position)
                .map(|note| Cursor::Note(note.note_id))
        })
    }

    pub fn increase_cursor_voice(&mut self) -> bool {
        self.navigate(|editor| editor.cursor_in_voice(1))
    }

    pub fn decrease_cursor_voice(&mut self) -> bool {
        self.navigate(|editor| editor.cursor_in_voice(-1))
    }

    /// Move to the staff below, same measure
    pub fn increase_cursor_staff(&mut self) -> bool {
        self.navigate(|editor| editor.cursor_in_staff(1))
    }

    /// Move to the staff above, same measure
    pub fn decrease_cursor_staff(&mut self) -> bool {
        self.navigate(|editor| editor.cursor_in_staff(-1))
    }

    /// Layout row holding the cursor measure
    pub fn cursor_row_index(&self) -> usize {
        self.system_metadata()
            .row_of(self.cursor_measure_id().index())
    }

    // ========================================================================
    // Targets
    // ========================================================================

    fn next_cursor(&self) -> Option<Cursor> {
        let entry_id = self.cursor_entry_id();
        let voice = self.staff_system.voice(&entry_id.voice_id())?;
        let index = voice.flat_index_of(&entry_id)?;
        if let Some(entry) = voice.entries().nth(index + 1) {
            return cursor_on(entry);
        }

        let mut measure_id = entry_id.measure_id();
        measure_id.measures_order += 1;
        let measure = self.staff_system.measure(&measure_id)?;
        matching_voice(measure, entry_id.voice_id().index())?
            .entries()
            .next()
            .and_then(cursor_on)
    }

    fn previous_cursor(&self) -> Option<Cursor> {
        let entry_id = self.cursor_entry_id();
        let voice = self.staff_system.voice(&entry_id.voice_id())?;
        let index = voice.flat_index_of(&entry_id)?;
        if index > 0 {
            return voice.entries().nth(index - 1).and_then(cursor_on);
        }

        let mut measure_id = entry_id.measure_id();
        measure_id.measures_order = measure_id.measures_order.checked_sub(1)?;
        let measure = self.staff_system.measure(&measure_id)?;
        matching_voice(measure, entry_id.voice_id().index())?
            .entries()
            .last()
            .and_then(cursor_on)
    }

    fn cursor_in_voice(&self, delta: i32) -> Option<Cursor> {
        let entry_id = self.cursor_entry_id();
        let shift = self.duration_shift(&entry_id)?;
        let mut voice_id = entry_id.voice_id();
        voice_id.voices_order = offset(voice_id.voices_order, delta)?;
        let voice = self.staff_system.voice(&voice_id)?;
        entry_at_shift(voice, shift).and_then(cursor_on)
    }

    fn cursor_in_staff(&self, delta: i32) -> Option<Cursor> {
        let entry_id = self.cursor_entry_id();
        let shift = self.duration_shift(&entry_id)?;
        let mut measure_id = entry_id.measure_id();
        measure_id.staff_id.staves_order = offset(measure_id.staff_id.staves_order, delta)?;
        let measure = self.staff_system.measure(&measure_id)?;
        let voice = matching_voice(measure, entry_id.voice_id().index())?;
        entry_at_shift(voice, shift).and_then(cursor_on)
    }

    /// Start of the entry within its measure, in whole notes
    pub(crate) fn duration_shift(&self, entry_id: &GroupingEntryId) -> Option<Ratio<u32>> {
        let voice = self.staff_system.voice(&entry_id.voice_id())?;
        let index = voice.flat_index_of(entry_id)?;
        Some(
            voice
                .entries()
                .take(index)
                .fold(Ratio::from_integer(0), |sum, entry| sum + entry.duration()),
        )
    }
}

fn offset(order: u32, delta: i32) -> Option<u32> {
    u32::try_from(order as i64 + delta as i64).ok()
}

/// The voice with the same index, or the last one when the measure has fewer
fn matching_voice(measure: &MeasureDto, voice_index: usize) -> Option<&VoiceDto> {
    let last = measure.voices.len().checked_sub(1)?;
    measure.voices.get(voice_index.min(last))
}

/// The last entry starting at or before `shift`
fn entry_at_shift(voice: &VoiceDto, shift: Ratio<u32>) -> Option<&GroupingEntryDto> {
    let mut start = Ratio::from_integer(0);
    let mut found = None;
    for entry in voice.entries() {
        if start > shift {
            break;
        }
        found = Some(entry);
        start += entry.duration();
    }
    found
}
