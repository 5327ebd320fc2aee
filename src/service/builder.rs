//! Fluent construction of stored scores
//!
//! `ScoreBuilder` keeps a selection path from a staff system down to a note.
//! Appending at a level selects the new record and forgets everything that
//! was selected below it; `back()` forgets the deepest selection.
//!
//! ```ignore
//! let mut builder = ScoreBuilder::new(&mut service);
//! builder
//!     .create_and_select_staff_system("")?
//!     .append_and_select_staff("")?
//!     .append_and_select_measure(KeySignature::None, TimeSignature::FourFour, Clef::Treble, "")?
//!     .append_and_select_voice("")?
//!     .append_and_select_grouping("")?
//!     .append_and_select_rest(RestType::Whole, 0, "")?;
//! ```

use super::ScoreService;
use crate::error::{Result, ScoreError};
use crate::models::core::{Entity, Measure, Stem};
use crate::models::elements::{Accidental, Clef, KeySignature, RestType, TimeSignature};
use crate::models::ids::*;

pub struct ScoreBuilder<'a> {
    service: &'a mut ScoreService,
    staff_system: Option<StaffSystemId>,
    staff: Option<StaffId>,
    measure: Option<MeasureId>,
    voice: Option<VoiceId>,
    grouping: Option<GroupingId>,
    grouping_entry: Option<GroupingEntryId>,
    note: Option<NoteId>,
}

impl<'a> ScoreBuilder<'a> {
    pub fn new(service: &'a mut ScoreService) -> Self {
        Self {
            service,
            staff_system: None,
            staff: None,
            measure: None,
            voice: None,
            grouping: None,
            grouping_entry: None,
            note: None,
        }
    }

    // ========================================================================
    // Selection accessors
    // ========================================================================

    pub fn selected_staff_system_id(&self) -> Result<StaffSystemId> {
        self.staff_system.ok_or(ScoreError::NothingSelected("StaffSystem"))
    }

    pub fn selected_staff_id(&self) -> Result<StaffId> {
        self.staff.ok_or(ScoreError::NothingSelected("Staff"))
    }

    pub fn selected_measure_id(&self) -> Result<MeasureId> {
        self.measure.ok_or(ScoreError::NothingSelected("Measure"))
    }

    pub fn selected_voice_id(&self) -> Result<VoiceId> {
        self.voice.ok_or(ScoreError::NothingSelected("Voice"))
    }

    pub fn selected_grouping_id(&self) -> Result<GroupingId> {
        self.grouping.ok_or(ScoreError::NothingSelected("Grouping"))
    }

    pub fn selected_grouping_entry_id(&self) -> Result<GroupingEntryId> {
        self.grouping_entry
            .ok_or(ScoreError::NothingSelected("GroupingEntry"))
    }

    pub fn selected_note_id(&self) -> Result<NoteId> {
        self.note.ok_or(ScoreError::NothingSelected("Note"))
    }

    fn clear_below_staff_system(&mut self) {
        self.staff = None;
        self.clear_below_staff();
    }

    fn clear_below_staff(&mut self) {
        self.measure = None;
        self.clear_below_measure();
    }

    fn clear_below_measure(&mut self) {
        self.voice = None;
        self.clear_below_voice();
    }

    fn clear_below_voice(&mut self) {
        self.grouping = None;
        self.clear_below_grouping();
    }

    fn clear_below_grouping(&mut self) {
        self.grouping_entry = None;
        self.note = None;
    }

    /// Forget the deepest selection
    pub fn back(&mut self) -> &mut Self {
        if self.note.is_some() {
            self.note = None;
        } else if self.grouping_entry.is_some() {
            self.grouping_entry = None;
        } else if self.grouping.is_some() {
            self.grouping = None;
        } else if self.voice.is_some() {
            self.voice = None;
        } else if self.measure.is_some() {
            self.measure = None;
        } else if self.staff.is_some() {
            self.staff = None;
        } else {
            self.staff_system = None;
        }
        self
    }

    // ========================================================================
    // Selecting existing records
    // ========================================================================

    pub fn select_staff_system(&mut self, id: StaffSystemId) -> Result<&mut Self> {
        if !self.service.exists_staff_system(&id) {
            return Err(ScoreError::not_found("StaffSystem", id));
        }
        self.staff_system = Some(id);
        self.clear_below_staff_system();
        Ok(self)
    }

    pub fn select_staff(&mut self, index: u32) -> Result<&mut Self> {
        let id = self.selected_staff_system_id()?.staff(index);
        if !self.service.exists_staff(&id) {
            return Err(ScoreError::not_found("Staff", id));
        }
        self.staff = Some(id);
        self.clear_below_staff();
        Ok(self)
    }

    pub fn select_measure(&mut self, index: u32) -> Result<&mut Self> {
        let id = self.selected_staff_id()?.measure(index);
        if !self.service.exists_measure(&id) {
            return Err(ScoreError::not_found("Measure", id));
        }
        self.measure = Some(id);
        self.clear_below_measure();
        Ok(self)
    }

    pub fn select_voice(&mut self, index: u32) -> Result<&mut Self> {
        let id = self.selected_measure_id()?.voice(index);
        if !self.service.exists_voice(&id) {
            return Err(ScoreError::not_found("Voice", id));
        }
        self.voice = Some(id);
        self.clear_below_voice();
        Ok(self)
    }

    pub fn select_grouping(&mut self, index: u32) -> Result<&mut Self> {
        let id = self.selected_voice_id()?.grouping(index);
        if !self.service.exists_grouping(&id) {
            return Err(ScoreError::not_found("Grouping", id));
        }
        self.grouping = Some(id);
        self.clear_below_grouping();
        Ok(self)
    }

    // ========================================================================
    // Appending
    // ========================================================================

    pub fn create_and_select_staff_system(
        &mut self,
        metadata_json: impl Into<String>,
    ) -> Result<&mut Self> {
        let id = self.service.create_staff_system(metadata_json);
        self.staff_system = Some(id);
        self.clear_below_staff_system();
        Ok(self)
    }

    pub fn append_and_select_staff(&mut self, metadata_json: impl Into<String>) -> Result<&mut Self> {
        let parent = self.selected_staff_system_id()?;
        self.staff = Some(self.service.append_staff(&parent, metadata_json)?);
        self.clear_below_staff();
        Ok(self)
    }

    pub fn append_and_select_measure(
        &mut self,
        key_signature: KeySignature,
        time_signature: TimeSignature,
        clef: Clef,
        metadata_json: impl Into<String>,
    ) -> Result<&mut Self> {
        let parent = self.selected_staff_id()?;
        self.measure = Some(self.service.append_measure(
            &parent,
            key_signature,
            time_signature,
            clef,
            metadata_json,
        )?);
        self.clear_below_measure();
        Ok(self)
    }

    pub fn append_and_select_voice(&mut self, metadata_json: impl Into<String>) -> Result<&mut Self> {
        let parent = self.selected_measure_id()?;
        self.voice = Some(self.service.append_voice(&parent, metadata_json)?);
        self.clear_below_voice();
        Ok(self)
    }

    pub fn append_and_select_grouping(
        &mut self,
        metadata_json: impl Into<String>,
    ) -> Result<&mut Self> {
        let parent = self.selected_voice_id()?;
        self.grouping = Some(self.service.append_grouping(&parent, metadata_json)?);
        self.clear_below_grouping();
        Ok(self)
    }

    pub fn append_and_select_chord(
        &mut self,
        stem: Stem,
        dot_count: u8,
        metadata_json: impl Into<String>,
    ) -> Result<&mut Self> {
        let parent = self.selected_grouping_id()?;
        let chord = self
            .service
            .append_chord(&parent, stem, dot_count, metadata_json)?;
        self.grouping_entry = Some(chord.grouping_entry_id);
        self.note = None;
        Ok(self)
    }

    pub fn append_and_select_rest(
        &mut self,
        rest_type: RestType,
        position: i32,
        metadata_json: impl Into<String>,
    ) -> Result<&mut Self> {
        let parent = self.selected_grouping_id()?;
        let rest = self
            .service
            .append_rest(&parent, rest_type, position, metadata_json)?;
        self.grouping_entry = Some(rest.grouping_entry_id);
        self.note = None;
        Ok(self)
    }

    /// Add a note to the selected chord
    pub fn insert_and_select_note(
        &mut self,
        position: i32,
        accidental: Accidental,
        metadata_json: impl Into<String>,
    ) -> Result<&mut Self> {
        let chord = self.selected_grouping_entry_id()?.chord();
        self.note = Some(
            self.service
                .insert_note(&chord, position, accidental, metadata_json)?,
        );
        Ok(self)
    }

    // ========================================================================
    // Updating the selection
    // ========================================================================

    /// Replace the metadata of the deepest selected record
    pub fn set_metadata(&mut self, metadata_json: impl Into<String>) -> Result<&mut Self> {
        let store = self.service.store_mut();
        let slot = if let Some(id) = self.note {
            store.notes.get_mut(&id).map(|r| &mut r.metadata_json)
        } else if let Some(id) = self.grouping_entry {
            match store.chords.get_mut(&id.chord()) {
                Some(chord) => Some(&mut chord.metadata_json),
                None => store.rests.get_mut(&id.rest()).map(|r| &mut r.metadata_json),
            }
        } else if let Some(id) = self.grouping {
            store.groupings.get_mut(&id).map(|r| &mut r.metadata_json)
        } else if let Some(id) = self.voice {
            store.voices.get_mut(&id).map(|r| &mut r.metadata_json)
        } else if let Some(id) = self.measure {
            store.measures.get_mut(&id).map(|r| &mut r.metadata_json)
        } else if let Some(id) = self.staff {
            store.staves.get_mut(&id).map(|r| &mut r.metadata_json)
        } else if let Some(id) = self.staff_system {
            store.staff_systems.get_mut(&id).map(|r| &mut r.metadata_json)
        } else {
            return Err(ScoreError::NothingSelected("record"));
        };
        let slot = slot.ok_or_else(|| ScoreError::invalid("selected record no longer exists"))?;
        *slot = metadata_json.into();
        Ok(self)
    }

    fn update_measure<F: FnOnce(&mut Measure)>(&mut self, update: F) -> Result<&mut Self> {
        let id = self.selected_measure_id()?;
        let measure = self
            .service
            .store_mut()
            .measures
            .get_mut(&id)
            .ok_or_else(|| ScoreError::not_found(Measure::KIND, id))?;
        update(measure);
        Ok(self)
    }

    pub fn set_clef(&mut self, clef: Clef) -> Result<&mut Self> {
        self.update_measure(|measure| measure.clef = clef)
    }

    pub fn set_key_signature(&mut self, key_signature: KeySignature) -> Result<&mut Self> {
        self.update_measure(|measure| measure.key_signature = key_signature)
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) -> Result<&mut Self> {
        self.update_measure(|measure| measure.time_signature = time_signature)
    }

    // ========================================================================
    // Deleting the selection
    // ========================================================================

    pub fn delete_selected_staff(&mut self) -> Result<&mut Self> {
        let id = self.selected_staff_id()?;
        self.service.delete_staff(&id)?;
        self.staff = None;
        self.clear_below_staff();
        Ok(self)
    }

    pub fn delete_selected_measure(&mut self) -> Result<&mut Self> {
        let id = self.selected_measure_id()?;
        self.service.delete_measure(&id)?;
        self.measure = None;
        self.clear_below_measure();
        Ok(self)
    }

    /// Read access to the service being built into
    pub fn service(&self) -> &ScoreService {
        self.service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::elements::StemType;

    #[test]
    fn test_selection_follows_appends() {
        let mut service = ScoreService::new();
        let mut builder = ScoreBuilder::new(&mut service);
        builder
            .create_and_select_staff_system("")
            .unwrap()
            .append_and_select_staff("")
            .unwrap()
            .append_and_select_measure(KeySignature::None, TimeSignature::FourFour, Clef::Treble, "")
            .unwrap()
            .append_and_select_voice("")
            .unwrap()
            .append_and_select_grouping("")
            .unwrap()
            .append_and_select_chord(Stem::new(StemType::Half), 0, "")
            .unwrap()
            .insert_and_select_note(2, Accidental::None, "")
            .unwrap();

        assert_eq!(builder.selected_note_id().unwrap().position, 2);
        builder.back().back();
        assert!(builder.selected_grouping_entry_id().is_err());
        builder
            .append_and_select_rest(RestType::Half, 0, "")
            .unwrap();
        assert_eq!(builder.selected_grouping_entry_id().unwrap().index(), 1);
    }

    #[test]
    fn test_missing_selection_is_an_error() {
        let mut service = ScoreService::new();
        let mut builder = ScoreBuilder::new(&mut service);
        assert!(matches!(
            builder.append_and_select_staff(""),
            Err(ScoreError::NothingSelected("StaffSystem"))
        ));
        assert!(matches!(
            builder.set_clef(Clef::Bass),
            Err(ScoreError::NothingSelected("Measure"))
        ));
    }

    #[test]
    fn test_set_attributes_on_selection() {
        let mut service = ScoreService::new();
        let mut builder = ScoreBuilder::new(&mut service);
        builder
            .create_and_select_staff_system("")
            .unwrap()
            .append_and_select_staff("")
            .unwrap()
            .append_and_select_measure(KeySignature::None, TimeSignature::FourFour, Clef::Treble, "")
            .unwrap()
            .set_clef(Clef::Bass)
            .unwrap()
            .set_metadata(r#"{"drawClef":true}"#)
            .unwrap();
        let measure_id = builder.selected_measure_id().unwrap();

        let measure = service.find_measure_by_id(&measure_id).unwrap();
        assert_eq!(measure.clef, Clef::Bass);
        assert_eq!(measure.metadata_json, r#"{"drawClef":true}"#);
    }

    #[test]
    fn test_select_existing_staff() {
        let mut service = ScoreService::new();
        let mut builder = ScoreBuilder::new(&mut service);
        builder
            .create_and_select_staff_system("")
            .unwrap()
            .append_and_select_staff("")
            .unwrap()
            .append_and_select_staff("")
            .unwrap();
        builder.select_staff(0).unwrap();
        assert_eq!(builder.selected_staff_id().unwrap().index(), 0);
        assert!(builder.select_staff(5).is_err());
        builder.delete_selected_staff().unwrap();
        assert!(builder.selected_staff_id().is_err());
        let system = builder.selected_staff_system_id().unwrap();
        assert_eq!(builder.service().count_staves(&system).unwrap(), 1);
    }
}
