//! A small two-staff sample score

use super::{ScoreBuilder, ScoreService};
use crate::error::Result;
use crate::models::core::Stem;
use crate::models::elements::{Accidental, Clef, KeySignature, RestType, StemType, TimeSignature};
use crate::models::ids::StaffSystemId;

const DRAW_ALL: &str = r#"{"drawClef":true,"drawKeySignature":true,"drawTimeSignature":true}"#;

/// Build the braced two-staff sample in B flat major and return its id.
///
/// Four measures per staff: the first holds two voices, the rest are rests.
pub fn build_sample_staff_system(service: &mut ScoreService) -> Result<StaffSystemId> {
    let key = KeySignature::Flat2;
    let time = TimeSignature::FourFour;
    let mut builder = ScoreBuilder::new(service);

    builder
        .create_and_select_staff_system(r#"{"connectorType":"Brace"}"#)?
        // upper staff
        .append_and_select_staff("")?
        .append_and_select_measure(key, time, Clef::Bass, DRAW_ALL)?
        .append_and_select_voice("")?
        .append_and_select_grouping("")?;
    for position in [8, 0, 0, 0] {
        builder
            .append_and_select_chord(Stem::new(StemType::Quarter), 0, "")?
            .insert_and_select_note(position, Accidental::None, "")?;
    }
    whole_note_voice(&mut builder)?;
    builder
        .append_and_select_measure(key, time, Clef::Treble, "")?
        .append_and_select_voice("")?
        .append_and_select_grouping("")?
        .append_and_select_rest(RestType::Whole, 0, "")?;

    // lower staff
    builder
        .back()
        .back()
        .back()
        .back()
        .append_and_select_staff("")?
        .append_and_select_measure(key, time, Clef::Treble, DRAW_ALL)?
        .append_and_select_voice("")?
        .append_and_select_grouping("")?;
    for _ in 0..3 {
        builder
            .append_and_select_chord(Stem::new(StemType::Quarter), 0, "")?
            .insert_and_select_note(0, Accidental::None, "")?;
    }
    builder
        .append_and_select_chord(Stem::new(StemType::Sixteenth), 0, "")?
        .insert_and_select_note(0, Accidental::DoubleSharp, "")?
        .append_and_select_rest(RestType::Sixteenth, 0, "")?
        .append_and_select_chord(Stem::new(StemType::Eight), 0, "")?
        .insert_and_select_note(0, Accidental::DoubleSharp, "")?;
    whole_note_voice(&mut builder)?;
    builder.append_and_select_measure(key, time, Clef::Treble, "")?;
    two_half_rests(&mut builder)?;

    // two more measures of half rests on both staves
    for metadata_json in [DRAW_ALL, ""] {
        for staff in 0..2 {
            builder
                .select_staff(staff)?
                .append_and_select_measure(key, time, Clef::Treble, metadata_json)?;
            two_half_rests(&mut builder)?;
        }
    }

    let id = builder.selected_staff_system_id()?;
    log::info!("Built sample staff system {}", id);
    Ok(id)
}

/// Second voice of the selected measure: a single whole note
fn whole_note_voice(builder: &mut ScoreBuilder<'_>) -> Result<()> {
    let measure = builder.selected_measure_id()?;
    builder
        .select_measure(measure.measures_order)?
        .append_and_select_voice("")?
        .append_and_select_grouping("")?
        .append_and_select_chord(Stem::new(StemType::Whole), 0, "")?
        .insert_and_select_note(0, Accidental::None, "")?;
    Ok(())
}

/// One voice of two half rests in the selected measure
fn two_half_rests(builder: &mut ScoreBuilder<'_>) -> Result<()> {
    builder
        .append_and_select_voice("")?
        .append_and_select_grouping("")?
        .append_and_select_rest(RestType::Half, 0, "")?
        .append_and_select_rest(RestType::Half, 0, "")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_shape() {
        let mut service = ScoreService::new();
        let id = build_sample_staff_system(&mut service).unwrap();
        let tree = service.to_dto(&id).unwrap();

        tree.validate().unwrap();
        assert_eq!(tree.staves.len(), 2);
        assert_eq!(tree.measure_count().unwrap(), 4);
        assert_eq!(tree.staves[0].measures[0].voices.len(), 2);
        assert_eq!(tree.staves[0].measures[0].clef, Clef::Bass);
        assert_eq!(tree.staves[1].measures[0].entry_count(), 7);
        assert!(tree.metadata_json.contains("Brace"));
    }
}
