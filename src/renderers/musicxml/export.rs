//! Staff system tree to MusicXML
//!
//! One part per staff. Voices of a measure are written one after another,
//! separated by `<backup>` back to the start of the measure.

use num_rational::Ratio;

use super::builder::{Attributes, MusicXmlBuilder, NoteSpec};
use crate::config::EditorConfig;
use crate::error::{Result, ScoreError};
use crate::models::dto::*;
use crate::models::elements::{StemType, TimeSignature, DURATION_RESOLUTION};
use crate::models::metadata::{GroupingMetadata, StaffSystemMetadata};
use crate::renderers::pitch::Pitch;

/// Divisions per quarter note
pub const DIVISIONS: u32 = DURATION_RESOLUTION / 4;

/// Render a whole staff system as a partwise MusicXML 3.1 document
pub fn to_musicxml(tree: &StaffSystemDto) -> Result<String> {
    tree.validate()?;
    let measure_count = tree.measure_count()?;
    let mut metadata =
        StaffSystemMetadata::parse(&tree.metadata_json, measure_count, &EditorConfig::default());
    metadata.normalize_rows(measure_count);
    let row_starts = row_starts(&metadata.row_lengths);

    let mut builder = MusicXmlBuilder::new();
    builder.set_title(metadata.name.clone());
    for (staff_index, staff) in tree.staves.iter().enumerate() {
        builder.start_part(&format!("Staff {}", staff_index + 1));
        let mut previous: Option<&MeasureDto> = None;
        for (index, measure) in staff.measures.iter().enumerate() {
            builder.start_measure(index + 1, row_starts.contains(&index));
            builder.write_attributes(&measure_attributes(measure, previous));
            write_measure(&mut builder, measure)?;
            if index + 1 == staff.measures.len() {
                builder.write_final_barline();
            }
            previous = Some(measure);
        }
    }

    log::debug!(
        "MusicXML export: {} parts, {} measures",
        tree.staves.len(),
        measure_count
    );
    Ok(builder.finalize())
}

/// Indices of the measures that open a new row, except the first row
fn row_starts(row_lengths: &[usize]) -> Vec<usize> {
    row_lengths
        .iter()
        .take(row_lengths.len().saturating_sub(1))
        .scan(0, |start, len| {
            *start += len;
            Some(*start)
        })
        .collect()
}

fn measure_attributes(measure: &MeasureDto, previous: Option<&MeasureDto>) -> Attributes {
    let time = measure.time_signature;
    Attributes {
        divisions: previous.is_none().then_some(DIVISIONS),
        fifths: previous
            .map_or(true, |p| p.key_signature != measure.key_signature)
            .then(|| measure.key_signature.armor()),
        time: previous
            .map_or(true, |p| p.time_signature != time)
            .then(|| (time.beats(), time.beat_unit(), time == TimeSignature::Common)),
        clef: previous
            .map_or(true, |p| p.clef != measure.clef)
            .then(|| measure.clef.sign()),
    }
}

fn write_measure(builder: &mut MusicXmlBuilder, measure: &MeasureDto) -> Result<()> {
    for (index, voice) in measure.voices.iter().enumerate() {
        let elapsed = write_voice(builder, measure, voice, index + 1)?;
        if index + 1 < measure.voices.len() {
            builder.write_backup(elapsed);
        }
    }
    Ok(())
}

/// Write one voice and return its length in divisions
fn write_voice(
    builder: &mut MusicXmlBuilder,
    measure: &MeasureDto,
    voice: &VoiceDto,
    number: usize,
) -> Result<u32> {
    let mut elapsed = 0;
    for grouping in &voice.groupings {
        let stem_up = GroupingMetadata::parse(&grouping.metadata_json, &voice.voice_id).stem_up;
        let entries = &grouping.grouping_entries;
        let beamed = entries.len() >= 2
            && entries.iter().all(|entry| {
                entry
                    .chord
                    .as_ref()
                    .map_or(false, |chord| {
                        !chord.notes.is_empty() && chord.stem.stem_type.is_beamable()
                    })
            });

        for (index, entry) in entries.iter().enumerate() {
            let duration = divisions(entry.duration())?;
            elapsed += duration;
            let beam = beamed.then(|| match index {
                0 => "begin",
                i if i + 1 == entries.len() => "end",
                _ => "continue",
            });

            if let Some(rest) = &entry.rest {
                builder.write_note(&NoteSpec {
                    pitch: None,
                    chord: false,
                    duration,
                    voice: number,
                    note_type: rest.rest_type.xml_type(),
                    dots: 0,
                    accidental: None,
                    stem: None,
                    beam: None,
                });
                continue;
            }
            let Some(chord) = &entry.chord else {
                continue;
            };
            if chord.notes.is_empty() {
                builder.write_forward(duration, number);
                continue;
            }
            let stem_type = chord.stem.stem_type;
            let stem = match stem_type {
                StemType::Whole => None,
                _ if stem_up => Some("up"),
                _ => Some("down"),
            };
            for (note_index, note) in chord.notes.iter().enumerate() {
                let pitch = Pitch::resolve(
                    note.note_id.position,
                    measure.clef,
                    measure.key_signature,
                    note.accidental,
                );
                builder.write_note(&NoteSpec {
                    pitch: Some(pitch),
                    chord: note_index > 0,
                    duration,
                    voice: number,
                    note_type: stem_type.xml_type(),
                    dots: chord.dot_count,
                    accidental: note.accidental.xml_name(),
                    stem,
                    beam: if note_index == 0 { beam } else { None },
                });
            }
        }
    }
    Ok(elapsed)
}

/// Whole-note fraction to divisions; 4 quarters per whole
fn divisions(duration: Ratio<u32>) -> Result<u32> {
    let scaled = duration * Ratio::from_integer(DIVISIONS * 4);
    if !scaled.is_integer() {
        return Err(ScoreError::Export(format!(
            "duration {} is finer than {} divisions per quarter",
            duration, DIVISIONS
        )));
    }
    Ok(scaled.to_integer())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::elements::{Clef, KeySignature};
    use crate::models::ids::StaffSystemId;

    fn measure(clef: Clef) -> MeasureDto {
        let id = StaffSystemId::new().staff(0).measure(0);
        MeasureDto::whole_rest(id, clef, KeySignature::Sharp1, TimeSignature::Common)
    }

    #[test]
    fn test_divisions() {
        assert_eq!(divisions(Ratio::new(1, 4)).unwrap(), 64);
        assert_eq!(divisions(Ratio::new(3, 8)).unwrap(), 96);
        assert_eq!(divisions(Ratio::new(1, 64)).unwrap(), 4);
        assert!(divisions(Ratio::new(1, 512)).is_err());
    }

    #[test]
    fn test_row_starts() {
        assert_eq!(row_starts(&[3, 3, 1]), vec![3, 6]);
        assert!(row_starts(&[2]).is_empty());
    }

    #[test]
    fn test_first_measure_carries_all_attributes() {
        let first = measure(Clef::Treble);
        let attributes = measure_attributes(&first, None);
        assert_eq!(attributes.divisions, Some(64));
        assert_eq!(attributes.fifths, Some(1));
        assert_eq!(attributes.time, Some((4, 4, true)));
        assert_eq!(attributes.clef, Some(("G", 2)));

        let second = measure(Clef::Bass);
        let attributes = measure_attributes(&second, Some(&first));
        assert_eq!(
            attributes,
            Attributes {
                clef: Some(("F", 4)),
                ..Attributes::default()
            }
        );
    }
}
