//! Staff system tree to LilyPond source

use std::collections::BTreeSet;

use super::templates::{render_lilypond, TemplateContext};
use crate::config::EditorConfig;
use crate::error::Result;
use crate::models::dto::*;
use crate::models::elements::{ConnectorType, TimeSignature};
use crate::models::metadata::StaffSystemMetadata;
use crate::renderers::pitch::Pitch;

/// Render a whole staff system as a LilyPond document
pub fn to_lilypond(tree: &StaffSystemDto) -> Result<String> {
    tree.validate()?;
    let measure_count = tree.measure_count()?;
    let mut metadata =
        StaffSystemMetadata::parse(&tree.metadata_json, measure_count, &EditorConfig::default());
    metadata.normalize_rows(measure_count);
    let breaks = row_breaks(&metadata.row_lengths);

    let open = match metadata.connector_type {
        ConnectorType::Brace => "\\new PianoStaff <<",
        ConnectorType::Bracket => "\\new StaffGroup <<",
        ConnectorType::None => "<<",
    };
    let mut staff_group = format!("  {}\n", open);
    for staff in &tree.staves {
        staff_group.push_str(&render_staff(staff, &breaks));
    }
    staff_group.push_str("  >>");

    log::debug!(
        "LilyPond export: {} staves, {} measures",
        tree.staves.len(),
        measure_count
    );
    render_lilypond(&TemplateContext::new(staff_group, metadata.name.as_deref()))
}

/// Indices of the measures that end a row, except the last row
fn row_breaks(row_lengths: &[usize]) -> BTreeSet<usize> {
    let mut end = 0;
    let mut breaks = BTreeSet::new();
    for len in row_lengths.iter().take(row_lengths.len().saturating_sub(1)) {
        end += len;
        breaks.insert(end - 1);
    }
    breaks
}

fn render_staff(staff: &StaffDto, breaks: &BTreeSet<usize>) -> String {
    let mut out = String::from("    \\new Staff {\n");
    let mut previous: Option<&MeasureDto> = None;
    for (index, measure) in staff.measures.iter().enumerate() {
        out.push_str("      ");
        out.push_str(&measure_attributes(measure, previous));
        out.push_str(&render_measure(measure));
        out.push_str(" |");
        if breaks.contains(&index) {
            out.push_str(" \\break");
        }
        out.push('\n');
        previous = Some(measure);
    }
    out.push_str("      \\bar \"|.\"\n    }\n");
    out
}

/// Clef, key and time commands for whatever changed since `previous`
fn measure_attributes(measure: &MeasureDto, previous: Option<&MeasureDto>) -> String {
    let mut out = String::new();
    if previous.map_or(true, |p| p.clef != measure.clef) {
        out.push_str(&format!("\\clef {} ", measure.clef.lilypond_name()));
    }
    if previous.map_or(true, |p| p.key_signature != measure.key_signature) {
        out.push_str(&format!(
            "\\key {} \\major ",
            measure.key_signature.lilypond_name()
        ));
    }
    if previous.map_or(true, |p| p.time_signature != measure.time_signature) {
        let time = measure.time_signature;
        let style = match time {
            TimeSignature::Common => "\\defaultTimeSignature",
            _ => "\\numericTimeSignature",
        };
        out.push_str(&format!(
            "{} \\time {}/{} ",
            style,
            time.beats(),
            time.beat_unit()
        ));
    }
    out
}

fn render_measure(measure: &MeasureDto) -> String {
    let voices: Vec<String> = measure
        .voices
        .iter()
        .map(|voice| render_voice(voice, measure))
        .collect();
    if voices.len() == 1 {
        voices.join("")
    } else {
        format!("<< {{ {} }} >>", voices.join(" } \\\\ { "))
    }
}

fn render_voice(voice: &VoiceDto, measure: &MeasureDto) -> String {
    let mut tokens = Vec::new();
    for grouping in &voice.groupings {
        let entries = &grouping.grouping_entries;
        let beamed = entries.len() >= 2
            && entries.iter().all(|entry| {
                entry
                    .chord
                    .as_ref()
                    .map_or(false, |chord| chord.stem.stem_type.is_beamable())
            });
        for (index, entry) in entries.iter().enumerate() {
            let mut token = render_entry(entry, measure);
            if beamed && index == 0 {
                token.push('[');
            }
            if beamed && index + 1 == entries.len() {
                token.push(']');
            }
            tokens.push(token);
        }
    }
    tokens.join(" ")
}

fn render_entry(entry: &GroupingEntryDto, measure: &MeasureDto) -> String {
    if let Some(rest) = &entry.rest {
        return format!("r{}", rest.rest_type.denominator());
    }
    let Some(chord) = &entry.chord else {
        return String::new();
    };
    let duration = format!(
        "{}{}",
        chord.stem.stem_type.denominator(),
        ".".repeat(chord.dot_count as usize)
    );
    let pitches: Vec<String> = chord
        .notes
        .iter()
        .map(|note| {
            Pitch::resolve(
                note.note_id.position,
                measure.clef,
                measure.key_signature,
                note.accidental,
            )
            .lilypond()
        })
        .collect();
    match pitches.len() {
        // a chord without notes keeps its time as a spacer
        0 => format!("s{}", duration),
        1 => format!("{}{}", pitches.join(""), duration),
        _ => format!("<{}>{}", pitches.join(" "), duration),
    }
}
