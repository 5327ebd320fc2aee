// MusicXML export, checked by parsing the produced document

use quick_xml::events::Event;
use quick_xml::Reader;

use kme_wasm::models::dto::{GroupingEntryDto, MeasureDto, StaffDto, StaffSystemDto};
use kme_wasm::models::elements::{Clef, KeySignature, StemType, TimeSignature};
use kme_wasm::models::ids::StaffSystemId;
use kme_wasm::renderers::to_musicxml;
use kme_wasm::service::{build_sample_staff_system, ScoreService};

/// One parsed element: its name and its text content, if any
#[derive(Debug)]
struct Element {
    name: String,
    text: String,
}

/// Flatten a document into its elements in document order
fn elements(xml: &str) -> Vec<Element> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut out: Vec<Element> = Vec::new();
    loop {
        match reader.read_event().expect("MusicXML should be well formed") {
            Event::Start(e) | Event::Empty(e) => out.push(Element {
                name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                text: String::new(),
            }),
            Event::Text(t) => {
                if let Some(last) = out.last_mut() {
                    last.text = t.unescape().unwrap().into_owned();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    out
}

fn texts<'a>(elements: &'a [Element], name: &str) -> Vec<&'a str> {
    elements
        .iter()
        .filter(|e| e.name == name)
        .map(|e| e.text.as_str())
        .collect()
}

fn sample_tree() -> StaffSystemDto {
    let mut service = ScoreService::new();
    let id = build_sample_staff_system(&mut service).unwrap();
    service.to_dto(&id).unwrap()
}

fn sample_musicxml() -> String {
    to_musicxml(&sample_tree()).expect("MusicXML export should succeed")
}

/// Durations following each element called `name`
fn durations_after<'a>(elements: &'a [Element], name: &str) -> Vec<&'a str> {
    elements
        .windows(2)
        .filter(|pair| pair[0].name == name)
        .map(|pair| pair[1].text.as_str())
        .collect()
}

fn single_measure(metadata_json: &str, entries: Vec<GroupingEntryDto>) -> StaffSystemDto {
    let id = StaffSystemId::new();
    let staff_id = id.staff(0);
    let mut measure = MeasureDto::whole_rest(
        staff_id.measure(0),
        Clef::Treble,
        KeySignature::Sharp1,
        TimeSignature::ThreeFour,
    );
    measure.voices[0].groupings[0].grouping_entries = entries;
    let mut tree = StaffSystemDto::new(id, metadata_json);
    tree.staves.push(StaffDto {
        staff_id,
        metadata_json: String::new(),
        measures: vec![measure],
    });
    tree.sync_ids();
    tree
}

#[test]
fn test_sample_parts_and_measures() {
    let xml = sample_musicxml();
    let parsed = elements(&xml);

    assert_eq!(texts(&parsed, "score-part").len(), 2);
    assert_eq!(texts(&parsed, "part").len(), 2);
    assert_eq!(texts(&parsed, "measure").len(), 8);
    assert_eq!(texts(&parsed, "part-name"), vec!["Staff 1", "Staff 2"]);
    // new row at the fourth measure of each part
    assert_eq!(texts(&parsed, "print").len(), 2);
    assert_eq!(texts(&parsed, "bar-style"), vec!["light-heavy", "light-heavy"]);
}

#[test]
fn test_sample_attributes() {
    let parsed = elements(&sample_musicxml());

    assert_eq!(texts(&parsed, "divisions"), vec!["64", "64"]);
    assert_eq!(texts(&parsed, "fifths"), vec!["-2", "-2"]);
    // bass then treble on the upper staff, treble once on the lower staff
    assert_eq!(texts(&parsed, "sign"), vec!["F", "G", "G"]);
    assert_eq!(texts(&parsed, "beats"), vec!["4", "4"]);
}

#[test]
fn test_sample_voices_are_backed_up() {
    let parsed = elements(&sample_musicxml());

    // the first measure of both staves holds two voices of a full bar
    assert_eq!(durations_after(&parsed, "backup"), vec!["256", "256"]);
    assert!(texts(&parsed, "voice").contains(&"2"));
}

#[test]
fn test_empty_chord_moves_the_voice_forward() {
    let mut tree = sample_tree();
    let entry = &mut tree.staves[0].measures[0].voices[0].groupings[0].grouping_entries[0];
    entry.chord.as_mut().unwrap().notes.clear();
    let parsed = elements(&to_musicxml(&tree).unwrap());

    assert_eq!(durations_after(&parsed, "forward"), vec!["64"]);
    // three sounding quarters plus the forward still fill the bar
    assert_eq!(durations_after(&parsed, "backup"), vec!["256", "256"]);
    assert_eq!(texts(&parsed, "step")[0], "E");
}

#[test]
fn test_sample_pitches() {
    let parsed = elements(&sample_musicxml());
    let steps = texts(&parsed, "step");
    let octaves = texts(&parsed, "octave");

    // upper staff, bass clef: F3 then E flat 2
    assert_eq!(steps[0], "F");
    assert_eq!(octaves[0], "3");
    assert_eq!(steps[1], "E");
    assert_eq!(octaves[1], "2");
    assert!(texts(&parsed, "alter").contains(&"-1"));

    // explicit double sharps on the lower staff
    assert_eq!(
        texts(&parsed, "accidental"),
        vec!["double-sharp", "double-sharp"]
    );
    assert!(texts(&parsed, "alter").contains(&"2"));
}

#[test]
fn test_beamed_chord_grouping() {
    let entry_id = StaffSystemId::new().staff(0).measure(0).voice(0).grouping(0).entry(0);
    let entries = vec![
        GroupingEntryDto::chord(entry_id, StemType::Eight, &[0, 2, 4]),
        GroupingEntryDto::chord(entry_id, StemType::Eight, &[1]),
        GroupingEntryDto::chord(entry_id, StemType::Eight, &[3]),
    ];
    let tree = single_measure("", entries);
    let parsed = elements(&to_musicxml(&tree).unwrap());

    assert_eq!(texts(&parsed, "beam"), vec!["begin", "continue", "end"]);
    assert_eq!(texts(&parsed, "chord").len(), 2);
    assert_eq!(texts(&parsed, "type"), vec!["eighth"; 5]);
    // voice 0 stems up
    assert!(texts(&parsed, "stem").iter().all(|stem| *stem == "up"));
    // G major: F is sharpened by the key, no accidental is written
    assert!(texts(&parsed, "alter").contains(&"1"));
    assert!(texts(&parsed, "accidental").is_empty());
}

#[test]
fn test_movement_title() {
    let tree = single_measure(r#"{"name":"Song & Dance"}"#, Vec::new());
    let xml = to_musicxml(&tree).unwrap();
    assert!(xml.contains("<movement-title>Song &amp; Dance</movement-title>"));

    let untitled = single_measure("", Vec::new());
    assert!(!to_musicxml(&untitled).unwrap().contains("<movement-title>"));
}
