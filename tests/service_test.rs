// Store, cascade and tree conversion through ScoreService

use kme_wasm::models::core::Stem;
use kme_wasm::models::dto::StaffSystemDto;
use kme_wasm::models::elements::{Accidental, Clef, KeySignature, RestType, StemType, TimeSignature};
use kme_wasm::repository::Repository;
use kme_wasm::renderers::{to_lilypond, to_musicxml};
use kme_wasm::service::{build_sample_staff_system, ScoreBuilder, ScoreService};
use kme_wasm::{EditorConfig, ScoreError, StaffSystemEditor};

fn one_measure_system(service: &mut ScoreService) -> kme_wasm::StaffSystemId {
    let mut builder = ScoreBuilder::new(service);
    builder
        .create_and_select_staff_system("")
        .unwrap()
        .append_and_select_staff("")
        .unwrap()
        .append_and_select_measure(KeySignature::None, TimeSignature::Common, Clef::Treble, "")
        .unwrap()
        .append_and_select_voice("")
        .unwrap()
        .append_and_select_grouping("")
        .unwrap()
        .append_and_select_chord(Stem::new(StemType::Half), 0, "")
        .unwrap()
        .insert_and_select_note(2, Accidental::None, "")
        .unwrap()
        .append_and_select_rest(RestType::Half, 4, "")
        .unwrap();
    builder.selected_staff_system_id().unwrap()
}

#[test]
fn test_tree_round_trip_through_store() {
    let mut service = ScoreService::new();
    let id = build_sample_staff_system(&mut service).unwrap();
    let tree = service.to_dto(&id).unwrap();

    let mut other = ScoreService::new();
    let saved = other.save_dto(&tree).unwrap();
    assert_eq!(saved, id);
    assert_eq!(other.to_dto(&id).unwrap(), tree);
}

#[test]
fn test_tree_json_uses_camel_case() {
    let mut service = ScoreService::new();
    let id = one_measure_system(&mut service);
    let tree = service.to_dto(&id).unwrap();

    let json = serde_json::to_string(&tree).unwrap();
    assert!(json.contains("\"groupingEntries\""));
    assert!(json.contains("\"metadataJson\""));
    assert!(json.contains("\"stemType\":\"Half\""));
    assert!(json.contains("\"restType\":\"Half\""));

    let parsed: StaffSystemDto = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, tree);
}

#[test]
fn test_save_dto_replaces_stored_subtree() {
    let mut service = ScoreService::new();
    let id = one_measure_system(&mut service);
    let mut tree = service.to_dto(&id).unwrap();

    // drop the rest; the stored rest must go with it
    tree.staves[0].measures[0].voices[0].groupings[0]
        .grouping_entries
        .pop();
    service.save_dto(&tree).unwrap();

    let stored = service.to_dto(&id).unwrap();
    assert_eq!(stored.staves[0].measures[0].entry_count(), 1);
    assert_eq!(service.store().rests.count(), 0);
}

#[test]
fn test_save_dto_rederives_ids_from_positions() {
    let mut service = ScoreService::new();
    let id = one_measure_system(&mut service);
    let mut tree = service.to_dto(&id).unwrap();

    let entries = &mut tree.staves[0].measures[0].voices[0].groupings[0].grouping_entries;
    entries.swap(0, 1);
    service.save_dto(&tree).unwrap();

    let stored = service.to_dto(&id).unwrap();
    let entries = &stored.staves[0].measures[0].voices[0].groupings[0].grouping_entries;
    assert!(entries[0].rest.is_some());
    assert_eq!(entries[0].grouping_entry_id.grouping_entries_order, 0);
    assert_eq!(entries[1].grouping_entry_id.grouping_entries_order, 1);
}

#[test]
fn test_save_dto_rejects_ragged_staves() {
    let mut service = ScoreService::new();
    let id = build_sample_staff_system(&mut service).unwrap();
    let mut tree = service.to_dto(&id).unwrap();
    tree.staves[1].measures.pop();

    let err = service.save_dto(&tree).unwrap_err();
    assert!(matches!(err, ScoreError::InvalidScore(_)));
    // the stored copy is untouched
    assert_eq!(service.to_dto(&id).unwrap().measure_count().unwrap(), 4);
}

#[test]
fn test_find_all_and_delete() {
    let mut service = ScoreService::new();
    let sample = build_sample_staff_system(&mut service).unwrap();
    let small = one_measure_system(&mut service);
    assert_eq!(service.find_all_dtos().unwrap().len(), 2);

    service.delete_staff_system(&sample).unwrap();
    let remaining = service.find_all_dtos().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].staff_system_id, small);
    assert!(service.to_dto(&sample).is_err());
    assert!(matches!(
        service.delete_staff_system(&sample),
        Err(ScoreError::NotFound { .. })
    ));
}

#[test]
fn test_delete_measure_renumbers_following_measures() {
    let mut service = ScoreService::new();
    let id = build_sample_staff_system(&mut service).unwrap();
    let staff = id.staff(0);

    service.delete_measure(&staff.measure(1)).unwrap();

    let measures = service.measures_of(&staff).unwrap();
    let orders: Vec<u32> = measures.iter().map(|m| m.id.measures_order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    // the treble measure that followed the deleted one moved up
    assert_eq!(service.count_voices(&staff.measure(1)).unwrap(), 1);
}

#[test]
fn test_delete_measure_keeps_staves_aligned() {
    let mut service = ScoreService::new();
    let id = build_sample_staff_system(&mut service).unwrap();

    service.delete_measure(&id.staff(0).measure(0)).unwrap();

    assert_eq!(service.count_measures(&id.staff(0)).unwrap(), 3);
    assert_eq!(service.count_measures(&id.staff(1)).unwrap(), 3);
    let tree = service.to_dto(&id).unwrap();
    assert_eq!(tree.measure_count().unwrap(), 3);
    assert!(to_lilypond(&tree).is_ok());
    assert!(to_musicxml(&tree).is_ok());
    assert!(StaffSystemEditor::new(tree.clone(), EditorConfig::default()).is_ok());
    assert!(service.save_dto(&tree).is_ok());
}
