//! In-memory record store
//!
//! One `Table` per record kind, each an ordered map keyed by the record's
//! composite id. Because ids sort parent-first, the children of a record are
//! a contiguous range and can be listed or counted without a scan.

use std::collections::BTreeMap;

use crate::error::{Result, ScoreError};
use crate::models::core::*;
use crate::models::ids::{ChildId, ScopedId, StaffSystemId};

/// Basic CRUD access to records of one kind
pub trait Repository<TEntity, TId> {
    /// Insert or replace a record, returning its id
    fn add(&mut self, entity: TEntity) -> TId;

    fn remove(&mut self, id: &TId) -> Option<TEntity>;

    /// Replace an existing record. The new record must keep the same id.
    fn update(&mut self, id: &TId, entity: TEntity) -> Result<()>;

    fn get(&self, id: &TId) -> Option<&TEntity>;

    /// All records in id order
    fn get_all(&self) -> Vec<&TEntity>;

    fn exists(&self, id: &TId) -> bool {
        self.get(id).is_some()
    }

    fn count(&self) -> usize {
        self.get_all().len()
    }
}

/// Ordered table of records keyed by id
#[derive(Clone, Debug, PartialEq)]
pub struct Table<E: Entity> {
    rows: BTreeMap<E::Id, E>,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Table<E> {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    pub fn get_mut(&mut self, id: &E::Id) -> Option<&mut E> {
        self.rows.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> + '_ {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

impl<E: Entity> Repository<E, E::Id> for Table<E> {
    fn add(&mut self, entity: E) -> E::Id {
        let id = *entity.id();
        self.rows.insert(id, entity);
        id
    }

    fn remove(&mut self, id: &E::Id) -> Option<E> {
        self.rows.remove(id)
    }

    fn update(&mut self, id: &E::Id, entity: E) -> Result<()> {
        if entity.id() != id {
            return Err(ScoreError::IdMismatch {
                expected: format!("{:?}", id),
                actual: format!("{:?}", entity.id()),
            });
        }
        match self.rows.get_mut(id) {
            Some(row) => {
                *row = entity;
                Ok(())
            }
            None => Err(ScoreError::not_found(E::KIND, id)),
        }
    }

    fn get(&self, id: &E::Id) -> Option<&E> {
        self.rows.get(id)
    }

    fn get_all(&self) -> Vec<&E> {
        self.rows.values().collect()
    }

    fn exists(&self, id: &E::Id) -> bool {
        self.rows.contains_key(id)
    }

    fn count(&self) -> usize {
        self.rows.len()
    }
}

impl<E> Table<E>
where
    E: Entity,
    E::Id: ChildId,
{
    /// Records under `parent`, in order
    pub fn children(&self, parent: <E::Id as ChildId>::Parent) -> Vec<&E> {
        self.rows
            .range(E::Id::first_of(parent)..=E::Id::last_of(parent))
            .map(|(_, row)| row)
            .collect()
    }

    pub fn count_children(&self, parent: <E::Id as ChildId>::Parent) -> usize {
        self.rows
            .range(E::Id::first_of(parent)..=E::Id::last_of(parent))
            .count()
    }
}

impl<E> Table<E>
where
    E: Entity,
    E::Id: ScopedId,
{
    /// Drop every record belonging to one staff system; returns how many went
    pub fn remove_staff_system(&mut self, staff_system_id: &StaffSystemId) -> usize {
        let before = self.rows.len();
        self.rows
            .retain(|id, _| id.staff_system_id() != *staff_system_id);
        before - self.rows.len()
    }
}

/// All tables of the score hierarchy
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreStore {
    pub staff_systems: Table<StaffSystem>,
    pub staves: Table<Staff>,
    pub measures: Table<Measure>,
    pub voices: Table<Voice>,
    pub groupings: Table<Grouping>,
    pub grouping_entries: Table<GroupingEntry>,
    pub chords: Table<Chord>,
    pub rests: Table<Rest>,
    pub notes: Table<Note>,
}

impl ScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a staff system and everything below it
    pub fn remove_staff_system(&mut self, staff_system_id: &StaffSystemId) -> usize {
        self.staff_systems.remove_staff_system(staff_system_id)
            + self.staves.remove_staff_system(staff_system_id)
            + self.measures.remove_staff_system(staff_system_id)
            + self.voices.remove_staff_system(staff_system_id)
            + self.groupings.remove_staff_system(staff_system_id)
            + self.grouping_entries.remove_staff_system(staff_system_id)
            + self.chords.remove_staff_system(staff_system_id)
            + self.rests.remove_staff_system(staff_system_id)
            + self.notes.remove_staff_system(staff_system_id)
    }

    pub fn clear(&mut self) {
        self.staff_systems.clear();
        self.staves.clear();
        self.measures.clear();
        self.voices.clear();
        self.groupings.clear();
        self.grouping_entries.clear();
        self.chords.clear();
        self.rests.clear();
        self.notes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::elements::Accidental;
    use crate::models::ids::ChordId;

    fn chord_id(system: StaffSystemId, entry: u32) -> ChordId {
        system.staff(0).measure(0).voice(0).grouping(0).entry(entry).chord()
    }

    fn note(chord: ChordId, position: i32) -> Note {
        Note {
            id: chord.note(position),
            accidental: Accidental::None,
            metadata_json: String::new(),
        }
    }

    #[test]
    fn test_crud() {
        let mut table: Table<Note> = Table::new();
        let chord = chord_id(StaffSystemId::new(), 0);

        let id = table.add(note(chord, 2));
        assert!(table.exists(&id));
        assert_eq!(table.count(), 1);

        let mut sharp = note(chord, 2);
        sharp.accidental = Accidental::Sharp;
        table.update(&id, sharp).unwrap();
        assert_eq!(table.get(&id).unwrap().accidental, Accidental::Sharp);

        // key and record must agree
        assert!(matches!(
            table.update(&id, note(chord, 3)),
            Err(ScoreError::IdMismatch { .. })
        ));
        assert!(matches!(
            table.update(&chord.note(9), note(chord, 9)),
            Err(ScoreError::NotFound { kind: "Note", .. })
        ));

        assert!(table.remove(&id).is_some());
        assert!(table.get_all().is_empty());
    }

    #[test]
    fn test_children_range_is_per_parent() {
        let system = StaffSystemId::new();
        let mut table: Table<Note> = Table::new();
        for position in [5, -3, 0] {
            table.add(note(chord_id(system, 0), position));
        }
        table.add(note(chord_id(system, 1), 0));

        let positions: Vec<i32> = table
            .children(chord_id(system, 0))
            .iter()
            .map(|n| n.id.position)
            .collect();
        assert_eq!(positions, vec![-3, 0, 5]);
        assert_eq!(table.count_children(chord_id(system, 1)), 1);
        assert_eq!(table.count_children(chord_id(system, 2)), 0);
    }

    #[test]
    fn test_remove_staff_system_keeps_others() {
        let kept = StaffSystemId::new();
        let dropped = StaffSystemId::new();
        let mut store = ScoreStore::new();
        store.notes.add(note(chord_id(kept, 0), 0));
        store.notes.add(note(chord_id(dropped, 0), 0));
        store.notes.add(note(chord_id(dropped, 1), 0));

        assert_eq!(store.remove_staff_system(&dropped), 2);
        assert_eq!(store.notes.len(), 1);
        store.clear();
        assert!(store.notes.is_empty());
    }
}
