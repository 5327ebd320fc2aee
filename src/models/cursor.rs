//! Editor cursor target

use serde::{Deserialize, Serialize};

use super::ids::{GroupingEntryId, NoteId, RestId};

/// The note or rest the editor acts on.
///
/// Serialized untagged as the bare id, so a stored cursor is either
/// `{"chordId": ..., "position": n}` or `{"groupingEntryId": ...}`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum Cursor {
    Note(NoteId),
    Rest(RestId),
}

impl Cursor {
    pub fn grouping_entry_id(&self) -> GroupingEntryId {
        match self {
            Cursor::Note(id) => id.chord_id.grouping_entry_id,
            Cursor::Rest(id) => id.grouping_entry_id,
        }
    }

    pub fn is_note(&self) -> bool {
        matches!(self, Cursor::Note(_))
    }

    /// The same note position or rest, addressed in another grouping entry
    pub fn moved_to(&self, entry: GroupingEntryId) -> Cursor {
        match self {
            Cursor::Note(id) => Cursor::Note(entry.chord().note(id.position)),
            Cursor::Rest(_) => Cursor::Rest(entry.rest()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ids::StaffSystemId;

    #[test]
    fn test_cursor_deserializes_by_shape() {
        let entry = StaffSystemId::new().staff(0).measure(1).voice(0).grouping(0).entry(2);
        let note = Cursor::Note(entry.chord().note(3));
        let rest = Cursor::Rest(entry.rest());

        let note_json = serde_json::to_string(&note).unwrap();
        let rest_json = serde_json::to_string(&rest).unwrap();
        assert!(note_json.contains("\"position\":3"));
        assert!(rest_json.starts_with("{\"groupingEntryId\""));

        assert_eq!(serde_json::from_str::<Cursor>(&note_json).unwrap(), note);
        assert_eq!(serde_json::from_str::<Cursor>(&rest_json).unwrap(), rest);
        assert_eq!(rest.grouping_entry_id(), entry);
    }
}
