//! Composite identifiers
//!
//! Every record below the staff system is identified by its parent's id plus
//! its order among its siblings. Ids derive `Ord` with the parent first, so
//! all children of one parent form a contiguous key range in the store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScoreError;

/// Identifier of a top-level staff system (the score document)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct StaffSystemId {
    pub staff_system_id: Uuid,
}

impl StaffSystemId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self {
            staff_system_id: Uuid::new_v4(),
        }
    }
}

impl Default for StaffSystemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StaffSystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.staff_system_id)
    }
}

impl FromStr for StaffSystemId {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            staff_system_id: Uuid::parse_str(s.trim())?,
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct StaffId {
    pub staff_system_id: StaffSystemId,
    pub staves_order: u32,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct MeasureId {
    pub staff_id: StaffId,
    pub measures_order: u32,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct VoiceId {
    pub measure_id: MeasureId,
    pub voices_order: u32,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct GroupingId {
    pub voice_id: VoiceId,
    pub groupings_order: u32,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct GroupingEntryId {
    pub grouping_id: GroupingId,
    pub grouping_entries_order: u32,
}

/// A chord shares the id of the grouping entry that holds it
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct ChordId {
    pub grouping_entry_id: GroupingEntryId,
}

/// A rest shares the id of the grouping entry that holds it
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct RestId {
    pub grouping_entry_id: GroupingEntryId,
}

/// Notes are keyed by their vertical position inside the chord
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct NoteId {
    pub chord_id: ChordId,
    pub position: i32,
}

impl StaffSystemId {
    pub fn staff(self, staves_order: u32) -> StaffId {
        StaffId {
            staff_system_id: self,
            staves_order,
        }
    }
}

impl StaffId {
    pub fn measure(self, measures_order: u32) -> MeasureId {
        MeasureId {
            staff_id: self,
            measures_order,
        }
    }
}

impl MeasureId {
    pub fn voice(self, voices_order: u32) -> VoiceId {
        VoiceId {
            measure_id: self,
            voices_order,
        }
    }

    /// The measure at the same index on another staff
    pub fn on_staff(self, staves_order: u32) -> MeasureId {
        self.staff_id
            .staff_system_id
            .staff(staves_order)
            .measure(self.measures_order)
    }
}

impl VoiceId {
    pub fn grouping(self, groupings_order: u32) -> GroupingId {
        GroupingId {
            voice_id: self,
            groupings_order,
        }
    }
}

impl GroupingId {
    pub fn entry(self, grouping_entries_order: u32) -> GroupingEntryId {
        GroupingEntryId {
            grouping_id: self,
            grouping_entries_order,
        }
    }
}

impl GroupingEntryId {
    pub fn chord(self) -> ChordId {
        ChordId {
            grouping_entry_id: self,
        }
    }

    pub fn rest(self) -> RestId {
        RestId {
            grouping_entry_id: self,
        }
    }

    pub fn voice_id(&self) -> VoiceId {
        self.grouping_id.voice_id
    }

    pub fn measure_id(&self) -> MeasureId {
        self.grouping_id.voice_id.measure_id
    }
}

impl ChordId {
    pub fn note(self, position: i32) -> NoteId {
        NoteId {
            chord_id: self,
            position,
        }
    }
}

/// Every id knows which staff system it belongs to
pub trait ScopedId {
    fn staff_system_id(&self) -> StaffSystemId;
}

/// An id that is ordered under a parent id
pub trait ChildId: Sized + Ord + Copy {
    type Parent: Ord + Copy + fmt::Debug;

    fn parent(&self) -> Self::Parent;

    /// Smallest possible child key of `parent`
    fn first_of(parent: Self::Parent) -> Self;

    /// Largest possible child key of `parent`
    fn last_of(parent: Self::Parent) -> Self;
}

impl ScopedId for StaffSystemId {
    fn staff_system_id(&self) -> StaffSystemId {
        *self
    }
}

macro_rules! scoped_via {
    ($ty:ty, $field:ident) => {
        impl ScopedId for $ty {
            fn staff_system_id(&self) -> StaffSystemId {
                self.$field.staff_system_id()
            }
        }
    };
}

scoped_via!(StaffId, staff_system_id);
scoped_via!(MeasureId, staff_id);
scoped_via!(VoiceId, measure_id);
scoped_via!(GroupingId, voice_id);
scoped_via!(GroupingEntryId, grouping_id);
scoped_via!(ChordId, grouping_entry_id);
scoped_via!(RestId, grouping_entry_id);
scoped_via!(NoteId, chord_id);

macro_rules! ordered_child {
    ($ty:ident, $parent:ty, $parent_field:ident, $order:ident) => {
        impl ChildId for $ty {
            type Parent = $parent;

            fn parent(&self) -> $parent {
                self.$parent_field
            }

            fn first_of(parent: $parent) -> Self {
                $ty {
                    $parent_field: parent,
                    $order: 0,
                }
            }

            fn last_of(parent: $parent) -> Self {
                $ty {
                    $parent_field: parent,
                    $order: u32::MAX,
                }
            }
        }

        impl $ty {
            /// Position of this record among its siblings
            pub fn index(&self) -> usize {
                self.$order as usize
            }
        }
    };
}

ordered_child!(StaffId, StaffSystemId, staff_system_id, staves_order);
ordered_child!(MeasureId, StaffId, staff_id, measures_order);
ordered_child!(VoiceId, MeasureId, measure_id, voices_order);
ordered_child!(GroupingId, VoiceId, voice_id, groupings_order);
ordered_child!(GroupingEntryId, GroupingId, grouping_id, grouping_entries_order);

impl ChildId for NoteId {
    type Parent = ChordId;

    fn parent(&self) -> ChordId {
        self.chord_id
    }

    fn first_of(parent: ChordId) -> Self {
        parent.note(i32::MIN)
    }

    fn last_of(parent: ChordId) -> Self {
        parent.note(i32::MAX)
    }
}
