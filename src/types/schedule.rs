use super::{RoomName, SectionName, SlotKind, SubjectCode, TeacherName};
use serde::{Deserialize, Serialize};

/// One generated timetable entry. `(room, day, kind, slot)` is injective
/// across the whole schedule: no room is ever double-booked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub section: SectionName,
    pub subject: SubjectCode,
    pub room: RoomName,
    pub day: u8,
    pub kind: SlotKind,
    pub slot: usize,
    /// Set when the entry realizes a cohort offering
    #[serde(default)]
    pub cohort_label: Option<String>,
    #[serde(default)]
    pub teacher: Option<TeacherName>,
}

impl Placement {
    /// Ledger occupant label, e.g. `S1A1-CS201`
    pub fn occupant_label(&self) -> String {
        format!("{}-{}", self.section, self.subject)
    }

    /// The time identity of this entry within the week
    pub fn slot_key(&self) -> (u8, SlotKind, usize) {
        (self.day, self.kind, self.slot)
    }

    /// The room-cell this entry occupies
    pub fn room_key(&self) -> (SlotKind, &RoomName, u8, usize) {
        (self.kind, &self.room, self.day, self.slot)
    }
}

/// One generated elective entry, same room-cell uniqueness as `Placement`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectivePlacement {
    pub code: SubjectCode,
    /// Elective section index, 0-based
    pub section_idx: usize,
    pub room: RoomName,
    pub day: u8,
    pub kind: SlotKind,
    pub slot: usize,
}

impl ElectivePlacement {
    pub fn occupant_label(&self) -> String {
        format!("Elective-{}-A{}", self.code, self.section_idx + 1)
    }

    pub fn room_key(&self) -> (SlotKind, &RoomName, u8, usize) {
        (self.kind, &self.room, self.day, self.slot)
    }
}
