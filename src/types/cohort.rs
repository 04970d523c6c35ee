use super::{RoomName, SlotKind, SubjectCode};
use serde::{Deserialize, Serialize};

/// A cohort course offering: a subject whose day and time are fixed in
/// advance. Normal sections choose among the offered labels instead of the
/// solver placing the course freely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortOffering {
    pub semester: u32,
    pub subject: SubjectCode,
    /// Label students sign up under, e.g. `C08-A`
    pub label: String,
    pub day: u8,
    pub slot: usize,
    pub kind: SlotKind,
    pub capacity: u32,
    #[serde(default)]
    pub room: Option<RoomName>,
}

impl CohortOffering {
    /// The room the offering occupies; synthesized when none was given
    pub fn room_label(&self) -> RoomName {
        self.room
            .clone()
            .unwrap_or_else(|| RoomName(format!("CohortRoom({}-{})", self.subject, self.label)))
    }
}
