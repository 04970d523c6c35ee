use super::{SlotKind, SubjectCode};
use serde::{Deserialize, Serialize};

/// A course in a semester roadmap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub code: SubjectCode,
    pub name: String,
    #[serde(default)]
    pub is_lab: bool,
    /// Weekly sessions this course needs
    pub times_needed: u32,
}

impl Subject {
    pub fn kind(&self) -> SlotKind {
        if self.is_lab {
            SlotKind::Lab
        } else {
            SlotKind::Theory
        }
    }
}
