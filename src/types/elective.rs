use super::SubjectCode;
use serde::{Deserialize, Serialize};

/// An elective offering, placed after the main schedule.
///
/// Each of its sections is scheduled as either theory meetings on
/// non-consecutive days or a single lab block, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Elective {
    pub code: SubjectCode,
    pub name: String,
    pub sections_count: u32,
    pub can_use_theory: bool,
    pub can_use_lab: bool,
}

impl Elective {
    /// Occupant label for section `idx`, e.g. `Elective-CS301-A1`
    pub fn section_label(&self, idx: usize) -> String {
        format!("Elective-{}-A{}", self.code, idx + 1)
    }
}
