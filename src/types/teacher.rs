use super::{SlotKind, SubjectCode, TeacherName};
use serde::{Deserialize, Serialize};

pub const WILDCARD_COURSE: &str = "*";

/// One row of uploaded teacher preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherPreference {
    pub teacher: TeacherName,
    /// Course code, or `*` for any course
    pub course_code: String,
    /// Number of placements this preference may claim
    pub sections_count: u32,
    pub can_theory: bool,
    pub can_lab: bool,
}

impl TeacherPreference {
    pub fn is_wildcard_course(&self) -> bool {
        self.course_code == WILDCARD_COURSE
    }

    /// A preference covering both kinds is a wildcard on kind
    pub fn is_wildcard_kind(&self) -> bool {
        self.can_theory && self.can_lab
    }

    pub fn matches_course(&self, code: &SubjectCode) -> bool {
        self.is_wildcard_course() || self.course_code == code.0
    }

    pub fn allows(&self, kind: SlotKind) -> bool {
        match kind {
            SlotKind::Theory => self.can_theory,
            SlotKind::Lab => self.can_lab,
        }
    }

    /// Specificity tier, 0 = most specific:
    /// 0 specific course + specific kind, 1 specific course + any kind,
    /// 2 any course + specific kind, 3 any course + any kind.
    pub fn priority(&self) -> u8 {
        match (self.is_wildcard_course(), self.is_wildcard_kind()) {
            (false, false) => 0,
            (false, true) => 1,
            (true, false) => 2,
            (true, true) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pref(course: &str, can_theory: bool, can_lab: bool) -> TeacherPreference {
        TeacherPreference {
            teacher: TeacherName("T".to_string()),
            course_code: course.to_string(),
            sections_count: 1,
            can_theory,
            can_lab,
        }
    }

    #[test]
    fn test_priority_tiers() {
        assert_eq!(pref("CS201", true, false).priority(), 0);
        assert_eq!(pref("CS201", true, true).priority(), 1);
        assert_eq!(pref("*", false, true).priority(), 2);
        assert_eq!(pref("*", true, true).priority(), 3);
    }

    #[test]
    fn test_wildcard_matches_any_course() {
        let p = pref("*", true, true);
        assert!(p.matches_course(&SubjectCode("CS201".into())));
        let q = pref("CS201", true, true);
        assert!(q.matches_course(&SubjectCode("CS201".into())));
        assert!(!q.matches_course(&SubjectCode("CS202".into())));
    }
}
