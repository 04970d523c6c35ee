use crate::error::Result;
use crate::types::{ScheduleInput, SlotKind};

/// Validation result with collected errors and warnings
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

/// Validate the assembled input tables before any solver runs
pub fn validate_input(input: &ScheduleInput) -> Result<ValidationResult> {
    let mut result = ValidationResult::default();

    for (semester, courses) in &input.courses_by_semester {
        for course in courses {
            // The importer refuses three weekly meetings outright; the solver
            // itself does not re-check this
            if course.times_needed == 3 {
                result.add_error(format!(
                    "Course '{}' in semester {} has times_needed=3, which is not supported",
                    course.code, semester
                ));
            }
        }
        if !input.student_counts.contains_key(semester) {
            result.add_warning(format!(
                "Semester {} has courses but no student capacity row",
                semester
            ));
        }
    }

    for (semester, count) in &input.student_counts {
        if *count == 0 {
            result.add_error(format!(
                "Semester {} must have a positive student count",
                semester
            ));
        }
    }

    let mut seen_electives = std::collections::BTreeSet::new();
    for elective in &input.electives {
        if !seen_electives.insert(&elective.code) {
            result.add_error(format!("Duplicate elective code '{}'", elective.code));
        }
        if elective.sections_count == 0 {
            result.add_error(format!(
                "Elective '{}' must have sections_count > 0",
                elective.code
            ));
        }
        if elective.can_use_theory == elective.can_use_lab {
            result.add_error(format!(
                "Elective '{}' must set exactly one of can_use_theory / can_use_lab",
                elective.code
            ));
        }
    }

    let lab_rooms: Vec<_> = input
        .rooms
        .iter()
        .filter(|r| r.kind == SlotKind::Lab)
        .collect();
    for (code, rooms) in &input.special_labs {
        for room in rooms {
            if !lab_rooms.iter().any(|r| &r.name == room) {
                result.add_error(format!(
                    "Special lab for '{}' names '{}', which is not a lab room",
                    code, room
                ));
            }
        }
    }

    for offering in &input.cohorts {
        if offering.slot >= input.catalog.slots(offering.kind).len() {
            result.add_error(format!(
                "Cohort '{}' label '{}' uses {} slot {}, outside the catalog",
                offering.subject, offering.label, offering.kind, offering.slot
            ));
        }
        if offering.capacity == 0 {
            result.add_error(format!(
                "Cohort '{}' label '{}' has zero capacity",
                offering.subject, offering.label
            ));
        }
        if !input.courses_by_semester.contains_key(&offering.semester) {
            result.add_warning(format!(
                "Cohort '{}' targets semester {}, which has no roadmap",
                offering.subject, offering.semester
            ));
        }
    }

    for pref in &input.preferences {
        if pref.sections_count == 0 {
            result.add_warning(format!(
                "Preference of '{}' for '{}' has sections_count=0 and will never match",
                pref.teacher, pref.course_code
            ));
        }
        if !pref.can_theory && !pref.can_lab {
            result.add_error(format!(
                "Preference of '{}' for '{}' allows neither theory nor lab",
                pref.teacher, pref.course_code
            ));
        }
    }

    if !result.is_valid() {
        return Err(anyhow::anyhow!(
            "Validation failed with {} errors:\n{}",
            result.errors.len(),
            result.errors.join("\n")
        ));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Elective, Room, RoomName, Subject, SubjectCode};

    fn base_input() -> ScheduleInput {
        let mut input = ScheduleInput::default();
        input.courses_by_semester.insert(
            1,
            vec![Subject {
                code: SubjectCode("CS101".to_string()),
                name: "Intro".to_string(),
                is_lab: false,
                times_needed: 2,
            }],
        );
        input.student_counts.insert(1, 50);
        input.rooms.push(Room {
            name: RoomName("R1".to_string()),
            kind: SlotKind::Theory,
            capacity: 50,
        });
        input
    }

    #[test]
    fn test_valid_input_passes() {
        let result = validate_input(&base_input()).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_three_weekly_meetings_rejected() {
        let mut input = base_input();
        input.courses_by_semester.get_mut(&1).unwrap()[0].times_needed = 3;
        assert!(validate_input(&input).is_err());
    }

    #[test]
    fn test_elective_must_be_theory_xor_lab() {
        let mut input = base_input();
        input.electives.push(Elective {
            code: SubjectCode("E1".to_string()),
            name: "Elective".to_string(),
            sections_count: 1,
            can_use_theory: true,
            can_use_lab: true,
        });
        assert!(validate_input(&input).is_err());
    }

    #[test]
    fn test_zero_student_count_rejected() {
        let mut input = base_input();
        input.student_counts.insert(2, 0);
        assert!(validate_input(&input).is_err());
    }

    #[test]
    fn test_special_lab_must_name_a_lab_room() {
        let mut input = base_input();
        input.special_labs.insert(
            SubjectCode("CH101".to_string()),
            [RoomName("R1".to_string())].into_iter().collect(),
        );
        // R1 is a theory room
        assert!(validate_input(&input).is_err());
    }
}
