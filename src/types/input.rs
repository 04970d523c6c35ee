use super::{
    CohortOffering, Elective, Room, RoomName, ScheduleConstraints, SlotCatalog, SlotKind,
    SolverHints, Subject, SubjectCode, TeacherPreference,
};
use std::collections::{BTreeMap, BTreeSet};

/// All imported tables bundled together
#[derive(Debug, Clone, Default)]
pub struct ScheduleInput {
    pub courses_by_semester: BTreeMap<u32, Vec<Subject>>,
    pub rooms: Vec<Room>,
    /// Semester -> student head-count
    pub student_counts: BTreeMap<u32, u32>,
    pub electives: Vec<Elective>,
    /// Lab subjects that must use a fixed subset of lab rooms
    pub special_labs: BTreeMap<SubjectCode, BTreeSet<RoomName>>,
    pub catalog: SlotCatalog,
    pub cohorts: Vec<CohortOffering>,
    pub preferences: Vec<TeacherPreference>,
    pub constraints: ScheduleConstraints,
    pub hints: SolverHints,
}

impl ScheduleInput {
    pub fn semesters(&self) -> Vec<u32> {
        self.courses_by_semester.keys().copied().collect()
    }

    pub fn rooms_of(&self, kind: SlotKind) -> Vec<RoomName> {
        self.rooms
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.name.clone())
            .collect()
    }

    /// Cohort offerings grouped by (semester, subject)
    pub fn cohort_map(&self) -> BTreeMap<(u32, SubjectCode), Vec<CohortOffering>> {
        let mut map: BTreeMap<(u32, SubjectCode), Vec<CohortOffering>> = BTreeMap::new();
        for offering in &self.cohorts {
            map.entry((offering.semester, offering.subject.clone()))
                .or_default()
                .push(offering.clone());
        }
        map
    }

    pub fn subject(&self, code: &SubjectCode) -> Option<&Subject> {
        self.courses_by_semester
            .values()
            .flatten()
            .find(|s| &s.code == code)
    }
}
