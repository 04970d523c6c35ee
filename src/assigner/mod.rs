use crate::types::{Placement, SlotKind, TeacherName, TeacherPreference};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of one teacher-assignment pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignStatus {
    Ok,
    NoSlots,
    NoPreferences,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentReport {
    pub status: AssignStatus,
    pub assigned: usize,
    pub unassigned: usize,
    pub total_slots: usize,
    pub workloads: BTreeMap<TeacherName, usize>,
    pub warnings: Vec<String>,
}

/// Match teacher preferences to already-placed slots, most specific
/// preference first.
///
/// Preferences are ranked by specificity (course+kind, course+any,
/// any+kind, any+any), ties broken by course code then teacher name. Each
/// preference claims up to `sections_count` matching placements, skipping any
/// whose time cell the teacher already holds. Assignments are final: a later
/// preference never steals from an earlier one. All writes are staged and
/// applied in one batch at the end.
pub fn assign_teachers(
    placements: &mut [Placement],
    preferences: &[TeacherPreference],
) -> AssignmentReport {
    let unassigned: Vec<usize> = placements
        .iter()
        .enumerate()
        .filter(|(_, p)| p.teacher.is_none())
        .map(|(i, _)| i)
        .collect();

    if unassigned.is_empty() {
        return AssignmentReport {
            status: AssignStatus::NoSlots,
            assigned: 0,
            unassigned: 0,
            total_slots: 0,
            workloads: BTreeMap::new(),
            warnings: vec!["No unassigned timetable slots found".to_string()],
        };
    }
    if preferences.is_empty() {
        return AssignmentReport {
            status: AssignStatus::NoPreferences,
            assigned: 0,
            unassigned: unassigned.len(),
            total_slots: unassigned.len(),
            workloads: BTreeMap::new(),
            warnings: vec!["No teacher preferences uploaded".to_string()],
        };
    }

    // Deterministic scan order over the open placements
    let mut scan_order = unassigned.clone();
    scan_order.sort_by(|&a, &b| {
        let pa = &placements[a];
        let pb = &placements[b];
        (&pa.subject, &pa.section, pa.day, pa.kind, pa.slot)
            .cmp(&(&pb.subject, &pb.section, pb.day, pb.kind, pb.slot))
    });

    let mut ranked: Vec<&TeacherPreference> = preferences.iter().collect();
    ranked.sort_by(|a, b| {
        (a.priority(), &a.course_code, &a.teacher)
            .cmp(&(b.priority(), &b.course_code, &b.teacher))
    });

    let mut taken: BTreeSet<usize> = BTreeSet::new();
    let mut busy: BTreeMap<&TeacherName, BTreeSet<(u8, SlotKind, usize)>> = BTreeMap::new();
    let mut staged: Vec<(usize, TeacherName)> = Vec::new();

    for pref in &ranked {
        let mut claimed = 0u32;
        for &i in &scan_order {
            if claimed >= pref.sections_count {
                break;
            }
            if taken.contains(&i) {
                continue;
            }
            let placement = &placements[i];
            if !pref.matches_course(&placement.subject) {
                continue;
            }
            if !pref.allows(placement.kind) {
                continue;
            }
            let cells = busy.entry(&pref.teacher).or_default();
            if cells.contains(&placement.slot_key()) {
                continue;
            }
            cells.insert(placement.slot_key());
            taken.insert(i);
            staged.push((i, pref.teacher.clone()));
            claimed += 1;
        }
    }

    // Single batch write
    let mut workloads: BTreeMap<TeacherName, usize> = BTreeMap::new();
    for (i, teacher) in staged {
        *workloads.entry(teacher.clone()).or_insert(0) += 1;
        placements[i].teacher = Some(teacher);
    }

    let total_slots = unassigned.len();
    let assigned = taken.len();
    let left = total_slots - assigned;

    let mut warnings: Vec<String> = workloads
        .iter()
        .map(|(teacher, count)| format!("{}: {} slots assigned", teacher, count))
        .collect();
    if left > 0 {
        warnings.push(format!(
            "{} slots remain unassigned (no matching teachers)",
            left
        ));
    }

    AssignmentReport {
        status: AssignStatus::Ok,
        assigned,
        unassigned: left,
        total_slots,
        workloads,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RoomName, SectionName, SubjectCode};

    fn placement(subject: &str, section: &str, day: u8, kind: SlotKind, slot: usize) -> Placement {
        Placement {
            section: SectionName(section.to_string()),
            subject: SubjectCode(subject.to_string()),
            room: RoomName(format!("{}-{}-{}", subject, day, slot)),
            day,
            kind,
            slot,
            cohort_label: None,
            teacher: None,
        }
    }

    fn pref(
        teacher: &str,
        course: &str,
        count: u32,
        can_theory: bool,
        can_lab: bool,
    ) -> TeacherPreference {
        TeacherPreference {
            teacher: TeacherName(teacher.to_string()),
            course_code: course.to_string(),
            sections_count: count,
            can_theory,
            can_lab,
        }
    }

    #[test]
    fn test_specific_preferences_claim_before_wildcards() {
        // CS201: four theory meetings and two lab blocks
        let mut placements = vec![
            placement("CS201", "S1A1", 0, SlotKind::Theory, 0),
            placement("CS201", "S1A1", 2, SlotKind::Theory, 1),
            placement("CS201", "S1A2", 1, SlotKind::Theory, 0),
            placement("CS201", "S1A2", 3, SlotKind::Theory, 1),
            placement("CS201", "S1A1", 4, SlotKind::Lab, 0),
            placement("CS201", "S1A2", 5, SlotKind::Lab, 1),
        ];
        let prefs = vec![
            pref("Bob", "*", 10, true, true),
            pref("Alice", "CS201", 3, true, false),
        ];

        let report = assign_teachers(&mut placements, &prefs);

        assert_eq!(report.status, AssignStatus::Ok);
        assert_eq!(report.assigned, 6);
        assert_eq!(report.unassigned, 0);
        assert_eq!(report.workloads[&TeacherName("Alice".to_string())], 3);
        assert_eq!(report.workloads[&TeacherName("Bob".to_string())], 3);

        // Alice's three must all be theory
        for p in placements
            .iter()
            .filter(|p| p.teacher == Some(TeacherName("Alice".to_string())))
        {
            assert_eq!(p.kind, SlotKind::Theory);
        }
        // Bob covers the rest, labs included
        let bob_labs = placements
            .iter()
            .filter(|p| {
                p.teacher == Some(TeacherName("Bob".to_string())) && p.kind == SlotKind::Lab
            })
            .count();
        assert_eq!(bob_labs, 2);
    }

    #[test]
    fn test_teacher_never_double_booked_in_one_cell() {
        // Two placements in the same (day, kind, slot) cell, different rooms
        let mut placements = vec![
            placement("CS201", "S1A1", 0, SlotKind::Theory, 0),
            placement("CS201", "S1A2", 0, SlotKind::Theory, 0),
        ];
        let prefs = vec![pref("Alice", "CS201", 5, true, false)];

        let report = assign_teachers(&mut placements, &prefs);

        assert_eq!(report.assigned, 1);
        assert_eq!(report.unassigned, 1);
    }

    #[test]
    fn test_sections_count_caps_claims() {
        let mut placements = vec![
            placement("MA101", "S1A1", 0, SlotKind::Theory, 0),
            placement("MA101", "S1A1", 2, SlotKind::Theory, 0),
            placement("MA101", "S1A2", 4, SlotKind::Theory, 0),
        ];
        let prefs = vec![pref("Carol", "MA101", 2, true, false)];

        let report = assign_teachers(&mut placements, &prefs);
        assert_eq!(report.assigned, 2);
        assert_eq!(report.unassigned, 1);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("remain unassigned")));
    }

    #[test]
    fn test_kind_compatibility_is_enforced() {
        let mut placements = vec![placement("PH102", "S1A1", 0, SlotKind::Lab, 0)];
        let prefs = vec![pref("Dave", "PH102", 1, true, false)];

        let report = assign_teachers(&mut placements, &prefs);
        assert_eq!(report.assigned, 0);
        assert!(placements[0].teacher.is_none());
    }

    #[test]
    fn test_ties_break_by_course_then_teacher_name() {
        let mut placements = vec![placement("AA100", "S1A1", 0, SlotKind::Theory, 0)];
        // Same tier; "AA100" sorts before "ZZ900", and the matching course
        // preference belongs to Zoe
        let prefs = vec![
            pref("Abe", "ZZ900", 1, true, false),
            pref("Zoe", "AA100", 1, true, false),
        ];

        let report = assign_teachers(&mut placements, &prefs);
        assert_eq!(report.assigned, 1);
        assert_eq!(
            placements[0].teacher,
            Some(TeacherName("Zoe".to_string()))
        );
    }

    #[test]
    fn test_empty_inputs_short_circuit() {
        let mut placements: Vec<Placement> = Vec::new();
        let report = assign_teachers(&mut placements, &[]);
        assert_eq!(report.status, AssignStatus::NoSlots);

        let mut placements = vec![placement("CS201", "S1A1", 0, SlotKind::Theory, 0)];
        let report = assign_teachers(&mut placements, &[]);
        assert_eq!(report.status, AssignStatus::NoPreferences);
        assert_eq!(report.unassigned, 1);
    }
}
