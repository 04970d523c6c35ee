use crate::error::Result;
use crate::types::{Placement, ScheduleInput, SlotKind};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// SHA-256 over the canonical JSON form of a payload. Payloads are built
/// from BTree maps and pre-sorted vectors, so the digest is independent of
/// input row and key order.
fn digest(payload: &impl Serialize) -> Result<String> {
    let bytes = serde_json::to_vec(payload)?;
    let hash = Sha256::digest(&bytes);
    Ok(hash.iter().map(|b| format!("{:02x}", b)).collect())
}

#[derive(Serialize)]
struct MainPayload {
    selected_semesters: Vec<u32>,
    section_sizes: BTreeMap<u32, u32>,
    semester_courses: BTreeMap<u32, Vec<(String, bool, u32)>>,
    theory_rooms: Vec<String>,
    lab_rooms: Vec<String>,
    theory_windows: Vec<String>,
    lab_windows: Vec<String>,
    special_labs: BTreeMap<String, Vec<String>>,
    cohort: Option<Vec<(u32, String, String, u32, u8, usize, String)>>,
    program_code: String,
    section_size: u32,
    enable_cohort: bool,
    constraints: ConstraintsPayload,
}

#[derive(Serialize)]
struct ConstraintsPayload {
    max_hours_per_day: u32,
    working_days_per_week: u32,
    min_gap_minutes: u32,
    no_classes_after_hour: Option<u32>,
}

/// Fingerprint of a main-schedule run's inputs. Excludes the volatile usage
/// ledger: the same tables with the same options always hash the same.
pub fn main_fingerprint(
    input: &ScheduleInput,
    selected_semesters: &[u32],
    section_size: u32,
    program_code: &str,
    enable_cohort: bool,
) -> Result<String> {
    let mut semesters = selected_semesters.to_vec();
    semesters.sort_unstable();
    semesters.dedup();

    let semester_courses = input
        .courses_by_semester
        .iter()
        .map(|(sem, courses)| {
            let mut rows: Vec<(String, bool, u32)> = courses
                .iter()
                .map(|c| (c.code.0.clone(), c.is_lab, c.times_needed))
                .collect();
            rows.sort();
            (*sem, rows)
        })
        .collect();

    let mut theory_rooms: Vec<String> = input
        .rooms_of(SlotKind::Theory)
        .into_iter()
        .map(|r| r.0)
        .collect();
    theory_rooms.sort();
    let mut lab_rooms: Vec<String> = input
        .rooms_of(SlotKind::Lab)
        .into_iter()
        .map(|r| r.0)
        .collect();
    lab_rooms.sort();

    let special_labs = input
        .special_labs
        .iter()
        .map(|(code, rooms)| {
            let mut names: Vec<String> = rooms.iter().map(|r| r.0.clone()).collect();
            names.sort();
            (code.0.clone(), names)
        })
        .collect();

    let cohort = if enable_cohort {
        let mut rows: Vec<(u32, String, String, u32, u8, usize, String)> = input
            .cohorts
            .iter()
            .map(|o| {
                (
                    o.semester,
                    o.subject.0.clone(),
                    o.label.clone(),
                    o.capacity,
                    o.day,
                    o.slot,
                    o.kind.as_str().to_string(),
                )
            })
            .collect();
        rows.sort();
        Some(rows)
    } else {
        None
    };

    digest(&MainPayload {
        selected_semesters: semesters,
        section_sizes: input.student_counts.clone(),
        semester_courses,
        theory_rooms,
        lab_rooms,
        theory_windows: input.catalog.windows(SlotKind::Theory),
        lab_windows: input.catalog.windows(SlotKind::Lab),
        special_labs,
        cohort,
        program_code: program_code.to_string(),
        section_size,
        enable_cohort,
        constraints: ConstraintsPayload {
            max_hours_per_day: input.constraints.max_hours_per_day,
            working_days_per_week: input.constraints.working_days_per_week,
            min_gap_minutes: input.constraints.min_gap_minutes,
            no_classes_after_hour: input.constraints.no_classes_after_hour,
        },
    })
}

#[derive(Serialize)]
struct ElectivesPayload {
    theory_rooms: Vec<String>,
    lab_rooms: Vec<String>,
    theory_windows: Vec<String>,
    lab_windows: Vec<String>,
    electives: Vec<(String, u32, bool, bool)>,
    theory_needed: u32,
    lab_needed: u32,
    timetable: Vec<(String, String, u8, usize)>,
}

/// Fingerprint of an electives run: the elective table, the week geometry
/// and the footprint of the main timetable the electives build on.
pub fn electives_fingerprint(
    input: &ScheduleInput,
    placements: &[Placement],
    theory_needed: u32,
    lab_needed: u32,
) -> Result<String> {
    let mut theory_rooms: Vec<String> = input
        .rooms_of(SlotKind::Theory)
        .into_iter()
        .map(|r| r.0)
        .collect();
    theory_rooms.sort();
    let mut lab_rooms: Vec<String> = input
        .rooms_of(SlotKind::Lab)
        .into_iter()
        .map(|r| r.0)
        .collect();
    lab_rooms.sort();

    let mut electives: Vec<(String, u32, bool, bool)> = input
        .electives
        .iter()
        .map(|e| {
            (
                e.code.0.clone(),
                e.sections_count,
                e.can_use_theory,
                e.can_use_lab,
            )
        })
        .collect();
    electives.sort();

    let mut timetable: Vec<(String, String, u8, usize)> = placements
        .iter()
        .map(|p| {
            (
                p.kind.as_str().to_string(),
                p.room.0.clone(),
                p.day,
                p.slot,
            )
        })
        .collect();
    timetable.sort();

    digest(&ElectivesPayload {
        theory_rooms,
        lab_rooms,
        theory_windows: input.catalog.windows(SlotKind::Theory),
        lab_windows: input.catalog.windows(SlotKind::Lab),
        electives,
        theory_needed,
        lab_needed,
        timetable,
    })
}
