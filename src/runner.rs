use crate::assigner::{assign_teachers, AssignmentReport};
use crate::error::Result;
use crate::fingerprint::{electives_fingerprint, main_fingerprint};
use crate::ledger::UsageLedger;
use crate::solver::{solve_auto, solve_electives, ElectiveProblem, ElectiveSolve, ModelOutcome, ScheduleProblem};
use crate::store::{RunKind, ScheduleStore, StoreState};
use crate::types::{ScheduleInput, SlotKind};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

/// Options of one main-schedule run
#[derive(Debug, Clone)]
pub struct MainRunOptions {
    pub selected_semesters: Option<Vec<u32>>,
    pub section_size: u32,
    pub program_code: String,
    pub enable_cohort: bool,
    pub clear_existing: bool,
    pub quiet: bool,
}

impl Default for MainRunOptions {
    fn default() -> Self {
        Self {
            selected_semesters: None,
            section_size: 50,
            program_code: "A".to_string(),
            enable_cohort: false,
            clear_existing: true,
            quiet: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    Ok,
    NoChange,
    Infeasible,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub status: RunStatus,
    pub created: usize,
    pub hash: String,
}

/// Rebuild the occupied-set from persisted placements. Tables about to be
/// replaced are excluded, so a rerun never collides with its own previous
/// output.
fn build_usage(state: &StoreState, include_main: bool, include_electives: bool) -> UsageLedger {
    let mut ledger = UsageLedger::new();
    if include_main {
        for p in &state.placements {
            ledger.insert(p.kind, &p.room, p.day, p.slot);
        }
    }
    if include_electives {
        for e in &state.electives {
            ledger.insert(e.kind, &e.room, e.day, e.slot);
        }
    }
    ledger
}

fn progress_bar(quiet: bool, len: usize) -> ProgressBar {
    if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    }
}

/// Run the main scheduling pass.
///
/// The run fingerprint is computed first; when it matches the last recorded
/// main run and output rows still exist, the solver is skipped entirely and
/// `no-change` is returned. Store writes happen only after a feasible solve,
/// in one commit.
pub fn run_main(
    input: &ScheduleInput,
    store: &mut ScheduleStore,
    opts: &MainRunOptions,
) -> Result<RunSummary> {
    let semesters: Vec<u32> = opts
        .selected_semesters
        .clone()
        .unwrap_or_else(|| input.semesters());

    let hash = main_fingerprint(
        input,
        &semesters,
        opts.section_size,
        &opts.program_code,
        opts.enable_cohort,
    )?;
    if let Some(last) = store.last_run(RunKind::Main) {
        if last.input_hash == hash && !store.state.placements.is_empty() {
            return Ok(RunSummary {
                status: RunStatus::NoChange,
                created: 0,
                hash,
            });
        }
    }

    let usage = build_usage(&store.state, !opts.clear_existing, true);
    let theory_rooms = input.rooms_of(SlotKind::Theory);
    let lab_rooms = input.rooms_of(SlotKind::Lab);
    let cohorts = input.cohort_map();
    let problem = ScheduleProblem {
        semesters: &semesters,
        courses_by_semester: &input.courses_by_semester,
        student_counts: &input.student_counts,
        catalog: &input.catalog,
        theory_rooms: &theory_rooms,
        lab_rooms: &lab_rooms,
        special_labs: &input.special_labs,
        cohorts: &cohorts,
        enable_cohort: opts.enable_cohort,
        section_size: opts.section_size,
        program_code: &opts.program_code,
        constraints: &input.constraints,
        hints: &input.hints,
    };

    let progress = progress_bar(opts.quiet, semesters.len());
    let outcome = solve_auto(&problem, &usage, &progress)?;
    progress.finish_and_clear();

    match outcome {
        ModelOutcome::Infeasible => Ok(RunSummary {
            status: RunStatus::Infeasible,
            created: 0,
            hash,
        }),
        ModelOutcome::Feasible(out) => {
            if opts.clear_existing {
                store.state.placements.clear();
            }
            let created = out.placements.len();
            store.state.placements.extend(out.placements);
            store.record_run(RunKind::Main, hash.clone(), created);
            store.commit()?;
            Ok(RunSummary {
                status: RunStatus::Ok,
                created,
                hash,
            })
        }
    }
}

/// Run the elective pass on top of the persisted main schedule
pub fn run_electives(
    input: &ScheduleInput,
    store: &mut ScheduleStore,
    theory_needed: u32,
    lab_needed: u32,
    clear_existing: bool,
) -> Result<RunSummary> {
    let hash = electives_fingerprint(input, &store.state.placements, theory_needed, lab_needed)?;
    if let Some(last) = store.last_run(RunKind::Electives) {
        if last.input_hash == hash && !store.state.electives.is_empty() {
            return Ok(RunSummary {
                status: RunStatus::NoChange,
                created: 0,
                hash,
            });
        }
    }

    let usage = build_usage(&store.state, true, !clear_existing);
    let theory_rooms = input.rooms_of(SlotKind::Theory);
    let lab_rooms = input.rooms_of(SlotKind::Lab);
    let problem = ElectiveProblem {
        electives: &input.electives,
        catalog: &input.catalog,
        theory_rooms: &theory_rooms,
        lab_rooms: &lab_rooms,
        theory_needed,
        lab_needed,
        hints: &input.hints,
    };

    match solve_electives(&problem, &usage)? {
        ElectiveSolve::Infeasible => Ok(RunSummary {
            status: RunStatus::Infeasible,
            created: 0,
            hash,
        }),
        ElectiveSolve::Feasible(out) => {
            if clear_existing {
                store.state.electives.clear();
            }
            let created = out.placements.len();
            store.state.electives.extend(out.placements);
            store.record_run(RunKind::Electives, hash.clone(), created);
            store.commit()?;
            Ok(RunSummary {
                status: RunStatus::Ok,
                created,
                hash,
            })
        }
    }
}

/// Run the teacher-assignment pass over persisted placements. Assignments
/// are computed in memory and written back in a single commit.
pub fn run_teacher_assignment(
    input: &ScheduleInput,
    store: &mut ScheduleStore,
    clear_existing: bool,
) -> Result<AssignmentReport> {
    if clear_existing {
        for p in &mut store.state.placements {
            p.teacher = None;
        }
    }
    let report = assign_teachers(&mut store.state.placements, &input.preferences);
    if clear_existing || report.assigned > 0 {
        store.commit()?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Room, RoomName, Subject, SubjectCode, TeacherName, TeacherPreference};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store(tag: &str) -> (ScheduleStore, PathBuf) {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("uni-timetabler-run-{}-{}.json", tag, nanos));
        (ScheduleStore::open(&path).unwrap(), path)
    }

    fn small_input() -> ScheduleInput {
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
        input.student_counts.insert(1, 40);
        input.rooms.push(Room {
            name: RoomName("R1".to_string()),
            kind: SlotKind::Theory,
            capacity: 50,
        });
        input
    }

    #[test]
    fn test_identical_rerun_returns_no_change() {
        let input = small_input();
        let (mut store, path) = temp_store("nochange");

        let first = run_main(&input, &mut store, &MainRunOptions::default()).unwrap();
        assert_eq!(first.status, RunStatus::Ok);
        assert_eq!(first.created, 2);

        let second = run_main(&input, &mut store, &MainRunOptions::default()).unwrap();
        assert_eq!(second.status, RunStatus::NoChange);
        assert_eq!(second.created, 0);
        assert_eq!(second.hash, first.hash);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_changed_input_triggers_fresh_run() {
        let mut input = small_input();
        let (mut store, path) = temp_store("changed");

        let first = run_main(&input, &mut store, &MainRunOptions::default()).unwrap();
        assert_eq!(first.status, RunStatus::Ok);

        input.courses_by_semester.get_mut(&1).unwrap()[0].times_needed = 1;
        let second = run_main(&input, &mut store, &MainRunOptions::default()).unwrap();
        assert_eq!(second.status, RunStatus::Ok);
        assert_ne!(second.hash, first.hash);
        assert_eq!(store.state.placements.len(), 1);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_electives_build_on_main_footprint() {
        let mut input = small_input();
        input.electives.push(crate::types::Elective {
            code: SubjectCode("E1".to_string()),
            name: "Elective".to_string(),
            sections_count: 1,
            can_use_theory: true,
            can_use_lab: false,
        });
        let (mut store, path) = temp_store("electives");

        run_main(&input, &mut store, &MainRunOptions::default()).unwrap();
        let first = run_electives(&input, &mut store, 2, 1, true).unwrap();
        assert_eq!(first.status, RunStatus::Ok);
        assert_eq!(first.created, 2);

        // Elective cells never collide with main-schedule cells
        for e in &store.state.electives {
            for p in &store.state.placements {
                assert_ne!(
                    (e.kind, &e.room, e.day, e.slot),
                    (p.kind, &p.room, p.day, p.slot)
                );
            }
        }

        let second = run_electives(&input, &mut store, 2, 1, true).unwrap();
        assert_eq!(second.status, RunStatus::NoChange);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_teacher_assignment_writes_back() {
        let input = {
            let mut input = small_input();
            input.preferences.push(TeacherPreference {
                teacher: TeacherName("Alice".to_string()),
                course_code: "CS101".to_string(),
                sections_count: 2,
                can_theory: true,
                can_lab: false,
            });
            input
        };
        let (mut store, path) = temp_store("teachers");

        run_main(&input, &mut store, &MainRunOptions::default()).unwrap();
        let report = run_teacher_assignment(&input, &mut store, false).unwrap();
        assert_eq!(report.assigned, 2);

        let reloaded = ScheduleStore::open(&path).unwrap();
        assert!(reloaded
            .state
            .placements
            .iter()
            .all(|p| p.teacher == Some(TeacherName("Alice".to_string()))));

        std::fs::remove_file(&path).ok();
    }
}
