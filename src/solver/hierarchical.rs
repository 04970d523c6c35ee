use crate::error::Result;
use crate::ledger::UsageLedger;
use crate::solver::{solve_timetable, ModelOutcome, ScheduleProblem, SolveOutcome};
use indicatif::ProgressBar;

/// Hierarchical mode pays off once the joint model gets large: solving
/// semester-by-semester shrinks each model by the semester count.
pub fn should_use_hierarchical(
    num_semesters: usize,
    total_courses: usize,
    threshold: usize,
) -> bool {
    total_courses > threshold && num_semesters > 1
}

/// Solve the selected semesters, choosing between one-shot and hierarchical
/// mode based on problem size (or the explicit force flag).
pub fn solve_auto(
    problem: &ScheduleProblem,
    usage: &UsageLedger,
    progress: &ProgressBar,
) -> Result<ModelOutcome> {
    let total_courses: usize = problem
        .semesters
        .iter()
        .map(|sem| {
            problem
                .courses_by_semester
                .get(sem)
                .map(|c| c.len())
                .unwrap_or(0)
        })
        .sum();

    let hierarchical = problem.hints.force_hierarchical
        || should_use_hierarchical(
            problem.semesters.len(),
            total_courses,
            problem.hints.hierarchical_threshold,
        );

    if hierarchical {
        solve_hierarchical(problem, usage, progress)
    } else {
        progress.set_message("Solving timetable...".to_string());
        solve_timetable(problem, usage)
    }
}

/// Solve one semester at a time, earlier semesters binding rooms first.
///
/// The usage ledger is the only state carried between calls: each solved
/// semester's allocations are merged in before the next semester starts, so
/// later models only see the residual capacity. The first infeasible
/// semester aborts the whole run.
pub fn solve_hierarchical(
    problem: &ScheduleProblem,
    usage: &UsageLedger,
    progress: &ProgressBar,
) -> Result<ModelOutcome> {
    let mut order: Vec<u32> = problem.semesters.to_vec();
    order.sort_unstable();
    order.dedup();
    if problem.hints.semester_descending {
        order.reverse();
    }

    let mut current_usage = usage.clone();
    let mut combined = SolveOutcome::default();

    for (i, semester) in order.iter().enumerate() {
        progress.set_message(format!(
            "Solving semester {} ({}/{})...",
            semester,
            i + 1,
            order.len()
        ));

        let single = [*semester];
        let sub = ScheduleProblem {
            semesters: &single,
            ..*problem
        };

        match solve_timetable(&sub, &current_usage)? {
            ModelOutcome::Infeasible => return Ok(ModelOutcome::Infeasible),
            ModelOutcome::Feasible(out) => {
                current_usage.merge(&out.allocations);
                combined.placements.extend(out.placements);
                combined.sections_by_semester.extend(out.sections_by_semester);
                combined.cohort_choices.extend(out.cohort_choices);
                combined.allocations.extend(out.allocations);
            }
        }
        progress.inc(1);
    }

    Ok(ModelOutcome::Feasible(combined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::model::tests::{room, subject, Fixture};
    use crate::types::SlotKind;
    use std::collections::BTreeSet;

    #[test]
    fn test_decision_rule() {
        assert!(should_use_hierarchical(2, 301, 300));
        assert!(!should_use_hierarchical(1, 301, 300));
        assert!(!should_use_hierarchical(2, 300, 300));
    }

    #[test]
    fn test_two_semesters_share_rooms_without_clashes() {
        let mut fx = Fixture::new();
        fx.semesters = vec![1, 2];
        fx.counts.insert(1, 100);
        fx.counts.insert(2, 100);
        for sem in [1, 2] {
            fx.courses.insert(
                sem,
                vec![
                    subject(&format!("S{}C1", sem), false, 2),
                    subject(&format!("S{}C2", sem), false, 2),
                    subject(&format!("S{}C3", sem), false, 2),
                ],
            );
        }
        fx.theory_rooms = vec![room("R1"), room("R2")];
        fx.constraints.working_days_per_week = 5;
        fx.hints.force_hierarchical = true;

        let progress = ProgressBar::hidden();
        let outcome = solve_hierarchical(&fx.problem(), &UsageLedger::new(), &progress).unwrap();
        let out = match outcome {
            ModelOutcome::Feasible(out) => out,
            ModelOutcome::Infeasible => panic!("expected a feasible schedule"),
        };

        // 2 semesters x 2 sections x 3 courses x 2 meetings
        assert_eq!(out.placements.len(), 24);

        // No room double-booking across the two phases
        let cells: BTreeSet<(SlotKind, String, u8, usize)> = out
            .placements
            .iter()
            .map(|p| (p.kind, p.room.0.clone(), p.day, p.slot))
            .collect();
        assert_eq!(cells.len(), out.placements.len());

        // Working-day cap holds per section
        for sem in [1, 2] {
            for section in &out.sections_by_semester[&sem] {
                let days: BTreeSet<u8> = out
                    .placements
                    .iter()
                    .filter(|p| &p.section == section)
                    .map(|p| p.day)
                    .collect();
                assert!(days.len() <= 5);
            }
        }
    }

    #[test]
    fn test_infeasible_semester_aborts_run() {
        let mut fx = Fixture::new();
        fx.semesters = vec![1, 2];
        fx.counts.insert(1, 40);
        fx.counts.insert(2, 40);
        fx.courses.insert(1, vec![subject("OK1", false, 1)]);
        // Seven distinct theory days cannot fit a six-day week
        fx.courses.insert(2, vec![subject("BAD", false, 7)]);
        fx.theory_rooms = vec![room("R1")];
        fx.hints.force_hierarchical = true;

        let progress = ProgressBar::hidden();
        let outcome = solve_hierarchical(&fx.problem(), &UsageLedger::new(), &progress).unwrap();
        assert!(matches!(outcome, ModelOutcome::Infeasible));
    }
}
