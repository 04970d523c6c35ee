use crate::error::{Result, TimetableError};
use crate::ledger::{Allocation, UsageLedger};
use crate::types::{
    blackout, build_sections, CohortOffering, Placement, RoomName, ScheduleConstraints,
    SectionName, SlotCatalog, SlotKind, SlotTime, SolverHints, Subject, SubjectCode,
    DAYS_PER_WEEK,
};
use good_lp::solvers::highs::{highs, HighsProblem};
use good_lp::{constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel, Variable};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

/// Minutes in a day; sentinel for the span encoding
const DAY_MINUTES: f64 = 1440.0;

/// Big-M linking a day's class count to its day-in-use indicator
const DAY_USE_BIG_M: f64 = 999.0;

/// Everything one invocation of the main model needs. The usage ledger is
/// passed separately so the hierarchical driver can thread it between calls.
#[derive(Clone, Copy)]
pub struct ScheduleProblem<'a> {
    pub semesters: &'a [u32],
    pub courses_by_semester: &'a BTreeMap<u32, Vec<Subject>>,
    pub student_counts: &'a BTreeMap<u32, u32>,
    pub catalog: &'a SlotCatalog,
    pub theory_rooms: &'a [RoomName],
    pub lab_rooms: &'a [RoomName],
    pub special_labs: &'a BTreeMap<SubjectCode, BTreeSet<RoomName>>,
    pub cohorts: &'a BTreeMap<(u32, SubjectCode), Vec<CohortOffering>>,
    pub enable_cohort: bool,
    pub section_size: u32,
    pub program_code: &'a str,
    pub constraints: &'a ScheduleConstraints,
    pub hints: &'a SolverHints,
}

/// A feasible solution of the main model
#[derive(Debug, Clone, Default)]
pub struct SolveOutcome {
    pub placements: Vec<Placement>,
    pub sections_by_semester: BTreeMap<u32, Vec<SectionName>>,
    /// (section, cohort subject) -> chosen cohort label
    pub cohort_choices: BTreeMap<(SectionName, SubjectCode), String>,
    pub allocations: Vec<Allocation>,
}

/// Infeasibility is a first-class outcome, not an error
#[derive(Debug)]
pub enum ModelOutcome {
    Feasible(SolveOutcome),
    Infeasible,
}

struct SectionInfo {
    name: SectionName,
    semester: u32,
}

struct CohortEntry<'a> {
    sec: usize,
    code: SubjectCode,
    offering: &'a CohortOffering,
    var: Variable,
}

pub(crate) fn apply_hints(problem: HighsProblem, hints: &SolverHints) -> HighsProblem {
    let mut problem = problem.set_option("output_flag", "false");
    if let Some(limit) = hints.max_time_per_semester {
        problem = problem.set_option("time_limit", limit);
    }
    if let Some(workers) = hints.num_workers {
        problem = problem.set_option("threads", workers as i32);
    }
    problem
}

fn sum_of(list: &[Variable]) -> Expression {
    list.iter().copied().map(Expression::from).sum()
}

fn offerings_clash(a: &CohortOffering, b: &CohortOffering, catalog: &SlotCatalog) -> bool {
    if a.day != b.day {
        return false;
    }
    match (a.kind, b.kind) {
        (SlotKind::Theory, SlotKind::Theory) | (SlotKind::Lab, SlotKind::Lab) => a.slot == b.slot,
        (SlotKind::Theory, SlotKind::Lab) => catalog.overlaps(a.slot, b.slot),
        (SlotKind::Lab, SlotKind::Theory) => catalog.overlaps(b.slot, a.slot),
    }
}

/// Pre-solve arithmetic: reject inputs whose weekly demand already exceeds
/// the free room-cells left in the ledger, before any model is built.
fn check_capacity(
    problem: &ScheduleProblem,
    usage: &UsageLedger,
    combined_labs: &[RoomName],
) -> Result<()> {
    let days = DAYS_PER_WEEK as usize;
    let theory_capacity = days * problem.catalog.theory_slots().len() * problem.theory_rooms.len();
    let lab_capacity = days * problem.catalog.lab_slots().len() * combined_labs.len();
    let available_theory = theory_capacity.saturating_sub(usage.used_count(SlotKind::Theory));
    let available_lab = lab_capacity.saturating_sub(usage.used_count(SlotKind::Lab));

    let mut needed_theory = 0usize;
    let mut needed_lab = 0usize;
    for sem in problem.semesters {
        if let Some(courses) = problem.courses_by_semester.get(sem) {
            for course in courses {
                if course.is_lab {
                    needed_lab += course.times_needed as usize;
                } else {
                    needed_theory += course.times_needed as usize;
                }
            }
        }
    }

    if needed_theory > available_theory {
        return Err(TimetableError::Capacity {
            kind: SlotKind::Theory,
            needed: needed_theory,
            available: available_theory,
        }
        .into());
    }
    if needed_lab > available_lab {
        return Err(TimetableError::Capacity {
            kind: SlotKind::Lab,
            needed: needed_lab,
            available: available_lab,
        }
        .into());
    }
    Ok(())
}

/// Build and solve the main feasibility model for the selected semesters.
///
/// Variables exist only for tuples that pass the blackout, ledger-occupancy,
/// room-kind and special-lab filters; every other constraint is a linear row
/// over those variables.
pub fn solve_timetable(problem: &ScheduleProblem, usage: &UsageLedger) -> Result<ModelOutcome> {
    let catalog = problem.catalog;
    let constraints = problem.constraints;
    let cutoff = constraints.cutoff_minute();

    // Normal labs are the lab rooms not claimed by any special-lab mapping;
    // the combined list is what room-mutex rows range over.
    let special_rooms: BTreeSet<&RoomName> =
        problem.special_labs.values().flatten().collect();
    let normal_labs: Vec<RoomName> = problem
        .lab_rooms
        .iter()
        .filter(|r| !special_rooms.contains(r))
        .cloned()
        .collect();
    let combined_labs: Vec<RoomName> = problem
        .lab_rooms
        .iter()
        .cloned()
        .chain(special_rooms.iter().map(|r| (*r).clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let lab_index: BTreeMap<&RoomName, usize> = combined_labs
        .iter()
        .enumerate()
        .map(|(i, r)| (r, i))
        .collect();

    check_capacity(problem, usage, &combined_labs)?;

    // Sections for each selected semester
    let mut order: Vec<u32> = problem.semesters.to_vec();
    order.sort_unstable();
    order.dedup();

    let mut sections: Vec<SectionInfo> = Vec::new();
    let mut sections_by_semester: BTreeMap<u32, Vec<SectionName>> = BTreeMap::new();
    for &sem in &order {
        let count = problem.student_counts.get(&sem).copied().unwrap_or(0);
        let names = build_sections(sem, count, problem.section_size, problem.program_code);
        for name in &names {
            sections.push(SectionInfo {
                name: name.clone(),
                semester: sem,
            });
        }
        sections_by_semester.insert(sem, names);
    }

    let cohort_codes: BTreeSet<(u32, SubjectCode)> = if problem.enable_cohort {
        problem.cohorts.keys().cloned().collect()
    } else {
        BTreeSet::new()
    };
    let is_cohort =
        |sem: u32, code: &SubjectCode| cohort_codes.contains(&(sem, code.clone()));
    let courses_of = |sem: u32| -> &[Subject] {
        problem
            .courses_by_semester
            .get(&sem)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    };

    let mut vars = variables!();

    // Decision variables, keyed (section, course, day, slot, room-index).
    // Room indices refer to theory_rooms for theory and combined_labs for lab.
    let mut assign: BTreeMap<(usize, usize, u8, usize, usize), Variable> = BTreeMap::new();
    let mut course_vars: BTreeMap<(usize, usize), Vec<Variable>> = BTreeMap::new();
    let mut course_day_vars: BTreeMap<(usize, usize, u8), Vec<Variable>> = BTreeMap::new();
    let mut day_assigned: BTreeMap<(usize, usize, u8), Variable> = BTreeMap::new();
    let mut room_cell: BTreeMap<(SlotKind, usize, u8, usize), Vec<Variable>> = BTreeMap::new();
    let mut section_cell: BTreeMap<(usize, SlotKind, u8, usize), Vec<Variable>> = BTreeMap::new();
    let mut cell_occupants: BTreeMap<(usize, SlotKind, u8, usize), Vec<Variable>> = BTreeMap::new();
    let mut section_day: BTreeMap<(usize, u8), Vec<Variable>> = BTreeMap::new();

    for (sec_idx, sec) in sections.iter().enumerate() {
        for (course_idx, course) in courses_of(sec.semester).iter().enumerate() {
            if is_cohort(sec.semester, &course.code) {
                continue;
            }
            let kind = course.kind();

            if kind == SlotKind::Theory {
                for day in 0..DAYS_PER_WEEK {
                    day_assigned.insert((sec_idx, course_idx, day), vars.add(variable().binary()));
                }
            }

            let room_indices: Vec<usize> = match kind {
                SlotKind::Theory => (0..problem.theory_rooms.len()).collect(),
                SlotKind::Lab => {
                    let candidates: Vec<&RoomName> =
                        match problem.special_labs.get(&course.code) {
                            Some(set) => set.iter().collect(),
                            None => normal_labs.iter().collect(),
                        };
                    candidates
                        .into_iter()
                        .filter_map(|r| lab_index.get(r).copied())
                        .collect()
                }
            };

            for day in 0..DAYS_PER_WEEK {
                for slot in 0..catalog.slots(kind).len() {
                    if blackout(day, kind, slot) {
                        continue;
                    }
                    if let Some(cutoff) = cutoff {
                        if catalog.minutes(kind, slot).end > cutoff {
                            continue;
                        }
                    }
                    for &room_idx in &room_indices {
                        let room = match kind {
                            SlotKind::Theory => &problem.theory_rooms[room_idx],
                            SlotKind::Lab => &combined_labs[room_idx],
                        };
                        if usage.occupied(kind, room, day, slot) {
                            continue;
                        }
                        let var = vars.add(variable().binary());
                        assign.insert((sec_idx, course_idx, day, slot, room_idx), var);
                        course_vars.entry((sec_idx, course_idx)).or_default().push(var);
                        course_day_vars
                            .entry((sec_idx, course_idx, day))
                            .or_default()
                            .push(var);
                        room_cell.entry((kind, room_idx, day, slot)).or_default().push(var);
                        section_cell
                            .entry((sec_idx, kind, day, slot))
                            .or_default()
                            .push(var);
                        cell_occupants
                            .entry((sec_idx, kind, day, slot))
                            .or_default()
                            .push(var);
                        section_day.entry((sec_idx, day)).or_default().push(var);
                    }
                }
            }
        }
    }

    // A course with demand but no admissible tuple can never be placed
    for (sec_idx, sec) in sections.iter().enumerate() {
        for (course_idx, course) in courses_of(sec.semester).iter().enumerate() {
            if is_cohort(sec.semester, &course.code) {
                continue;
            }
            if course.times_needed > 0
                && course_vars
                    .get(&(sec_idx, course_idx))
                    .map_or(true, |v| v.is_empty())
            {
                return Ok(ModelOutcome::Infeasible);
            }
        }
    }

    // Cohort assignment variables: one per (normal section, cohort course,
    // offered label)
    let mut cohort_entries: Vec<CohortEntry> = Vec::new();
    let mut cohort_choice: BTreeMap<(usize, SubjectCode), Vec<usize>> = BTreeMap::new();
    let mut cohort_label_vars: BTreeMap<(u32, SubjectCode, String), Vec<Variable>> =
        BTreeMap::new();
    if problem.enable_cohort {
        for (sec_idx, sec) in sections.iter().enumerate() {
            for course in courses_of(sec.semester) {
                let Some(offerings) = problem.cohorts.get(&(sec.semester, course.code.clone()))
                else {
                    continue;
                };
                if offerings.is_empty() {
                    return Ok(ModelOutcome::Infeasible);
                }
                for offering in offerings {
                    let var = vars.add(variable().binary());
                    cohort_choice
                        .entry((sec_idx, course.code.clone()))
                        .or_default()
                        .push(cohort_entries.len());
                    cohort_label_vars
                        .entry((sec.semester, course.code.clone(), offering.label.clone()))
                        .or_default()
                        .push(var);
                    cell_occupants
                        .entry((sec_idx, offering.kind, offering.day, offering.slot))
                        .or_default()
                        .push(var);
                    section_day.entry((sec_idx, offering.day)).or_default().push(var);
                    cohort_entries.push(CohortEntry {
                        sec: sec_idx,
                        code: course.code.clone(),
                        offering,
                        var,
                    });
                }
            }
        }
    }

    // Day-in-use indicators and per-cell occupancy indicators
    let mut day_in_use: BTreeMap<(usize, u8), Variable> = BTreeMap::new();
    for sec_idx in 0..sections.len() {
        for day in 0..DAYS_PER_WEEK {
            day_in_use.insert((sec_idx, day), vars.add(variable().binary()));
        }
    }
    let mut occupied_cell: BTreeMap<(usize, SlotKind, u8, usize), Variable> = BTreeMap::new();
    for key in cell_occupants.keys() {
        occupied_cell.insert(*key, vars.add(variable().binary()));
    }

    // Daily span variables (minutes)
    let mut span_vars: BTreeMap<(usize, u8), (Variable, Variable)> = BTreeMap::new();
    for sec_idx in 0..sections.len() {
        for day in 0..DAYS_PER_WEEK {
            let min_start = vars.add(variable().integer().min(0).max(DAY_MINUTES));
            let max_end = vars.add(variable().integer().min(0).max(DAY_MINUTES));
            span_vars.insert((sec_idx, day), (min_start, max_end));
        }
    }

    // Feasibility model: no objective, every requirement is a hard row
    let mut model = vars.minimise(Expression::default()).using(highs);
    model = apply_hints(model, problem.hints);

    // Exact weekly demand per (section, course)
    for (sec_idx, sec) in sections.iter().enumerate() {
        for (course_idx, course) in courses_of(sec.semester).iter().enumerate() {
            if is_cohort(sec.semester, &course.code) {
                continue;
            }
            if let Some(list) = course_vars.get(&(sec_idx, course_idx)) {
                let total = sum_of(list);
                model = model.with(constraint!(total == course.times_needed as f64));
            }

            // Theory meetings spread over exactly times_needed days,
            // linked to the per-day variables from both sides
            if !course.is_lab {
                let day_sum: Expression = (0..DAYS_PER_WEEK)
                    .map(|d| Expression::from(day_assigned[&(sec_idx, course_idx, d)]))
                    .sum();
                model = model.with(constraint!(day_sum == course.times_needed as f64));

                for day in 0..DAYS_PER_WEEK {
                    let flag = day_assigned[&(sec_idx, course_idx, day)];
                    match course_day_vars.get(&(sec_idx, course_idx, day)) {
                        Some(relevant) if !relevant.is_empty() => {
                            let total = sum_of(relevant);
                            model = model.with(constraint!(total.clone() >= flag));
                            model = model.with(constraint!(total <= relevant.len() as f64 * flag));
                        }
                        _ => {
                            model = model.with(constraint!(flag <= 0));
                        }
                    }
                }

                // No consecutive theory days when the course meets more
                // than once a week
                if course.times_needed > 1 {
                    for day in 0..DAYS_PER_WEEK - 1 {
                        let a = day_assigned[&(sec_idx, course_idx, day)];
                        let b = day_assigned[&(sec_idx, course_idx, day + 1)];
                        model = model.with(constraint!(a + b <= 1));
                    }
                }
            }
        }
    }

    // Room mutex per (kind, room, day, slot)
    for occupants in room_cell.values() {
        if occupants.len() > 1 {
            model = model.with(constraint!(sum_of(occupants) <= 1));
        }
    }

    // Section mutex within a kind
    for occupants in section_cell.values() {
        if occupants.len() > 1 {
            model = model.with(constraint!(sum_of(occupants) <= 1));
        }
    }

    // Occupancy linking: the indicator is the OR of its cell's variables
    for (key, occupants) in &cell_occupants {
        let occ = occupied_cell[key];
        for &v in occupants {
            model = model.with(constraint!(occ >= v));
        }
        model = model.with(constraint!(occ <= sum_of(occupants)));
    }

    // Theory/lab overlap mutex per section and day, via the indicators
    for sec_idx in 0..sections.len() {
        for day in 0..DAYS_PER_WEEK {
            for lab_slot in 0..catalog.lab_slots().len() {
                let Some(&lab_occ) = occupied_cell.get(&(sec_idx, SlotKind::Lab, day, lab_slot))
                else {
                    continue;
                };
                for &theory_slot in catalog.overlapping_theory(lab_slot) {
                    if let Some(&th_occ) =
                        occupied_cell.get(&(sec_idx, SlotKind::Theory, day, theory_slot))
                    {
                        model = model.with(constraint!(lab_occ + th_occ <= 1));
                    }
                }
            }
        }
    }

    // Cohort routing
    if problem.enable_cohort {
        // Every section picks exactly one label per cohort course
        for entry_idxs in cohort_choice.values() {
            let total: Expression = entry_idxs
                .iter()
                .map(|&i| Expression::from(cohort_entries[i].var))
                .sum();
            model = model.with(constraint!(total == 1));
        }

        // Label capacity in units of section_size students
        for ((sem, code, label), routed) in &cohort_label_vars {
            let capacity = problem.cohorts[&(*sem, code.clone())]
                .iter()
                .find(|o| &o.label == label)
                .map(|o| o.capacity)
                .unwrap_or(0);
            let load: Expression = routed
                .iter()
                .map(|&v| problem.section_size as f64 * v)
                .sum();
            model = model.with(constraint!(load <= capacity as f64));
        }

        // A routed section's other courses stay clear of the fixed slot
        // and of everything that overlaps it
        for entry in &cohort_entries {
            let offering = entry.offering;
            let mut cells: Vec<(SlotKind, usize)> = vec![(offering.kind, offering.slot)];
            match offering.kind {
                SlotKind::Lab => {
                    for &t in catalog.overlapping_theory(offering.slot) {
                        cells.push((SlotKind::Theory, t));
                    }
                }
                SlotKind::Theory => {
                    for ls in catalog.overlapping_labs(offering.slot) {
                        cells.push((SlotKind::Lab, ls));
                    }
                }
            }
            for (kind, slot) in cells {
                if let Some(normal) = section_cell.get(&(entry.sec, kind, offering.day, slot)) {
                    for &v in normal {
                        model = model.with(constraint!(entry.var + v <= 1));
                    }
                }
            }
        }

        // Clashing labels of different cohort courses are mutually
        // exclusive for the same section
        for i in 0..cohort_entries.len() {
            for j in i + 1..cohort_entries.len() {
                let (a, b) = (&cohort_entries[i], &cohort_entries[j]);
                if a.sec != b.sec || a.code == b.code {
                    continue;
                }
                if offerings_clash(a.offering, b.offering, catalog) {
                    model = model.with(constraint!(a.var + b.var <= 1));
                }
            }
        }
    }

    // Working-day cap
    for sec_idx in 0..sections.len() {
        for day in 0..DAYS_PER_WEEK {
            let used = day_in_use[&(sec_idx, day)];
            match section_day.get(&(sec_idx, day)) {
                Some(on_day) if !on_day.is_empty() => {
                    let total = sum_of(on_day);
                    model = model.with(constraint!(total.clone() >= used));
                    model = model.with(constraint!(total <= DAY_USE_BIG_M * used));
                }
                _ => {
                    model = model.with(constraint!(used <= 0));
                }
            }
        }
        let week: Expression = (0..DAYS_PER_WEEK)
            .map(|d| Expression::from(day_in_use[&(sec_idx, d)]))
            .sum();
        model = model.with(constraint!(week <= constraints.working_days_per_week as f64));
    }

    // Daily span. An occupied cell pins min_start below its start and
    // max_end above its end; unoccupied cells contribute the sentinel.
    for (&(sec_idx, kind, day, slot), &occ) in &occupied_cell {
        let time = catalog.minutes(kind, slot);
        let (min_start, max_end) = span_vars[&(sec_idx, day)];
        model = model.with(constraint!(
            min_start + (DAY_MINUTES - time.start as f64) * occ <= DAY_MINUTES
        ));
        model = model.with(constraint!(max_end >= time.end as f64 * occ));
    }
    for (min_start, max_end) in span_vars.values() {
        model = model.with(constraint!(
            *max_end - *min_start <= constraints.allowed_span_minutes() as f64
        ));
    }

    // Minimum gap between any two classes of a section on one day.
    // The separation is later.start - earlier.end; overlapping pairs come
    // out negative and are excluded along the way.
    if constraints.min_gap_minutes > 0 {
        let mut day_cells: BTreeMap<(usize, u8), Vec<(SlotTime, Variable)>> = BTreeMap::new();
        for (&(sec_idx, kind, day, slot), &occ) in &occupied_cell {
            day_cells
                .entry((sec_idx, day))
                .or_default()
                .push((catalog.minutes(kind, slot), occ));
        }
        for cells in day_cells.values() {
            for ((ta, va), (tb, vb)) in cells.iter().tuple_combinations() {
                let (first, second) = if ta.start <= tb.start { (ta, tb) } else { (tb, ta) };
                let separation = second.start as i64 - first.end as i64;
                if separation < constraints.min_gap_minutes as i64 {
                    model = model.with(constraint!(*va + *vb <= 1));
                }
            }
        }
    }

    // Cutoff for cohort offerings (normal variables were filtered at
    // creation; a fixed offering past the cutoff can never be chosen)
    if let Some(cutoff) = cutoff {
        for entry in &cohort_entries {
            let time = catalog.minutes(entry.offering.kind, entry.offering.slot);
            if time.end > cutoff {
                model = model.with(constraint!(entry.var <= 0));
            }
        }
    }

    let solution = match model.solve() {
        Ok(solution) => solution,
        Err(ResolutionError::Infeasible) => return Ok(ModelOutcome::Infeasible),
        Err(ResolutionError::Unbounded) => {
            return Err(TimetableError::SolverFailed("model unbounded".to_string()).into())
        }
        // Timeouts and resource limits reduce to "no schedule found"
        Err(_) => return Ok(ModelOutcome::Infeasible),
    };

    // Read back every true variable, keyed by room-cell so the output is
    // injective per (room, day, slot)
    let mut placement_map: BTreeMap<(SlotKind, RoomName, u8, usize), Placement> = BTreeMap::new();
    for (&(sec_idx, course_idx, day, slot, room_idx), var) in &assign {
        if solution.value(*var) < 0.5 {
            continue;
        }
        let sec = &sections[sec_idx];
        let course = &courses_of(sec.semester)[course_idx];
        let kind = course.kind();
        let room = match kind {
            SlotKind::Theory => problem.theory_rooms[room_idx].clone(),
            SlotKind::Lab => combined_labs[room_idx].clone(),
        };
        placement_map.insert(
            (kind, room.clone(), day, slot),
            Placement {
                section: sec.name.clone(),
                subject: course.code.clone(),
                room,
                day,
                kind,
                slot,
                cohort_label: None,
                teacher: None,
            },
        );
    }

    let mut cohort_choices: BTreeMap<(SectionName, SubjectCode), String> = BTreeMap::new();
    let mut chosen_labels: BTreeMap<(SubjectCode, String), (SectionName, &CohortOffering)> =
        BTreeMap::new();
    for ((sec_idx, code), entry_idxs) in &cohort_choice {
        for &i in entry_idxs {
            let entry = &cohort_entries[i];
            if solution.value(entry.var) > 0.5 {
                let section = sections[*sec_idx].name.clone();
                cohort_choices.insert((section.clone(), code.clone()), entry.offering.label.clone());
                chosen_labels
                    .entry((code.clone(), entry.offering.label.clone()))
                    .or_insert((section, entry.offering));
                break;
            }
        }
    }
    for ((code, label), (section, offering)) in chosen_labels {
        let room = offering.room_label();
        placement_map
            .entry((offering.kind, room.clone(), offering.day, offering.slot))
            .or_insert(Placement {
                section,
                subject: code,
                room,
                day: offering.day,
                kind: offering.kind,
                slot: offering.slot,
                cohort_label: Some(label),
                teacher: None,
            });
    }

    let placements: Vec<Placement> = placement_map.into_values().collect();
    let allocations = placements
        .iter()
        .map(|p| Allocation {
            kind: p.kind,
            room: p.room.clone(),
            day: p.day,
            slot: p.slot,
            occupant: p.occupant_label(),
        })
        .collect();

    Ok(ModelOutcome::Feasible(SolveOutcome {
        placements,
        sections_by_semester,
        cohort_choices,
        allocations,
    }))
}
