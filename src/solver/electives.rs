use crate::error::{Result, TimetableError};
use crate::ledger::{Allocation, UsageLedger};
use crate::solver::model::apply_hints;
use crate::types::{
    blackout, Elective, ElectivePlacement, RoomName, SlotCatalog, SlotKind, SolverHints,
    DAYS_PER_WEEK,
};
use good_lp::{constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel, Variable};
use good_lp::solvers::highs::highs;
use std::collections::BTreeMap;

/// Inputs of the elective pass. It only sees the residual capacity the main
/// pass left in the usage ledger.
#[derive(Clone, Copy)]
pub struct ElectiveProblem<'a> {
    pub electives: &'a [Elective],
    pub catalog: &'a SlotCatalog,
    pub theory_rooms: &'a [RoomName],
    pub lab_rooms: &'a [RoomName],
    /// Theory meetings per elective section when theory is chosen
    pub theory_needed: u32,
    /// Lab blocks per elective section when lab is chosen
    pub lab_needed: u32,
    pub hints: &'a SolverHints,
}

#[derive(Debug, Clone, Default)]
pub struct ElectiveOutcome {
    pub placements: Vec<ElectivePlacement>,
    pub allocations: Vec<Allocation>,
}

#[derive(Debug)]
pub enum ElectiveSolve {
    Feasible(ElectiveOutcome),
    Infeasible,
}

/// Place every elective section as either `theory_needed` theory meetings on
/// distinct, non-consecutive days, or `lab_needed` lab blocks - never both.
pub fn solve_electives(problem: &ElectiveProblem, usage: &UsageLedger) -> Result<ElectiveSolve> {
    let catalog = problem.catalog;

    // Free room-cells, by kind
    let mut theory_combos: Vec<(usize, u8, usize)> = Vec::new(); // (room, day, slot)
    for (room_idx, room) in problem.theory_rooms.iter().enumerate() {
        for day in 0..DAYS_PER_WEEK {
            for slot in 0..catalog.theory_slots().len() {
                if blackout(day, SlotKind::Theory, slot) {
                    continue;
                }
                if usage.occupied(SlotKind::Theory, room, day, slot) {
                    continue;
                }
                theory_combos.push((room_idx, day, slot));
            }
        }
    }
    let mut lab_combos: Vec<(usize, u8, usize)> = Vec::new();
    for (room_idx, room) in problem.lab_rooms.iter().enumerate() {
        for day in 0..DAYS_PER_WEEK {
            for slot in 0..catalog.lab_slots().len() {
                if usage.occupied(SlotKind::Lab, room, day, slot) {
                    continue;
                }
                lab_combos.push((room_idx, day, slot));
            }
        }
    }

    let mut vars = variables!();

    // One block of variables per elective section
    let mut choose_theory: BTreeMap<(usize, usize), Variable> = BTreeMap::new();
    let mut day_assigned: BTreeMap<(usize, usize, u8), Variable> = BTreeMap::new();
    let mut theory_vars: BTreeMap<(usize, usize, usize), Variable> = BTreeMap::new(); // combo idx
    let mut lab_vars: BTreeMap<(usize, usize, usize), Variable> = BTreeMap::new();

    for (e_idx, elective) in problem.electives.iter().enumerate() {
        for idx in 0..elective.sections_count as usize {
            choose_theory.insert((e_idx, idx), vars.add(variable().binary()));
            for day in 0..DAYS_PER_WEEK {
                day_assigned.insert((e_idx, idx, day), vars.add(variable().binary()));
            }
            for combo in 0..theory_combos.len() {
                theory_vars.insert((e_idx, idx, combo), vars.add(variable().binary()));
            }
            for combo in 0..lab_combos.len() {
                lab_vars.insert((e_idx, idx, combo), vars.add(variable().binary()));
            }
        }
    }

    let mut model = vars.minimise(Expression::default()).using(highs);
    model = apply_hints(model, problem.hints);

    for (e_idx, elective) in problem.electives.iter().enumerate() {
        for idx in 0..elective.sections_count as usize {
            let choose = choose_theory[&(e_idx, idx)];

            // Mode selection: forced when only one side is allowed
            if !elective.can_use_theory {
                model = model.with(constraint!(choose <= 0));
            }
            if !elective.can_use_lab {
                model = model.with(constraint!(choose >= 1));
            }

            // Placement variables are gated on the chosen mode
            for combo in 0..theory_combos.len() {
                let v = theory_vars[&(e_idx, idx, combo)];
                model = model.with(constraint!(v <= choose));
            }
            for combo in 0..lab_combos.len() {
                let v = lab_vars[&(e_idx, idx, combo)];
                model = model.with(constraint!(v + choose <= 1));
            }

            // Theory mode spreads over exactly theory_needed distinct days
            let day_sum: Expression = (0..DAYS_PER_WEEK)
                .map(|d| Expression::from(day_assigned[&(e_idx, idx, d)]))
                .sum();
            model = model.with(constraint!(
                day_sum == problem.theory_needed as f64 * choose
            ));
            for day in 0..DAYS_PER_WEEK {
                let flag = day_assigned[&(e_idx, idx, day)];
                let relevant: Vec<Variable> = theory_combos
                    .iter()
                    .enumerate()
                    .filter(|(_, (_, d, _))| *d == day)
                    .map(|(combo, _)| theory_vars[&(e_idx, idx, combo)])
                    .collect();
                if relevant.is_empty() {
                    model = model.with(constraint!(flag <= 0));
                } else {
                    let total: Expression =
                        relevant.iter().copied().map(Expression::from).sum();
                    model = model.with(constraint!(total.clone() >= flag));
                    model = model.with(constraint!(total <= relevant.len() as f64 * flag));
                }
            }

            // No consecutive theory days; the rule vanishes for lab sections
            // (day(d) + day(d+1) <= 1 + (1 - choose))
            for day in 0..DAYS_PER_WEEK - 1 {
                let a = day_assigned[&(e_idx, idx, day)];
                let b = day_assigned[&(e_idx, idx, day + 1)];
                model = model.with(constraint!(a + b + choose <= 2));
            }

            // Exact demand per mode
            let all_theory: Expression = (0..theory_combos.len())
                .map(|combo| Expression::from(theory_vars[&(e_idx, idx, combo)]))
                .sum();
            model = model.with(constraint!(
                all_theory == problem.theory_needed as f64 * choose
            ));
            let all_lab: Expression = (0..lab_combos.len())
                .map(|combo| Expression::from(lab_vars[&(e_idx, idx, combo)]))
                .sum();
            // lab_needed * (1 - choose)
            model = model.with(constraint!(
                all_lab + problem.lab_needed as f64 * choose == problem.lab_needed as f64
            ));
        }
    }

    // No double-booking across all elective sections
    for combo in 0..theory_combos.len() {
        let occupants: Vec<Variable> = problem
            .electives
            .iter()
            .enumerate()
            .flat_map(|(e_idx, e)| {
                (0..e.sections_count as usize).map(move |idx| (e_idx, idx))
            })
            .map(|(e_idx, idx)| theory_vars[&(e_idx, idx, combo)])
            .collect();
        if occupants.len() > 1 {
            let total: Expression = occupants.into_iter().map(Expression::from).sum();
            model = model.with(constraint!(total <= 1));
        }
    }
    for combo in 0..lab_combos.len() {
        let occupants: Vec<Variable> = problem
            .electives
            .iter()
            .enumerate()
            .flat_map(|(e_idx, e)| {
                (0..e.sections_count as usize).map(move |idx| (e_idx, idx))
            })
            .map(|(e_idx, idx)| lab_vars[&(e_idx, idx, combo)])
            .collect();
        if occupants.len() > 1 {
            let total: Expression = occupants.into_iter().map(Expression::from).sum();
            model = model.with(constraint!(total <= 1));
        }
    }

    let solution = match model.solve() {
        Ok(solution) => solution,
        Err(ResolutionError::Infeasible) => return Ok(ElectiveSolve::Infeasible),
        Err(ResolutionError::Unbounded) => {
            return Err(TimetableError::SolverFailed("model unbounded".to_string()).into())
        }
        Err(_) => return Ok(ElectiveSolve::Infeasible),
    };

    let mut placements: Vec<ElectivePlacement> = Vec::new();
    for (e_idx, elective) in problem.electives.iter().enumerate() {
        for idx in 0..elective.sections_count as usize {
            for (combo, &(room_idx, day, slot)) in theory_combos.iter().enumerate() {
                if solution.value(theory_vars[&(e_idx, idx, combo)]) > 0.5 {
                    placements.push(ElectivePlacement {
                        code: elective.code.clone(),
                        section_idx: idx,
                        room: problem.theory_rooms[room_idx].clone(),
                        day,
                        kind: SlotKind::Theory,
                        slot,
                    });
                }
            }
            for (combo, &(room_idx, day, slot)) in lab_combos.iter().enumerate() {
                if solution.value(lab_vars[&(e_idx, idx, combo)]) > 0.5 {
                    placements.push(ElectivePlacement {
                        code: elective.code.clone(),
                        section_idx: idx,
                        room: problem.lab_rooms[room_idx].clone(),
                        day,
                        kind: SlotKind::Lab,
                        slot,
                    });
                }
            }
        }
    }

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

    Ok(ElectiveSolve::Feasible(ElectiveOutcome {
        placements,
        allocations,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SubjectCode;

    fn elective(code: &str, sections: u32, can_theory: bool, can_lab: bool) -> Elective {
        Elective {
            code: SubjectCode(code.to_string()),
            name: code.to_string(),
            sections_count: sections,
            can_use_theory: can_theory,
            can_use_lab: can_lab,
        }
    }

    fn room(name: &str) -> RoomName {
        RoomName(name.to_string())
    }

    fn fixture<'a>(
        electives: &'a [Elective],
        catalog: &'a SlotCatalog,
        theory_rooms: &'a [RoomName],
        lab_rooms: &'a [RoomName],
        hints: &'a SolverHints,
    ) -> ElectiveProblem<'a> {
        ElectiveProblem {
            electives,
            catalog,
            theory_rooms,
            lab_rooms,
            theory_needed: 2,
            lab_needed: 1,
            hints,
        }
    }

    #[test]
    fn test_theory_elective_gets_two_non_consecutive_days() {
        let electives = vec![elective("E1", 1, true, false)];
        let catalog = SlotCatalog::standard();
        let theory_rooms = vec![room("R1")];
        let lab_rooms = vec![];
        let hints = SolverHints::default();
        let problem = fixture(&electives, &catalog, &theory_rooms, &lab_rooms, &hints);

        let out = match solve_electives(&problem, &UsageLedger::new()).unwrap() {
            ElectiveSolve::Feasible(out) => out,
            ElectiveSolve::Infeasible => panic!("expected a feasible elective schedule"),
        };

        assert_eq!(out.placements.len(), 2);
        let mut days: Vec<u8> = out.placements.iter().map(|p| p.day).collect();
        days.sort_unstable();
        assert!(days[1] - days[0] >= 2, "theory days must not be adjacent");
        for p in &out.placements {
            assert_eq!(p.kind, SlotKind::Theory);
            assert_eq!(p.occupant_label(), "Elective-E1-A1");
        }
    }

    #[test]
    fn test_lab_elective_gets_one_block_and_skips_day_spread() {
        let electives = vec![elective("E2", 1, false, true)];
        let catalog = SlotCatalog::standard();
        let theory_rooms = vec![];
        let lab_rooms = vec![room("L1")];
        let hints = SolverHints::default();
        let problem = fixture(&electives, &catalog, &theory_rooms, &lab_rooms, &hints);

        let out = match solve_electives(&problem, &UsageLedger::new()).unwrap() {
            ElectiveSolve::Feasible(out) => out,
            ElectiveSolve::Infeasible => panic!("expected a feasible elective schedule"),
        };

        assert_eq!(out.placements.len(), 1);
        assert_eq!(out.placements[0].kind, SlotKind::Lab);
    }

    #[test]
    fn test_electives_respect_residual_capacity() {
        let electives = vec![elective("E3", 1, true, false)];
        let catalog = SlotCatalog::standard();
        let theory_rooms = vec![room("R1")];
        let lab_rooms = vec![];
        let hints = SolverHints::default();
        let problem = fixture(&electives, &catalog, &theory_rooms, &lab_rooms, &hints);

        // Leave free cells only on Monday and Tuesday: adjacent days, so the
        // two theory meetings cannot be placed
        let mut usage = UsageLedger::new();
        for day in 2..DAYS_PER_WEEK {
            for slot in 0..catalog.theory_slots().len() {
                usage.insert(SlotKind::Theory, &room("R1"), day, slot);
            }
        }

        let outcome = solve_electives(&problem, &usage).unwrap();
        assert!(matches!(outcome, ElectiveSolve::Infeasible));
    }

    #[test]
    fn test_no_double_booking_across_elective_sections() {
        let electives = vec![elective("E4", 2, false, true)];
        let catalog = SlotCatalog::standard();
        let theory_rooms = vec![];
        let lab_rooms = vec![room("L1")];
        let hints = SolverHints::default();
        let problem = fixture(&electives, &catalog, &theory_rooms, &lab_rooms, &hints);

        let out = match solve_electives(&problem, &UsageLedger::new()).unwrap() {
            ElectiveSolve::Feasible(out) => out,
            ElectiveSolve::Infeasible => panic!("expected a feasible elective schedule"),
        };

        assert_eq!(out.placements.len(), 2);
        let a = &out.placements[0];
        let b = &out.placements[1];
        assert!(
            (a.day, a.slot) != (b.day, b.slot),
            "two sections may not share one lab cell"
        );
    }
}
