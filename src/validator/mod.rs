mod invariants;

pub use invariants::*;

use crate::types::{ElectivePlacement, Placement, ScheduleInput};

/// A constraint violation found in a generated schedule
#[derive(Debug, Clone)]
pub struct Violation {
    pub constraint: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

/// Statistics about the schedule under validation
#[derive(Debug, Clone, Default)]
pub struct ScheduleStatistics {
    pub total_placements: usize,
    pub elective_placements: usize,
    pub sections: usize,
    pub assigned_teachers: usize,
}

/// Result of validating a complete schedule
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub violations: Vec<Violation>,
    pub statistics: ScheduleStatistics,
}

/// Check every schedule invariant against the generated placements
pub fn validate_schedule(
    placements: &[Placement],
    electives: &[ElectivePlacement],
    input: &ScheduleInput,
) -> ValidationReport {
    let mut violations = Vec::new();

    violations.extend(check_room_conflicts(placements, electives));
    violations.extend(check_section_overlaps(placements, &input.catalog));
    violations.extend(check_times_needed(placements, input));
    violations.extend(check_theory_day_spacing(placements, input));
    violations.extend(check_blackout(placements, electives));
    violations.extend(check_working_days(placements, &input.constraints));
    violations.extend(check_daily_span(placements, &input.catalog, &input.constraints));
    violations.extend(check_min_gap(placements, &input.catalog, &input.constraints));
    violations.extend(check_cutoff(placements, electives, &input.catalog, &input.constraints));
    violations.extend(check_special_labs(placements, input));
    violations.extend(check_teacher_conflicts(placements));

    let statistics = ScheduleStatistics {
        total_placements: placements.len(),
        elective_placements: electives.len(),
        sections: placements
            .iter()
            .map(|p| &p.section)
            .collect::<std::collections::BTreeSet<_>>()
            .len(),
        assigned_teachers: placements.iter().filter(|p| p.teacher.is_some()).count(),
    };

    ValidationReport {
        is_valid: violations.iter().all(|v| v.severity != Severity::Error),
        violations,
        statistics,
    }
}
