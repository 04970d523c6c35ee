use crate::error::Result;
use crate::types::{ElectivePlacement, Placement};
use crate::validator::ValidationReport;
use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    placements: &'a [Placement],
    electives: &'a [ElectivePlacement],
    is_valid: bool,
    violations: Vec<String>,
    sections: usize,
    assigned_teachers: usize,
}

/// Machine-readable rendition of the timetable and its validation result
pub fn generate_json_report(
    placements: &[Placement],
    electives: &[ElectivePlacement],
    validation: &ValidationReport,
) -> Result<String> {
    let report = JsonReport {
        placements,
        electives,
        is_valid: validation.is_valid,
        violations: validation
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.constraint, v.message))
            .collect(),
        sections: validation.statistics.sections,
        assigned_teachers: validation.statistics.assigned_teachers,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
