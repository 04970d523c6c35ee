use crate::reporter::{day_names, section_grid};
use crate::types::{ElectivePlacement, Placement, ScheduleInput};
use crate::validator::ValidationReport;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Markdown rendition: one weekly table per section plus an elective table
pub fn generate_markdown_report(
    placements: &[Placement],
    electives: &[ElectivePlacement],
    input: &ScheduleInput,
    validation: &ValidationReport,
) -> String {
    let mut out = String::new();

    writeln!(out, "# University Timetable\n").unwrap();
    writeln!(
        out,
        "{} placements, {} elective placements, {} sections.\n",
        placements.len(),
        electives.len(),
        validation.statistics.sections
    )
    .unwrap();

    if !validation.is_valid {
        writeln!(out, "## Violations\n").unwrap();
        for v in &validation.violations {
            writeln!(out, "- **{}**: {}", v.constraint, v.message).unwrap();
        }
        writeln!(out).unwrap();
    }

    let sections: Vec<&str> = placements
        .iter()
        .map(|p| p.section.0.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();

    for section in sections {
        writeln!(out, "## Section {}\n", section).unwrap();
        write!(out, "| Course | Section |").unwrap();
        for day in day_names() {
            write!(out, " {} |", day).unwrap();
        }
        writeln!(out).unwrap();
        write!(out, "|---|---|").unwrap();
        for _ in day_names() {
            write!(out, "---|").unwrap();
        }
        writeln!(out).unwrap();
        for row in section_grid(section, placements, input) {
            write!(out, "| {} | {} |", row.course, row.label).unwrap();
            for cell in &row.days {
                write!(out, " {} |", cell).unwrap();
            }
            writeln!(out).unwrap();
        }
        writeln!(out).unwrap();
    }

    if !electives.is_empty() {
        writeln!(out, "## Electives\n").unwrap();
        write!(out, "| Elective | Section |").unwrap();
        for day in day_names() {
            write!(out, " {} |", day).unwrap();
        }
        writeln!(out).unwrap();
        write!(out, "|---|---|").unwrap();
        for _ in day_names() {
            write!(out, "---|").unwrap();
        }
        writeln!(out).unwrap();

        let mut by_section: BTreeMap<(String, usize), Vec<&ElectivePlacement>> = BTreeMap::new();
        for e in electives {
            by_section
                .entry((e.code.0.clone(), e.section_idx))
                .or_default()
                .push(e);
        }
        for ((code, idx), entries) in by_section {
            let mut days = vec![String::new(); day_names().len()];
            for e in &entries {
                days[e.day as usize] = format!(
                    "{} [{}]",
                    e.room,
                    input.catalog.minutes(e.kind, e.slot).label()
                );
            }
            write!(out, "| {} | A{} |", code, idx + 1).unwrap();
            for cell in &days {
                write!(out, " {} |", cell).unwrap();
            }
            writeln!(out).unwrap();
        }
        writeln!(out).unwrap();
    }

    out
}
