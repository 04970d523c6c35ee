mod json;
mod markdown;
mod text;

pub use json::*;
pub use markdown::*;
pub use text::*;

use crate::error::Result;
use crate::types::{day_name, ElectivePlacement, Placement, ScheduleInput, SlotKind, DAYS_PER_WEEK};
use crate::validator::ValidationReport;
use colored::Colorize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Text,
}

/// Generate all reports and write to output directory
pub fn generate_reports(
    placements: &[Placement],
    electives: &[ElectivePlacement],
    input: &ScheduleInput,
    validation: &ValidationReport,
    output_dir: &Path,
    formats: &[OutputFormat],
) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    for format in formats {
        match format {
            OutputFormat::Json => {
                let json = generate_json_report(placements, electives, validation)?;
                fs::write(output_dir.join("timetable.json"), json)?;
            }
            OutputFormat::Markdown => {
                let md = generate_markdown_report(placements, electives, input, validation);
                fs::write(output_dir.join("timetable.md"), md)?;
            }
            OutputFormat::Text => {
                let txt = generate_text_report(placements, electives, input, validation);
                fs::write(output_dir.join("timetable.txt"), txt)?;
            }
        }
    }

    Ok(())
}

/// Console summary after a run
pub fn print_summary(
    placements: &[Placement],
    electives: &[ElectivePlacement],
    validation: &ValidationReport,
) {
    println!();
    println!("{}", "Timetable Summary".bold());
    println!("{}", "─".repeat(40));
    println!("  Placements: {}", placements.len());
    println!("  Elective placements: {}", electives.len());
    println!("  Sections: {}", validation.statistics.sections);
    println!(
        "  Teacher-assigned slots: {}",
        validation.statistics.assigned_teachers
    );

    if validation.is_valid {
        println!("{}", "✓ All schedule invariants hold".green().bold());
    } else {
        println!("{}", "✗ Schedule has violations".red().bold());
        for v in &validation.violations {
            println!("  - {}: {}", v.constraint.red(), v.message);
        }
    }
}

/// One rendered row of a section's weekly grid
pub(crate) struct GridRow {
    pub course: String,
    pub label: String,
    pub days: Vec<String>,
}

/// Build the weekly grid of one section. Theory meetings of a course share
/// one row; multi-slot labs split into `-A`, `-B` sub-rows; cohort entries
/// show their cohort label instead of the section name.
pub(crate) fn section_grid(
    section: &str,
    placements: &[Placement],
    input: &ScheduleInput,
) -> Vec<GridRow> {
    let mine: Vec<&Placement> = placements
        .iter()
        .filter(|p| p.section.0 == section)
        .collect();
    let mut by_course: BTreeMap<&str, Vec<&Placement>> = BTreeMap::new();
    for p in &mine {
        by_course.entry(p.subject.0.as_str()).or_default().push(p);
    }

    let mut rows = Vec::new();
    for (course, entries) in by_course {
        let is_lab = entries.iter().all(|p| p.kind == SlotKind::Lab);
        let base_label = entries[0]
            .cohort_label
            .clone()
            .unwrap_or_else(|| section.to_string());

        if !is_lab || entries.len() == 1 {
            let mut days = vec![String::new(); DAYS_PER_WEEK as usize];
            for p in &entries {
                let cell = format!(
                    "{} [{}]",
                    p.room,
                    input.catalog.minutes(p.kind, p.slot).label()
                );
                let slot = &mut days[p.day as usize];
                if slot.is_empty() {
                    *slot = cell;
                } else {
                    slot.push_str(", ");
                    slot.push_str(&cell);
                }
            }
            rows.push(GridRow {
                course: course.to_string(),
                label: base_label,
                days,
            });
        } else {
            // Multi-slot labs get one sub-row per block
            for (i, p) in entries.iter().enumerate() {
                let mut days = vec![String::new(); DAYS_PER_WEEK as usize];
                days[p.day as usize] = format!(
                    "{} [{}]",
                    p.room,
                    input.catalog.minutes(p.kind, p.slot).label()
                );
                rows.push(GridRow {
                    course: course.to_string(),
                    label: format!("{}-{}", base_label, (b'A' + i as u8) as char),
                    days,
                });
            }
        }
    }
    rows
}

/// Per-room usage grid: day rows, slot columns
pub(crate) fn room_grid(
    room: &str,
    kind: SlotKind,
    placements: &[Placement],
    electives: &[ElectivePlacement],
    input: &ScheduleInput,
) -> Vec<Vec<String>> {
    let slots = input.catalog.slots(kind).len();
    let mut grid = vec![vec!["Free".to_string(); slots]; DAYS_PER_WEEK as usize];
    for p in placements {
        if p.kind == kind && p.room.0 == room {
            grid[p.day as usize][p.slot] = p
                .cohort_label
                .clone()
                .map(|label| format!("{}-{}", label, p.subject))
                .unwrap_or_else(|| p.occupant_label());
        }
    }
    for e in electives {
        if e.kind == kind && e.room.0 == room {
            grid[e.day as usize][e.slot] = e.occupant_label();
        }
    }
    grid
}

pub(crate) fn day_names() -> Vec<&'static str> {
    (0..DAYS_PER_WEEK).map(day_name).collect()
}
