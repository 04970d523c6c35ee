use crate::reporter::{day_names, room_grid, section_grid};
use crate::types::{ElectivePlacement, Placement, ScheduleInput, SlotKind, DAYS_PER_WEEK};
use crate::validator::ValidationReport;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Plain-text rendition of the whole timetable
pub fn generate_text_report(
    placements: &[Placement],
    electives: &[ElectivePlacement],
    input: &ScheduleInput,
    validation: &ValidationReport,
) -> String {
    let mut out = String::new();

    writeln!(out, "UNIVERSITY TIMETABLE").unwrap();
    writeln!(out, "{}", "=".repeat(60)).unwrap();
    writeln!(
        out,
        "Placements: {}   Electives: {}   Sections: {}",
        placements.len(),
        electives.len(),
        validation.statistics.sections
    )
    .unwrap();
    if !validation.is_valid {
        writeln!(out, "\nVIOLATIONS").unwrap();
        for v in &validation.violations {
            writeln!(out, "  [{}] {}", v.constraint, v.message).unwrap();
        }
    }

    let sections: Vec<&str> = placements
        .iter()
        .map(|p| p.section.0.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();

    for section in sections {
        writeln!(out, "\nSection {}", section).unwrap();
        writeln!(out, "{}", "-".repeat(60)).unwrap();
        for row in section_grid(section, placements, input) {
            writeln!(out, "  {} ({})", row.course, row.label).unwrap();
            for (day, cell) in day_names().iter().zip(&row.days) {
                if !cell.is_empty() {
                    writeln!(out, "    {:<10} {}", day, cell).unwrap();
                }
            }
        }
    }

    if !electives.is_empty() {
        writeln!(out, "\nELECTIVES").unwrap();
        writeln!(out, "{}", "-".repeat(60)).unwrap();
        let mut by_section: BTreeMap<(String, usize), Vec<&ElectivePlacement>> = BTreeMap::new();
        for e in electives {
            by_section
                .entry((e.code.0.clone(), e.section_idx))
                .or_default()
                .push(e);
        }
        for ((code, idx), entries) in by_section {
            writeln!(out, "  {} A{}", code, idx + 1).unwrap();
            for e in entries {
                writeln!(
                    out,
                    "    {:<10} {} [{}]",
                    crate::types::day_name(e.day),
                    e.room,
                    input.catalog.minutes(e.kind, e.slot).label()
                )
                .unwrap();
            }
        }
    }

    for kind in [SlotKind::Theory, SlotKind::Lab] {
        let rooms: Vec<&str> = input
            .rooms
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.name.0.as_str())
            .collect();
        for room in rooms {
            writeln!(out, "\nRoom {} ({})", room, kind).unwrap();
            writeln!(out, "{}", "-".repeat(60)).unwrap();
            let grid = room_grid(room, kind, placements, electives, input);
            for day in 0..DAYS_PER_WEEK as usize {
                let cells: Vec<String> = grid[day]
                    .iter()
                    .enumerate()
                    .map(|(slot, cell)| {
                        format!(
                            "{}: {}",
                            input.catalog.minutes(kind, slot).label(),
                            cell
                        )
                    })
                    .collect();
                writeln!(out, "  {:<10} {}", day_names()[day], cells.join(" | ")).unwrap();
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RoomName, SectionName, SubjectCode};
    use crate::validator::validate_schedule;

    #[test]
    fn test_text_report_lists_sections_and_rooms() {
        let mut input = ScheduleInput::default();
        input.courses_by_semester.insert(
            1,
            vec![crate::types::Subject {
                code: SubjectCode("CS101".to_string()),
                name: "Intro".to_string(),
                is_lab: false,
                times_needed: 1,
            }],
        );
        input.rooms.push(crate::types::Room {
            name: RoomName("R1".to_string()),
            kind: SlotKind::Theory,
            capacity: 50,
        });

        let placements = vec![Placement {
            section: SectionName("S1A1".to_string()),
            subject: SubjectCode("CS101".to_string()),
            room: RoomName("R1".to_string()),
            day: 0,
            kind: SlotKind::Theory,
            slot: 0,
            cohort_label: None,
            teacher: None,
        }];
        let validation = validate_schedule(&placements, &[], &input);
        let report = generate_text_report(&placements, &[], &input, &validation);

        assert!(report.contains("Section S1A1"));
        assert!(report.contains("CS101"));
        assert!(report.contains("R1 [08:00-09:15]"));
        assert!(report.contains("Room R1 (theory)"));
    }
}
