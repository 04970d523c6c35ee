use crate::types::{
    blackout, day_name, ElectivePlacement, Placement, ScheduleConstraints, ScheduleInput,
    SlotCatalog, SlotKind, SubjectCode,
};
use crate::validator::{Severity, Violation};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

fn error(constraint: &str, message: String) -> Violation {
    Violation {
        constraint: constraint.to_string(),
        message,
        severity: Severity::Error,
    }
}

/// No room hosts two classes in the same (day, slot), electives included
pub fn check_room_conflicts(
    placements: &[Placement],
    electives: &[ElectivePlacement],
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut seen: HashSet<(SlotKind, &str, u8, usize)> = HashSet::new();

    fn check<'a>(
        seen: &mut HashSet<(SlotKind, &'a str, u8, usize)>,
        violations: &mut Vec<Violation>,
        kind: SlotKind,
        room: &'a str,
        day: u8,
        slot: usize,
        label: String,
    ) {
        if !seen.insert((kind, room, day, slot)) {
            violations.push(error(
                "NoRoomConflict",
                format!(
                    "Room '{}' double-booked at {} {} slot {} ({})",
                    room,
                    day_name(day),
                    kind,
                    slot,
                    label
                ),
            ));
        }
    }

    for p in placements {
        check(&mut seen, &mut violations, p.kind, &p.room.0, p.day, p.slot, p.occupant_label());
    }
    for e in electives {
        check(&mut seen, &mut violations, e.kind, &e.room.0, e.day, e.slot, e.occupant_label());
    }
    violations
}

/// A section's same-day placements must be pairwise non-overlapping in time,
/// lab-theory pairs included
pub fn check_section_overlaps(placements: &[Placement], catalog: &SlotCatalog) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut by_section_day: BTreeMap<(&str, u8), Vec<&Placement>> = BTreeMap::new();
    for p in placements {
        by_section_day.entry((&p.section.0, p.day)).or_default().push(p);
    }

    for ((section, day), entries) in by_section_day {
        for i in 0..entries.len() {
            for j in i + 1..entries.len() {
                let a = entries[i];
                let b = entries[j];
                let ta = catalog.minutes(a.kind, a.slot);
                let tb = catalog.minutes(b.kind, b.slot);
                if ta.intersects(&tb) {
                    violations.push(error(
                        "NoSectionOverlap",
                        format!(
                            "Section '{}' has overlapping classes on {}: {} {} and {} {}",
                            section,
                            day_name(day),
                            a.subject,
                            ta.label(),
                            b.subject,
                            tb.label()
                        ),
                    ));
                }
            }
        }
    }
    violations
}

/// Every (section, subject) pair carries exactly `times_needed` placements.
/// Cohort-routed subjects are covered by their fixed offerings instead.
pub fn check_times_needed(placements: &[Placement], input: &ScheduleInput) -> Vec<Violation> {
    let mut violations = Vec::new();
    let cohort_codes: BTreeSet<(u32, &SubjectCode)> = input
        .cohorts
        .iter()
        .map(|o| (o.semester, &o.subject))
        .collect();

    let mut counts: HashMap<(&str, &SubjectCode), u32> = HashMap::new();
    for p in placements.iter().filter(|p| p.cohort_label.is_none()) {
        *counts.entry((&p.section.0, &p.subject)).or_insert(0) += 1;
    }

    let sections: BTreeSet<&str> = placements
        .iter()
        .filter(|p| p.cohort_label.is_none())
        .map(|p| p.section.0.as_str())
        .collect();
    for section in sections {
        let Some(semester) = crate::types::semester_of(&crate::types::SectionName(
            section.to_string(),
        )) else {
            continue;
        };
        let Some(courses) = input.courses_by_semester.get(&semester) else {
            continue;
        };
        for course in courses {
            if cohort_codes.contains(&(semester, &course.code)) {
                continue;
            }
            let placed = counts.get(&(section, &course.code)).copied().unwrap_or(0);
            if placed != course.times_needed {
                violations.push(error(
                    "ExactDemand",
                    format!(
                        "Section '{}' has {} placements of '{}', needs {}",
                        section, placed, course.code, course.times_needed
                    ),
                ));
            }
        }
    }
    violations
}

/// Multi-meeting theory subjects sit on distinct, non-consecutive days
pub fn check_theory_day_spacing(placements: &[Placement], input: &ScheduleInput) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut days: BTreeMap<(&str, &SubjectCode), Vec<u8>> = BTreeMap::new();
    for p in placements.iter().filter(|p| p.cohort_label.is_none()) {
        if p.kind == SlotKind::Theory {
            days.entry((&p.section.0, &p.subject)).or_default().push(p.day);
        }
    }

    for ((section, code), mut used_days) in days {
        let multi_meeting = input
            .subject(code)
            .map(|s| !s.is_lab && s.times_needed > 1)
            .unwrap_or(false);
        if !multi_meeting {
            continue;
        }
        used_days.sort_unstable();
        for pair in used_days.windows(2) {
            if pair[0] == pair[1] {
                violations.push(error(
                    "DistinctTheoryDays",
                    format!(
                        "Section '{}' has '{}' twice on {}",
                        section,
                        code,
                        day_name(pair[0])
                    ),
                ));
            } else if pair[1] - pair[0] == 1 {
                violations.push(error(
                    "NoConsecutiveTheoryDays",
                    format!(
                        "Section '{}' has '{}' on consecutive days {} and {}",
                        section,
                        code,
                        day_name(pair[0]),
                        day_name(pair[1])
                    ),
                ));
            }
        }
    }
    violations
}

/// The Friday theory-3 cell is a permanent blackout
pub fn check_blackout(placements: &[Placement], electives: &[ElectivePlacement]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for p in placements {
        if blackout(p.day, p.kind, p.slot) {
            violations.push(error(
                "Blackout",
                format!("'{}' placed in the Friday blackout slot", p.occupant_label()),
            ));
        }
    }
    for e in electives {
        if blackout(e.day, e.kind, e.slot) {
            violations.push(error(
                "Blackout",
                format!("'{}' placed in the Friday blackout slot", e.occupant_label()),
            ));
        }
    }
    violations
}

/// Each section uses at most `working_days_per_week` distinct days
pub fn check_working_days(
    placements: &[Placement],
    constraints: &ScheduleConstraints,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut days: BTreeMap<&str, BTreeSet<u8>> = BTreeMap::new();
    for p in placements {
        days.entry(&p.section.0).or_default().insert(p.day);
    }
    for (section, used) in days {
        if used.len() as u32 > constraints.working_days_per_week {
            violations.push(error(
                "WorkingDayCap",
                format!(
                    "Section '{}' uses {} days, cap is {}",
                    section,
                    used.len(),
                    constraints.working_days_per_week
                ),
            ));
        }
    }
    violations
}

/// Latest end minus earliest start within one day stays under the cap
pub fn check_daily_span(
    placements: &[Placement],
    catalog: &SlotCatalog,
    constraints: &ScheduleConstraints,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut spans: BTreeMap<(&str, u8), (u32, u32)> = BTreeMap::new();
    for p in placements {
        let time = catalog.minutes(p.kind, p.slot);
        let entry = spans
            .entry((&p.section.0, p.day))
            .or_insert((time.start, time.end));
        entry.0 = entry.0.min(time.start);
        entry.1 = entry.1.max(time.end);
    }
    for ((section, day), (start, end)) in spans {
        if end - start > constraints.allowed_span_minutes() {
            violations.push(error(
                "DailySpan",
                format!(
                    "Section '{}' spans {} minutes on {}, cap is {}",
                    section,
                    end - start,
                    day_name(day),
                    constraints.allowed_span_minutes()
                ),
            ));
        }
    }
    violations
}

/// Adjacent same-day classes of a section keep the minimum gap
pub fn check_min_gap(
    placements: &[Placement],
    catalog: &SlotCatalog,
    constraints: &ScheduleConstraints,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    if constraints.min_gap_minutes == 0 {
        return violations;
    }
    let mut by_day: BTreeMap<(&str, u8), Vec<(u32, u32)>> = BTreeMap::new();
    for p in placements {
        let time = catalog.minutes(p.kind, p.slot);
        by_day
            .entry((&p.section.0, p.day))
            .or_default()
            .push((time.start, time.end));
    }
    for ((section, day), mut times) in by_day {
        times.sort_unstable();
        for pair in times.windows(2) {
            let gap = pair[1].0 as i64 - pair[0].1 as i64;
            if gap < constraints.min_gap_minutes as i64 {
                violations.push(error(
                    "MinimumGap",
                    format!(
                        "Section '{}' has a {}-minute gap on {}, minimum is {}",
                        section,
                        gap.max(0),
                        day_name(day),
                        constraints.min_gap_minutes
                    ),
                ));
            }
        }
    }
    violations
}

/// No placement ends strictly after the cutoff hour, when one is set
pub fn check_cutoff(
    placements: &[Placement],
    electives: &[ElectivePlacement],
    catalog: &SlotCatalog,
    constraints: &ScheduleConstraints,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let Some(cutoff) = constraints.cutoff_minute() else {
        return violations;
    };
    for p in placements {
        if catalog.minutes(p.kind, p.slot).end > cutoff {
            violations.push(error(
                "Cutoff",
                format!(
                    "'{}' ends after the {}:00 cutoff",
                    p.occupant_label(),
                    cutoff / 60
                ),
            ));
        }
    }
    for e in electives {
        if catalog.minutes(e.kind, e.slot).end > cutoff {
            violations.push(error(
                "Cutoff",
                format!(
                    "'{}' ends after the {}:00 cutoff",
                    e.occupant_label(),
                    cutoff / 60
                ),
            ));
        }
    }
    violations
}

/// Special-lab subjects only ever sit in their designated rooms
pub fn check_special_labs(placements: &[Placement], input: &ScheduleInput) -> Vec<Violation> {
    let mut violations = Vec::new();
    for p in placements.iter().filter(|p| p.kind == SlotKind::Lab) {
        if let Some(allowed) = input.special_labs.get(&p.subject) {
            if !allowed.contains(&p.room) {
                violations.push(error(
                    "SpecialLabRoom",
                    format!(
                        "'{}' must use one of its special labs, found in '{}'",
                        p.subject, p.room
                    ),
                ));
            }
        }
    }
    violations
}

/// No teacher holds two placements in one time cell
pub fn check_teacher_conflicts(placements: &[Placement]) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut cells: HashMap<&str, HashSet<(u8, SlotKind, usize)>> = HashMap::new();
    for p in placements {
        if let Some(ref teacher) = p.teacher {
            if !cells.entry(&teacher.0).or_default().insert(p.slot_key()) {
                violations.push(error(
                    "NoTeacherConflict",
                    format!(
                        "Teacher '{}' double-booked at {} {} slot {}",
                        teacher,
                        day_name(p.day),
                        p.kind,
                        p.slot
                    ),
                ));
            }
        }
    }
    violations
}
