use crate::error::{Result, TimetableError};
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheduling week runs Monday (0) through Saturday (5)
pub const DAYS_PER_WEEK: u8 = 6;

pub const FRIDAY: u8 = 4;

/// Theory slot index that is permanently blocked on Fridays
const BLACKOUT_THEORY_SLOT: usize = 3;

/// Whether a slot hosts a theory class or a lab block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Theory,
    Lab,
}

impl SlotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKind::Theory => "theory",
            SlotKind::Lab => "lab",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable day name for a 0-based weekday index
pub fn day_name(day: u8) -> &'static str {
    match day {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        _ => "Unknown",
    }
}

/// A (day, kind, slot) triple no placement may ever occupy
pub fn blackout(day: u8, kind: SlotKind, slot: usize) -> bool {
    day == FRIDAY && kind == SlotKind::Theory && slot == BLACKOUT_THEORY_SLOT
}

/// A minute interval within one day, end-exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTime {
    pub start: u32,
    pub end: u32,
}

impl SlotTime {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Parse "HH:MM" start/end strings into a minute interval
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse_one = |s: &str| -> Result<u32> {
            let t = NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| {
                TimetableError::InvalidInput {
                    table: "timeslots".to_string(),
                    message: format!("unrecognized time format: '{}'", s),
                }
            })?;
            Ok(t.hour() * 60 + t.minute())
        };
        Ok(Self {
            start: parse_one(start)?,
            end: parse_one(end)?,
        })
    }

    pub fn intersects(&self, other: &SlotTime) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// "08:00-09:15" style label
    pub fn label(&self) -> String {
        format!(
            "{:02}:{:02}-{:02}:{:02}",
            self.start / 60,
            self.start % 60,
            self.end / 60,
            self.end % 60
        )
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Canonical theory/lab slot sequences, shared by every day of the week.
///
/// The index into each sequence is the variable key the solvers use; the
/// lab->theory overlap map is derived once from the minute intervals and is
/// the authoritative overlap predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotCatalog {
    theory: Vec<SlotTime>,
    lab: Vec<SlotTime>,
    /// lab slot index -> theory slot indices whose intervals intersect it
    overlap: Vec<Vec<usize>>,
}

impl SlotCatalog {
    pub fn new(theory: Vec<SlotTime>, lab: Vec<SlotTime>) -> Self {
        let overlap = lab
            .iter()
            .map(|ls| {
                theory
                    .iter()
                    .enumerate()
                    .filter(|(_, ts)| ls.intersects(ts))
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();
        Self { theory, lab, overlap }
    }

    /// The built-in default catalog, seeded when no TimeSlots table is given
    pub fn standard() -> Self {
        let theory = vec![
            SlotTime::new(8 * 60, 9 * 60 + 15),
            SlotTime::new(9 * 60 + 30, 10 * 60 + 45),
            SlotTime::new(11 * 60, 12 * 60 + 15),
            SlotTime::new(12 * 60 + 30, 13 * 60 + 45),
            SlotTime::new(14 * 60, 15 * 60 + 15),
            SlotTime::new(15 * 60 + 30, 16 * 60 + 45),
            SlotTime::new(17 * 60, 18 * 60 + 15),
        ];
        let lab = vec![
            SlotTime::new(8 * 60, 10 * 60 + 30),
            SlotTime::new(11 * 60, 13 * 60 + 30),
            SlotTime::new(14 * 60, 16 * 60 + 30),
            SlotTime::new(17 * 60, 19 * 60 + 30),
        ];
        Self::new(theory, lab)
    }

    pub fn theory_slots(&self) -> &[SlotTime] {
        &self.theory
    }

    pub fn lab_slots(&self) -> &[SlotTime] {
        &self.lab
    }

    pub fn slots(&self, kind: SlotKind) -> &[SlotTime] {
        match kind {
            SlotKind::Theory => &self.theory,
            SlotKind::Lab => &self.lab,
        }
    }

    pub fn minutes(&self, kind: SlotKind, slot: usize) -> SlotTime {
        self.slots(kind)[slot]
    }

    pub fn overlaps(&self, theory_slot: usize, lab_slot: usize) -> bool {
        self.overlap[lab_slot].contains(&theory_slot)
    }

    /// Theory slot indices intersecting the given lab slot
    pub fn overlapping_theory(&self, lab_slot: usize) -> &[usize] {
        &self.overlap[lab_slot]
    }

    /// Lab slot indices intersecting the given theory slot
    pub fn overlapping_labs(&self, theory_slot: usize) -> Vec<usize> {
        self.overlap
            .iter()
            .enumerate()
            .filter(|(_, ths)| ths.contains(&theory_slot))
            .map(|(ls, _)| ls)
            .collect()
    }

    /// Sorted "HH:MM-HH:MM" window labels, used by the run fingerprint
    pub fn windows(&self, kind: SlotKind) -> Vec<String> {
        let mut labels: Vec<String> = self.slots(kind).iter().map(|s| s.label()).collect();
        labels.sort();
        labels
    }
}

impl Default for SlotCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_overlap_map() {
        let catalog = SlotCatalog::standard();

        // Each 2.5h lab block straddles the theory slots in its half-day
        assert_eq!(catalog.overlapping_theory(0), &[0, 1]);
        assert_eq!(catalog.overlapping_theory(1), &[2, 3]);
        assert_eq!(catalog.overlapping_theory(2), &[4, 5]);
        assert_eq!(catalog.overlapping_theory(3), &[6]);

        assert!(catalog.overlaps(2, 1));
        assert!(!catalog.overlaps(0, 1));
        assert_eq!(catalog.overlapping_labs(3), vec![1]);
    }

    #[test]
    fn test_blackout_is_friday_theory_3_only() {
        assert!(blackout(FRIDAY, SlotKind::Theory, 3));
        assert!(!blackout(FRIDAY, SlotKind::Theory, 2));
        assert!(!blackout(FRIDAY, SlotKind::Lab, 3));
        assert!(!blackout(0, SlotKind::Theory, 3));
    }

    #[test]
    fn test_parse_and_label_round_trip() {
        let slot = SlotTime::parse("08:00", "09:15").unwrap();
        assert_eq!(slot.start, 480);
        assert_eq!(slot.end, 555);
        assert_eq!(slot.label(), "08:00-09:15");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SlotTime::parse("8 o'clock", "09:15").is_err());
    }

    #[test]
    fn test_interval_intersection_is_end_exclusive() {
        let a = SlotTime::new(480, 555);
        let b = SlotTime::new(555, 630);
        assert!(!a.intersects(&b));
        let c = SlotTime::new(540, 600);
        assert!(a.intersects(&c));
        assert!(c.intersects(&a));
    }
}
