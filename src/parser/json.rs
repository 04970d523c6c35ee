use crate::error::{Result, TimetableError};
use crate::parser::aliases::{
    remap_columns, AliasTable, CAPACITY_ALIASES, COHORT_ALIASES, ELECTIVES_ALIASES,
    PREFERENCES_ALIASES, ROADMAP_ALIASES, ROOMS_ALIASES, SPECIAL_LABS_ALIASES, TIMESLOTS_ALIASES,
};
use crate::types::{
    CohortOffering, Elective, Room, RoomName, ScheduleConstraints, ScheduleInput, SlotCatalog,
    SlotKind, SlotTime, SolverHints, Subject, SubjectCode, TeacherName, TeacherPreference,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// A boolean cell that may arrive as a JSON bool or as text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
    Number(i64),
}

impl Flag {
    fn as_bool(&self, table: &str) -> Result<bool> {
        let value = match self {
            Flag::Bool(b) => return Ok(*b),
            Flag::Number(n) => return Ok(*n != 0),
            Flag::Text(s) => s.trim().to_lowercase(),
        };
        match value.as_str() {
            "true" | "yes" | "y" | "1" => Ok(true),
            "false" | "no" | "n" | "0" => Ok(false),
            other => Err(TimetableError::InvalidInput {
                table: table.to_string(),
                message: format!("unrecognized boolean value: '{}'", other),
            }
            .into()),
        }
    }
}

/// A weekday cell: 0-5 index or a day name
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DayCell {
    Index(u8),
    Name(String),
}

impl DayCell {
    fn as_index(&self, table: &str) -> Result<u8> {
        let day = match self {
            DayCell::Index(i) => *i,
            DayCell::Name(s) => {
                let prefix = s.trim().to_lowercase();
                match prefix.get(..3) {
                    Some("mon") => 0,
                    Some("tue") => 1,
                    Some("wed") => 2,
                    Some("thu") => 3,
                    Some("fri") => 4,
                    Some("sat") => 5,
                    _ => {
                        return Err(TimetableError::InvalidInput {
                            table: table.to_string(),
                            message: format!("unrecognized day: '{}'", s),
                        }
                        .into())
                    }
                }
            }
        };
        if day > 5 {
            return Err(TimetableError::InvalidInput {
                table: table.to_string(),
                message: format!("day index out of range: {}", day),
            }
            .into());
        }
        Ok(day)
    }
}

fn parse_slot_kind(raw: &str, table: &str) -> Result<SlotKind> {
    match raw.trim().to_lowercase().as_str() {
        "theory" | "t" | "lec" | "lecture" => Ok(SlotKind::Theory),
        "lab" | "l" => Ok(SlotKind::Lab),
        other => Err(TimetableError::InvalidInput {
            table: table.to_string(),
            message: format!("unrecognized slot type: '{}'", other),
        }
        .into()),
    }
}

#[derive(Debug, Deserialize)]
struct RoadmapRow {
    semester: u32,
    course_code: String,
    course_name: String,
    is_lab: Flag,
    times_needed: u32,
}

#[derive(Debug, Deserialize)]
struct RoomRow {
    room_name: String,
    room_type: String,
    #[serde(default)]
    capacity: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CapacityRow {
    semester: u32,
    student_count: u32,
}

#[derive(Debug, Deserialize)]
struct ElectiveRow {
    elective_code: String,
    #[serde(default)]
    elective_name: Option<String>,
    sections_count: u32,
    can_use_theory: Flag,
    can_use_lab: Flag,
}

#[derive(Debug, Deserialize)]
struct SpecialLabRow {
    course_code: String,
    #[serde(default)]
    room_name: Option<String>,
    #[serde(default)]
    rooms: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TimeSlotRow {
    day: DayCell,
    start: String,
    end: String,
    slot_type: String,
}

#[derive(Debug, Deserialize)]
struct CohortRow {
    cohort_semester: u32,
    course_code: String,
    section: String,
    capacity: u32,
    day: DayCell,
    slot: usize,
    slot_type: String,
    #[serde(default)]
    room: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PreferenceRow {
    teacher: String,
    course_code: String,
    sections_count: u32,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    can_theory: Option<Flag>,
    #[serde(default)]
    can_lab: Option<Flag>,
}

/// Optional `config.toml` contents: runtime constraints plus solver hints
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub constraints: ScheduleConstraints,
    #[serde(default)]
    pub hints: SolverHints,
}

/// Load all input tables from a directory of JSON files (plus an optional
/// `config.toml`). Missing optional tables fall back to empty sets; a missing
/// TimeSlots table seeds the built-in default catalog.
pub fn load_input_from_dir(dir: &Path) -> Result<ScheduleInput> {
    let roadmap: Vec<RoadmapRow> = load_rows(&dir.join("roadmap.json"), ROADMAP_ALIASES)?;
    let rooms: Vec<RoomRow> = load_rows(&dir.join("rooms.json"), ROOMS_ALIASES)?;
    let capacities: Vec<CapacityRow> =
        load_rows(&dir.join("student_capacity.json"), CAPACITY_ALIASES)?;
    let electives: Vec<ElectiveRow> =
        load_rows_optional(&dir.join("electives.json"), ELECTIVES_ALIASES)?;
    let special_labs: Vec<SpecialLabRow> =
        load_rows_optional(&dir.join("special_labs.json"), SPECIAL_LABS_ALIASES)?;
    let timeslots: Vec<TimeSlotRow> =
        load_rows_optional(&dir.join("timeslots.json"), TIMESLOTS_ALIASES)?;
    let cohort_rows: Vec<CohortRow> =
        load_rows_optional(&dir.join("cohort.json"), COHORT_ALIASES)?;
    let preference_rows: Vec<PreferenceRow> =
        load_rows_optional(&dir.join("teacher_preferences.json"), PREFERENCES_ALIASES)?;
    let config = load_config_or_default(&dir.join("config.toml"));

    let mut input = ScheduleInput {
        constraints: config.constraints,
        hints: config.hints,
        ..Default::default()
    };

    // Roadmap -> courses per semester; duplicate codes within one semester
    // are rejected
    for row in roadmap {
        let is_lab = row.is_lab.as_bool("roadmap")?;
        let courses = input.courses_by_semester.entry(row.semester).or_default();
        if courses.iter().any(|c| c.code.0 == row.course_code) {
            return Err(TimetableError::DuplicateId {
                id_type: format!("course in semester {}", row.semester),
                id: row.course_code,
            }
            .into());
        }
        courses.push(Subject {
            code: SubjectCode(row.course_code),
            name: row.course_name,
            is_lab,
            times_needed: row.times_needed,
        });
    }

    for row in rooms {
        let name = row.room_name.trim().to_string();
        if name.is_empty() {
            return Err(TimetableError::InvalidInput {
                table: "rooms".to_string(),
                message: "blank room name".to_string(),
            }
            .into());
        }
        if input.rooms.iter().any(|r| r.name.0 == name) {
            return Err(TimetableError::DuplicateId {
                id_type: "room".to_string(),
                id: name,
            }
            .into());
        }
        input.rooms.push(Room {
            name: RoomName(name),
            kind: parse_slot_kind(&row.room_type, "rooms")?,
            capacity: row.capacity.unwrap_or(30),
        });
    }

    for row in capacities {
        if input
            .student_counts
            .insert(row.semester, row.student_count)
            .is_some()
        {
            return Err(TimetableError::DuplicateId {
                id_type: "student capacity semester".to_string(),
                id: row.semester.to_string(),
            }
            .into());
        }
    }

    for row in electives {
        input.electives.push(Elective {
            name: row
                .elective_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| row.elective_code.clone()),
            code: SubjectCode(row.elective_code),
            sections_count: row.sections_count,
            can_use_theory: row.can_use_theory.as_bool("electives")?,
            can_use_lab: row.can_use_lab.as_bool("electives")?,
        });
    }

    for row in special_labs {
        let mut room_names: Vec<String> = Vec::new();
        if let Some(name) = row.room_name {
            room_names.push(name);
        }
        if let Some(names) = row.rooms {
            room_names.extend(names);
        }
        if room_names.is_empty() {
            return Err(TimetableError::InvalidInput {
                table: "special_labs".to_string(),
                message: format!("no rooms listed for course '{}'", row.course_code),
            }
            .into());
        }
        let set = input
            .special_labs
            .entry(SubjectCode(row.course_code))
            .or_default();
        for name in room_names {
            let name = RoomName(name.trim().to_string());
            // A special lab not declared in the rooms table is registered as
            // a lab room on the fly
            if !input.rooms.iter().any(|r| r.name == name) {
                input.rooms.push(Room {
                    name: name.clone(),
                    kind: SlotKind::Lab,
                    capacity: 30,
                });
            }
            set.insert(name);
        }
    }

    input.catalog = build_catalog(timeslots)?;

    for row in cohort_rows {
        let day = row.day.as_index("cohort")?;
        let kind = parse_slot_kind(&row.slot_type, "cohort")?;
        let room = row.room.map(|r| RoomName(r.trim().to_string()));
        let code = SubjectCode(row.course_code);

        // Oversized cohorts are split into 50-seat labels: C08 -> C08-A, ...
        if row.capacity > 50 {
            let mut remaining = row.capacity;
            let mut letter = 0u8;
            while remaining > 0 {
                let size = remaining.min(50);
                input.cohorts.push(CohortOffering {
                    semester: row.cohort_semester,
                    subject: code.clone(),
                    label: format!("{}-{}", row.section, (b'A' + letter) as char),
                    day,
                    slot: row.slot,
                    kind,
                    capacity: size,
                    room: room.clone(),
                });
                remaining -= size;
                letter += 1;
            }
        } else {
            input.cohorts.push(CohortOffering {
                semester: row.cohort_semester,
                subject: code,
                label: row.section,
                day,
                slot: row.slot,
                kind,
                capacity: row.capacity,
                room,
            });
        }
    }

    for row in preference_rows {
        let (can_theory, can_lab) = match row.kind.as_deref() {
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "theory" | "t" => (true, false),
                "lab" | "l" => (false, true),
                "*" | "both" | "any" => (true, true),
                other => {
                    return Err(TimetableError::InvalidInput {
                        table: "teacher_preferences".to_string(),
                        message: format!("unrecognized preference type: '{}'", other),
                    }
                    .into())
                }
            },
            None => (
                row.can_theory
                    .as_ref()
                    .map(|f| f.as_bool("teacher_preferences"))
                    .transpose()?
                    .unwrap_or(true),
                row.can_lab
                    .as_ref()
                    .map(|f| f.as_bool("teacher_preferences"))
                    .transpose()?
                    .unwrap_or(true),
            ),
        };
        input.preferences.push(TeacherPreference {
            teacher: TeacherName(row.teacher.trim().to_string()),
            course_code: row.course_code.trim().to_string(),
            sections_count: row.sections_count,
            can_theory,
            can_lab,
        });
    }

    Ok(input)
}

/// Derive the canonical per-day slot sequences from the TimeSlots table.
/// Rows repeat per weekday; the catalog keeps one ordered sequence per kind.
fn build_catalog(rows: Vec<TimeSlotRow>) -> Result<SlotCatalog> {
    if rows.is_empty() {
        return Ok(SlotCatalog::standard());
    }
    let mut theory: BTreeSet<(u32, u32)> = BTreeSet::new();
    let mut lab: BTreeSet<(u32, u32)> = BTreeSet::new();
    for row in rows {
        row.day.as_index("timeslots")?;
        let time = SlotTime::parse(&row.start, &row.end)?;
        if time.start >= time.end {
            return Err(TimetableError::InvalidInput {
                table: "timeslots".to_string(),
                message: format!("slot must start before it ends: {}", time.label()),
            }
            .into());
        }
        match parse_slot_kind(&row.slot_type, "timeslots")? {
            SlotKind::Theory => theory.insert((time.start, time.end)),
            SlotKind::Lab => lab.insert((time.start, time.end)),
        };
    }
    let to_slots = |set: BTreeSet<(u32, u32)>| -> Vec<SlotTime> {
        set.into_iter()
            .map(|(start, end)| SlotTime::new(start, end))
            .collect()
    };
    Ok(SlotCatalog::new(to_slots(theory), to_slots(lab)))
}

/// Load config from TOML file, or use defaults
pub fn load_config_or_default(path: &Path) -> ConfigFile {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => ConfigFile::default(),
        }
    } else {
        ConfigFile::default()
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let path_str = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| TimetableError::FileRead {
        path: path_str.clone(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| {
        TimetableError::JsonParse {
            file: path_str,
            message: e.to_string(),
        }
        .into()
    })
}

/// Load an array of records, remapping aliased column names first
fn load_rows<T: DeserializeOwned>(path: &Path, aliases: AliasTable) -> Result<Vec<T>> {
    let mut value = read_json(path)?;
    let path_str = path.display().to_string();
    let rows = value.as_array_mut().ok_or_else(|| TimetableError::JsonParse {
        file: path_str.clone(),
        message: "expected an array of records".to_string(),
    })?;
    for row in rows.iter_mut() {
        remap_columns(row, aliases);
    }
    serde_json::from_value(value).map_err(|e| {
        TimetableError::JsonParse {
            file: path_str,
            message: e.to_string(),
        }
        .into()
    })
}

fn load_rows_optional<T: DeserializeOwned>(path: &Path, aliases: AliasTable) -> Result<Vec<T>> {
    if path.exists() {
        load_rows(path, aliases)
    } else {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("uni-timetabler-data-{}-{}", tag, nanos));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_full_directory_with_aliased_columns() {
        let dir = temp_dir("load");

        fs::write(
            dir.join("roadmap.json"),
            r#"[{"Sem No": 1, "Course Code": "CS101", "course_name": "Intro",
                 "Lab": "false", "Weekly Sessions": 2},
                {"semester": 1, "course_code": "CS101L", "course_name": "Intro Lab",
                 "is_lab": true, "times_needed": 1}]"#,
        )
        .unwrap();
        fs::write(
            dir.join("rooms.json"),
            r#"[{"Room": "R1", "Type": "lecture"},
                {"room_name": "L1", "room_type": "lab", "capacity": 24}]"#,
        )
        .unwrap();
        fs::write(
            dir.join("student_capacity.json"),
            r#"[{"semester": 1, "Students": 80}]"#,
        )
        .unwrap();
        fs::write(
            dir.join("special_labs.json"),
            r#"[{"course_code": "CS101L", "rooms": ["L1", "L2"]}]"#,
        )
        .unwrap();
        fs::write(
            dir.join("cohort.json"),
            r#"[{"Semester": 1, "course_code": "CS101", "Section": "C08",
                 "capacity": 120, "day": "Monday", "slot": 0, "slot_type": "theory"}]"#,
        )
        .unwrap();
        fs::write(
            dir.join("teacher_preferences.json"),
            r#"[{"Teacher Name": "Alice", "Course Code": "CS101",
                 "Sections Count": 2, "Type": "Theory"}]"#,
        )
        .unwrap();

        let input = load_input_from_dir(&dir).unwrap();

        let courses = &input.courses_by_semester[&1];
        assert_eq!(courses.len(), 2);
        assert!(!courses[0].is_lab);
        assert_eq!(courses[0].times_needed, 2);

        // L2 was auto-registered as a lab room
        assert_eq!(input.rooms.len(), 3);
        assert_eq!(input.student_counts[&1], 80);
        assert_eq!(
            input.special_labs[&SubjectCode("CS101L".to_string())].len(),
            2
        );

        // 120-seat cohort split into 50+50+20 labels
        assert_eq!(input.cohorts.len(), 3);
        let labels: Vec<&str> = input.cohorts.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["C08-A", "C08-B", "C08-C"]);
        assert_eq!(input.cohorts[2].capacity, 20);
        assert_eq!(input.cohorts[0].day, 0);

        let pref = &input.preferences[0];
        assert!(pref.can_theory && !pref.can_lab);

        // No timeslots table: the default catalog is seeded
        assert_eq!(input.catalog.theory_slots().len(), 7);
        assert_eq!(input.catalog.lab_slots().len(), 4);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_duplicate_course_in_semester_rejected() {
        let dir = temp_dir("dup");
        fs::write(
            dir.join("roadmap.json"),
            r#"[{"semester": 1, "course_code": "CS101", "course_name": "A",
                 "is_lab": false, "times_needed": 1},
                {"semester": 1, "course_code": "CS101", "course_name": "B",
                 "is_lab": false, "times_needed": 2}]"#,
        )
        .unwrap();
        fs::write(dir.join("rooms.json"), "[]").unwrap();
        fs::write(dir.join("student_capacity.json"), "[]").unwrap();

        assert!(load_input_from_dir(&dir).is_err());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_custom_timeslots_override_catalog() {
        let dir = temp_dir("slots");
        fs::write(dir.join("roadmap.json"), "[]").unwrap();
        fs::write(dir.join("rooms.json"), "[]").unwrap();
        fs::write(dir.join("student_capacity.json"), "[]").unwrap();
        fs::write(
            dir.join("timeslots.json"),
            r#"[{"day": 0, "start": "09:00", "end": "10:00", "slot_type": "theory"},
                {"day": 1, "start": "09:00", "end": "10:00", "slot_type": "theory"},
                {"day": 0, "start": "10:15", "end": "11:15", "slot_type": "theory"},
                {"day": 0, "start": "09:00", "end": "11:00", "slot_type": "lab"}]"#,
        )
        .unwrap();

        let input = load_input_from_dir(&dir).unwrap();
        assert_eq!(input.catalog.theory_slots().len(), 2);
        assert_eq!(input.catalog.lab_slots().len(), 1);
        // The 09:00-11:00 lab block overlaps both theory slots
        assert_eq!(input.catalog.overlapping_theory(0), &[0, 1]);

        fs::remove_dir_all(&dir).ok();
    }
}
