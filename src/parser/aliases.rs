use serde_json::Value;

/// Column alias table: canonical field name plus the normalized spellings
/// accepted for it.
pub type AliasTable = &'static [(&'static str, &'static [&'static str])];

pub const ROADMAP_ALIASES: AliasTable = &[
    ("semester", &["sem", "semno", "semnumber", "semesternumber"]),
    ("course_code", &["coursecode", "code", "course"]),
    ("course_name", &["coursename", "title"]),
    ("is_lab", &["islab", "lab"]),
    (
        "times_needed",
        &["timesneeded", "times", "weeklysessions", "sessionsperweek"],
    ),
];

pub const ROOMS_ALIASES: AliasTable = &[
    ("room_name", &["roomname", "name", "room"]),
    ("room_type", &["roomtype", "type", "kind"]),
    ("capacity", &["cap", "seats"]),
];

pub const CAPACITY_ALIASES: AliasTable = &[
    ("semester", &["sem", "semno", "semnumber"]),
    ("student_count", &["studentcount", "students", "count", "headcount"]),
];

pub const ELECTIVES_ALIASES: AliasTable = &[
    ("elective_code", &["electivecode", "code", "coursecode"]),
    ("elective_name", &["electivename", "name", "coursename"]),
    ("sections_count", &["sectionscount", "sections", "sectioncount"]),
    ("can_use_theory", &["canusetheory", "cantheory", "theory"]),
    ("can_use_lab", &["canuselab", "canlab", "lab"]),
];

pub const SPECIAL_LABS_ALIASES: AliasTable = &[
    ("course_code", &["coursecode", "code", "course"]),
    ("room_name", &["roomname", "room"]),
    ("rooms", &["roomnames", "roomlist"]),
];

pub const TIMESLOTS_ALIASES: AliasTable = &[
    ("day", &["weekday", "dayofweek"]),
    ("start", &["starttime", "from"]),
    ("end", &["endtime", "to"]),
    ("slot_type", &["slottype", "type", "kind"]),
];

pub const COHORT_ALIASES: AliasTable = &[
    (
        "cohort_semester",
        &["cohortsemester", "semester", "sem", "semno", "semnumber"],
    ),
    ("course_code", &["coursecode", "code", "course"]),
    ("course_name", &["coursename", "name"]),
    (
        "section",
        &["cohortsection", "cohort", "sectionlabel", "sectionname"],
    ),
    ("capacity", &["cap", "seats"]),
    ("day", &["weekday", "fixedday"]),
    ("slot", &["slotindex", "timeslot", "fixedslot"]),
    ("slot_type", &["slottype", "type", "kind"]),
    ("room", &["roomname", "cohortroom"]),
];

pub const PREFERENCES_ALIASES: AliasTable = &[
    ("teacher", &["teachername", "name"]),
    ("course_code", &["coursecode", "code", "course"]),
    ("sections_count", &["sectionscount", "sections", "sectioncount"]),
    ("type", &["slottype", "kind", "preference"]),
    ("can_theory", &["cantheory"]),
    ("can_lab", &["canlab"]),
];

/// Normalize a raw column key: case-fold and strip non-alphanumerics
pub fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Rename a record's keys to their canonical field names before schema
/// checking. A key matches a canonical field when its normalized form equals
/// the normalized canonical name or any listed alias.
pub fn remap_columns(row: &mut Value, aliases: AliasTable) {
    let Some(obj) = row.as_object_mut() else {
        return;
    };
    let keys: Vec<String> = obj.keys().cloned().collect();
    for (canonical, accepted) in aliases {
        if obj.contains_key(*canonical) {
            continue;
        }
        let canonical_norm = normalize_key(canonical);
        for key in &keys {
            if obj.contains_key(*canonical) {
                break;
            }
            let norm = normalize_key(key);
            if norm == canonical_norm || accepted.contains(&norm.as_str()) {
                if let Some(value) = obj.remove(key) {
                    obj.insert(canonical.to_string(), value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_key_strips_and_folds() {
        assert_eq!(normalize_key("Course Code"), "coursecode");
        assert_eq!(normalize_key("Times_Needed"), "timesneeded");
        assert_eq!(normalize_key("IS-LAB?"), "islab");
    }

    #[test]
    fn test_remap_renames_aliased_columns() {
        let mut row = json!({
            "Sem No": 3,
            "Course Code": "CS201",
            "course_name": "Algorithms",
            "Lab": false,
            "Weekly Sessions": 2
        });
        remap_columns(&mut row, ROADMAP_ALIASES);
        let obj = row.as_object().unwrap();
        assert_eq!(obj["semester"], 3);
        assert_eq!(obj["course_code"], "CS201");
        assert_eq!(obj["course_name"], "Algorithms");
        assert_eq!(obj["is_lab"], false);
        assert_eq!(obj["times_needed"], 2);
    }

    #[test]
    fn test_remap_keeps_canonical_columns_untouched() {
        let mut row = json!({"semester": 1, "sem": 9});
        remap_columns(&mut row, ROADMAP_ALIASES);
        assert_eq!(row.as_object().unwrap()["semester"], 1);
    }
}
