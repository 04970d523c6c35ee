use crate::error::{Result, TimetableError};
use crate::types::{ElectivePlacement, Placement};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which run a record belongs to, for the no-change short-circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    Main,
    Electives,
}

/// Metadata of one successful solver run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub kind: RunKind,
    pub input_hash: String,
    pub created: usize,
    pub created_at: String,
}

/// Everything the repository persists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub placements: Vec<Placement>,
    #[serde(default)]
    pub electives: Vec<ElectivePlacement>,
    #[serde(default)]
    pub runs: Vec<RunRecord>,
}

/// JSON-file-backed schedule repository.
///
/// Mutations are staged in memory; `commit` serializes the whole state to a
/// temporary file and renames it over the old one, so a run's writes land
/// all-or-nothing.
#[derive(Debug)]
pub struct ScheduleStore {
    path: PathBuf,
    pub state: StoreState,
}

impl ScheduleStore {
    pub fn open(path: &Path) -> Result<Self> {
        let state = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| TimetableError::FileRead {
                path: path.display().to_string(),
                source: e,
            })?;
            serde_json::from_str(&content).map_err(|e| TimetableError::JsonParse {
                file: path.display().to_string(),
                message: e.to_string(),
            })?
        } else {
            StoreState::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    /// Latest recorded run of the given kind
    pub fn last_run(&self, kind: RunKind) -> Option<&RunRecord> {
        self.state.runs.iter().rev().find(|r| r.kind == kind)
    }

    pub fn record_run(&mut self, kind: RunKind, input_hash: String, created: usize) {
        self.state.runs.push(RunRecord {
            kind,
            input_hash,
            created,
            created_at: chrono::Utc::now().to_rfc3339(),
        });
    }

    /// Write the staged state to disk atomically
    pub fn commit(&self) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&self.state)
            .map_err(|e| TimetableError::Integrity(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serialized).map_err(|e| TimetableError::Integrity(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| TimetableError::Integrity(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RoomName, SectionName, SlotKind, SubjectCode};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("uni-timetabler-{}-{}.json", tag, nanos))
    }

    #[test]
    fn test_commit_and_reload_round_trip() {
        let path = temp_path("roundtrip");
        let mut store = ScheduleStore::open(&path).unwrap();
        store.state.placements.push(Placement {
            section: SectionName("S1A1".to_string()),
            subject: SubjectCode("CS101".to_string()),
            room: RoomName("R1".to_string()),
            day: 2,
            kind: SlotKind::Theory,
            slot: 1,
            cohort_label: None,
            teacher: None,
        });
        store.record_run(RunKind::Main, "abc123".to_string(), 1);
        store.commit().unwrap();

        let reloaded = ScheduleStore::open(&path).unwrap();
        assert_eq!(reloaded.state.placements.len(), 1);
        assert_eq!(reloaded.state.placements[0].day, 2);
        let last = reloaded.last_run(RunKind::Main).unwrap();
        assert_eq!(last.input_hash, "abc123");
        assert!(reloaded.last_run(RunKind::Electives).is_none());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_last_run_picks_newest_of_kind() {
        let path = temp_path("lastrun");
        let mut store = ScheduleStore::open(&path).unwrap();
        store.record_run(RunKind::Main, "first".to_string(), 0);
        store.record_run(RunKind::Electives, "other".to_string(), 0);
        store.record_run(RunKind::Main, "second".to_string(), 0);

        assert_eq!(store.last_run(RunKind::Main).unwrap().input_hash, "second");
        assert_eq!(
            store.last_run(RunKind::Electives).unwrap().input_hash,
            "other"
        );
    }
}
