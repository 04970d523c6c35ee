use serde::{Deserialize, Serialize};

/// Runtime constraints applied to every section's week
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConstraints {
    #[serde(default = "default_max_hours_per_day")]
    pub max_hours_per_day: u32,
    #[serde(default = "default_working_days_per_week")]
    pub working_days_per_week: u32,
    #[serde(default = "default_min_gap_minutes")]
    pub min_gap_minutes: u32,
    /// When set, no class may end strictly after this hour (0-23)
    #[serde(default)]
    pub no_classes_after_hour: Option<u32>,
}

fn default_max_hours_per_day() -> u32 {
    8
}

fn default_working_days_per_week() -> u32 {
    6
}

fn default_min_gap_minutes() -> u32 {
    15
}

impl Default for ScheduleConstraints {
    fn default() -> Self {
        Self {
            max_hours_per_day: default_max_hours_per_day(),
            working_days_per_week: default_working_days_per_week(),
            min_gap_minutes: default_min_gap_minutes(),
            no_classes_after_hour: None,
        }
    }
}

impl ScheduleConstraints {
    /// Longest allowed span between a day's first start and last end
    pub fn allowed_span_minutes(&self) -> u32 {
        self.max_hours_per_day * 60
    }

    /// Minute-of-day cutoff, when `no_classes_after_hour` is set
    pub fn cutoff_minute(&self) -> Option<u32> {
        self.no_classes_after_hour.map(|h| h * 60)
    }
}

/// Tuning knobs passed through to the ILP layer and the hierarchical driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverHints {
    /// Wall-clock limit per solve, in seconds
    #[serde(default)]
    pub max_time_per_semester: Option<f64>,
    #[serde(default)]
    pub num_workers: Option<u32>,
    #[serde(default)]
    pub force_hierarchical: bool,
    /// Course count above which multi-semester runs solve per-semester
    #[serde(default = "default_hierarchical_threshold")]
    pub hierarchical_threshold: usize,
    /// Solve semesters in descending order instead of ascending
    #[serde(default)]
    pub semester_descending: bool,
}

fn default_hierarchical_threshold() -> usize {
    300
}

impl Default for SolverHints {
    fn default() -> Self {
        Self {
            max_time_per_semester: None,
            num_workers: None,
            force_hierarchical: false,
            hierarchical_threshold: default_hierarchical_threshold(),
            semester_descending: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = ScheduleConstraints::default();
        assert_eq!(c.max_hours_per_day, 8);
        assert_eq!(c.working_days_per_week, 6);
        assert_eq!(c.min_gap_minutes, 15);
        assert!(c.no_classes_after_hour.is_none());
        assert_eq!(c.allowed_span_minutes(), 480);
    }

    #[test]
    fn test_toml_partial_config_fills_defaults() {
        let c: ScheduleConstraints = toml::from_str("working_days_per_week = 5").unwrap();
        assert_eq!(c.working_days_per_week, 5);
        assert_eq!(c.max_hours_per_day, 8);
    }
}
