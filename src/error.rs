use crate::types::SlotKind;
use thiserror::Error;

/// Domain-specific errors for the timetabler
#[derive(Error, Debug)]
pub enum TimetableError {
    // Input/Parse errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in '{file}': {message}")]
    JsonParse { file: String, message: String },

    #[error("Invalid input in {table}: {message}")]
    InvalidInput { table: String, message: String },

    #[error("Duplicate ID found: {id_type} '{id}'")]
    DuplicateId { id_type: String, id: String },

    // Pre-solve checks
    #[error("Not enough free {kind} slots: need {needed}, have {available}")]
    Capacity {
        kind: SlotKind,
        needed: usize,
        available: usize,
    },

    // Solver errors
    #[error("ILP solver failed: {0}")]
    SolverFailed(String),

    #[error("No feasible timetable found")]
    Infeasible,

    // Persistence errors
    #[error("Failed to persist schedule: {0}")]
    Integrity(String),
}

/// Use anyhow::Result at application boundaries
pub type Result<T> = anyhow::Result<T>;
