use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// A required field was missing or inconsistent on create/update.
/// Surfaced to the end user; the operation is aborted with no state change.
#[derive(Serialize, Error, Debug, Clone, Eq, PartialEq)]
pub enum ValidationError {
    #[error("A name is required")]
    EmptyName,
    #[error("At least one target grade must be selected")]
    NoTargetGrades,
    #[error("At least one candidate date must be set")]
    NoCandidateDates,
    #[error("Students must declare a grade")]
    MissingGrade,
    #[error("Teachers cannot have a grade")]
    UnexpectedGrade,
}

#[derive(Serialize, Error, Debug, Clone, Eq, PartialEq)]
#[error("Start date {start} is after end date {end}")]
pub struct RangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A slot key that did not come out of the codec.
#[derive(Serialize, Error, Debug, Clone, Eq, PartialEq)]
#[error("Malformed slot key `{key}`: expected `YYYY-MM-DD_HH:MM`")]
pub struct MalformedKeyError {
    pub key: String,
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("Event not found: {0}")]
    EventNotFound(String),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Save/load failed: {0}")]
    Persistence(#[from] PersistenceError),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Could not write configuration: {0}")]
    Write(String),
    #[error("Invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
