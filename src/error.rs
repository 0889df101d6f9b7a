use thiserror::Error;

use crate::schedule::snapshot::EmployeeId;

/// Errors produced by the schedule domain and its collaborators
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("malformed time label: {0:?}")]
    MalformedTimeLabel(String),

    #[error("malformed snapshot token: {0}")]
    MalformedSnapshotToken(String),

    #[error("invalid week key: {0:?}")]
    InvalidWeekKey(String),

    #[error("no employee with id {0}")]
    UnknownEmployee(EmployeeId),

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for ScheduleError {
    fn from(err: toml::de::Error) -> Self {
        ScheduleError::Config(err.to_string())
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Helper to create persistence errors
pub fn persistence_error(message: impl Into<String>) -> ScheduleError {
    ScheduleError::Persistence(message.into())
}
