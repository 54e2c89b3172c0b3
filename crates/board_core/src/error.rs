use crate::schema::{ParseEnumError, ResolutionStatus};
use std::fmt;

/// Operation a caller asked for against a resolution in some lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Open,
    Close,
    Delete,
    UpdateMetadata,
    CastVote,
    RetractVote,
    Sign,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Action::Open => "open",
            Action::Close => "close",
            Action::Delete => "delete",
            Action::UpdateMetadata => "update metadata",
            Action::CastVote => "cast vote",
            Action::RetractVote => "retract vote",
            Action::Sign => "sign",
        };
        f.write_str(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("unauthorized")]
    Unauthorized,

    /// Missing and foreign-tenant records are reported the same way.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("invalid {field}: {message}")]
    ValidationFailed { field: &'static str, message: String },

    #[error("cannot {requested} a resolution that is {current}")]
    InvalidStateTransition {
        current: ResolutionStatus,
        requested: Action,
    },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("storage failure: {0}")]
    StorageFailure(String),
}

pub type BoardResult<T> = Result<T, BoardError>;

impl BoardError {
    /// Stable machine-readable kind, used in CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            BoardError::Unauthorized => "unauthorized",
            BoardError::NotFound { .. } => "not_found",
            BoardError::ValidationFailed { .. } => "validation_failed",
            BoardError::InvalidStateTransition { .. } => "invalid_state_transition",
            BoardError::Conflict { .. } => "conflict",
            BoardError::StorageFailure(_) => "storage_failure",
        }
    }

    pub fn not_found(entity: &'static str) -> Self {
        BoardError::NotFound { entity }
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        BoardError::ValidationFailed {
            field,
            message: message.into(),
        }
    }

    pub fn transition(current: ResolutionStatus, requested: Action) -> Self {
        BoardError::InvalidStateTransition { current, requested }
    }
}

impl From<rusqlite::Error> for BoardError {
    fn from(err: rusqlite::Error) -> Self {
        tracing::error!(error = %err, "store operation failed");
        BoardError::StorageFailure(err.to_string())
    }
}

impl From<ParseEnumError> for BoardError {
    fn from(err: ParseEnumError) -> Self {
        BoardError::ValidationFailed {
            field: err.kind,
            message: format!("unknown value {:?}", err.value),
        }
    }
}
