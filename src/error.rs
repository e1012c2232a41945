//! Structured error types for the assignment core and its surfaces.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Employee,
    Task,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Employee => write!(f, "employee"),
            Entity::Task => write!(f, "task"),
        }
    }
}

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Not found errors
    EmployeeNotFound,
    TaskNotFound,
    NoEmployees,

    // Validation errors
    InvalidFieldValue,
    TooManyRows,

    // Internal errors
    StoreUnavailable,
    InternalError,
}

/// Errors surfaced by the store and the assignment core.
///
/// Nothing here is retried: every variant propagates unchanged to the caller.
#[derive(Debug, Error)]
pub enum AssignError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: i64 },

    #[error("no employees available for assignment")]
    NoEmployees,

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("query matched at least {limit} rows, refine the search")]
    TooManyRows { limit: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

impl AssignError {
    pub fn employee_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: Entity::Employee,
            id,
        }
    }

    pub fn task_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: Entity::Task,
            id,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// Machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            AssignError::NotFound {
                entity: Entity::Employee,
                ..
            } => ErrorCode::EmployeeNotFound,
            AssignError::NotFound {
                entity: Entity::Task,
                ..
            } => ErrorCode::TaskNotFound,
            AssignError::NoEmployees => ErrorCode::NoEmployees,
            AssignError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
            AssignError::InvalidInput(_) => ErrorCode::InvalidFieldValue,
            AssignError::TooManyRows { .. } => ErrorCode::TooManyRows,
            AssignError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl From<rusqlite::Error> for AssignError {
    fn from(err: rusqlite::Error) -> Self {
        AssignError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for AssignError {
    fn from(err: serde_json::Error) -> Self {
        AssignError::Internal(err.to_string())
    }
}

/// Structured error body for API and CLI responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&AssignError> for ErrorBody {
    fn from(err: &AssignError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Result type for store and assignment operations.
pub type Result<T> = std::result::Result<T, AssignError>;
