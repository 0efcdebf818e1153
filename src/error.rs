//! Error types and handling.

use thiserror::Error;

/// Maximum length (in characters) of department names, employee names and positions.
pub const MAX_TEXT_LEN: usize = 200;

/// Broad error category shared by the services and the command-line front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Empty or oversized fields, invalid mode, missing required parameter.
    Validation,
    /// Department, employee, parent or reassign target absent.
    NotFound,
    /// Business-rule violation.
    Conflict,
    /// Store I/O failure or timeout.
    Infrastructure,
}

impl ErrorKind {
    /// Process exit code used by the CLI for this kind of failure.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Validation => 2,
            Self::NotFound => 3,
            Self::Conflict => 4,
            Self::Infrastructure => 1,
        }
    }
}

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Department name empty or too long
    #[error("name must be non-empty and max {} characters", MAX_TEXT_LEN)]
    InvalidName,

    /// Employee full name empty or too long
    #[error("full_name must be non-empty and max {} characters", MAX_TEXT_LEN)]
    InvalidFullName,

    /// Employee position empty or too long
    #[error("position must be non-empty and max {} characters", MAX_TEXT_LEN)]
    InvalidPosition,

    /// Unknown delete mode
    #[error("invalid mode '{0}', must be 'cascade' or 'reassign'")]
    InvalidMode(String),

    /// Read depth outside the allowed range
    #[error("depth must be between 1 and {max}, got {depth}")]
    InvalidDepth { depth: u32, max: u32 },

    /// Reassign delete without a target
    #[error("reassign_to is required for reassign mode")]
    ReassignTargetRequired,

    /// Department does not exist
    #[error("department {0} not found")]
    NotFound(i32),

    /// Parent department does not exist
    #[error("parent department {0} not found")]
    ParentNotFound(i32),

    /// Reassign target does not exist
    #[error("target department {0} not found")]
    TargetDepartmentNotFound(i32),

    /// Department referenced by a new employee does not exist
    #[error("department {0} not found")]
    DepartmentNotFound(i32),

    /// Sibling with the same name already exists
    #[error("department with name '{0}' already exists under the same parent")]
    NameConflict(String),

    /// Department would become its own parent
    #[error("cannot set parent to itself")]
    SelfParent,

    /// Department would be moved under one of its descendants
    #[error("cannot move department to its own descendant")]
    CycleDetected,

    /// Reassign delete requested on a department that still has children
    #[error("cannot reassign department with children; delete children first or use cascade mode")]
    ReassignWithChildren,

    /// Reassign delete targeting the department being deleted
    #[error("cannot reassign employees to the department being deleted")]
    ReassignToSelf,

    /// Store operation failed
    #[error("failed to {context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: sea_orm::DbErr,
    },

    /// Request deadline expired during a store call
    #[error("deadline exceeded while trying to {context}")]
    Timeout { context: &'static str },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Wrap a store failure with the operation that was attempted.
    pub fn store(context: &'static str, source: sea_orm::DbErr) -> Self {
        Self::Store { context, source }
    }

    /// Create a config error with message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName
            | Self::InvalidFullName
            | Self::InvalidPosition
            | Self::InvalidMode(_)
            | Self::InvalidDepth { .. }
            | Self::ReassignTargetRequired
            | Self::Config(_) => ErrorKind::Validation,
            Self::NotFound(_)
            | Self::ParentNotFound(_)
            | Self::TargetDepartmentNotFound(_)
            | Self::DepartmentNotFound(_) => ErrorKind::NotFound,
            Self::NameConflict(_)
            | Self::SelfParent
            | Self::CycleDetected
            | Self::ReassignWithChildren
            | Self::ReassignToSelf => ErrorKind::Conflict,
            Self::Store { .. } | Self::Timeout { .. } => ErrorKind::Infrastructure,
        }
    }
}
