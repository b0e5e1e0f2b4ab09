use thiserror::Error;

/// Exit codes used by the `todust` binary.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Rejection reasons for task text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a task")]
    EmptyText,

    #[error("Task text must be {max} characters or less")]
    TooLong { len: usize, max: usize },
}

/// Main error type for todust operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Task {0} not found")]
    TaskNotFound(String),

    #[error("Id prefix '{0}' matches more than one task")]
    AmbiguousId(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to write '{key}': {reason}")]
    StorageWrite { key: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_)
            | Error::TaskNotFound(_)
            | Error::AmbiguousId(_)
            | Error::InvalidArgument(_) => exit_codes::USER_ERROR,

            Error::StorageWrite { .. } | Error::Io(_) | Error::Json(_) => {
                exit_codes::OPERATION_FAILED
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
