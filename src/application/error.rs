//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::application::services::MoveStep;
use crate::domain::DomainError;
use crate::infrastructure::RemoteError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("unable to {operation}: {source}")]
    Remote {
        operation: String,
        #[source]
        source: RemoteError,
    },

    /// A move stopped part way. The first `moved` tasks were moved, the rest
    /// (including `task_title`) are still in the source list.
    #[error(
        "move interrupted after {moved} task(s): {step} of '{task_title}' failed: {source}"
    )]
    MoveInterrupted {
        moved: usize,
        task_title: String,
        step: MoveStep,
        #[source]
        source: RemoteError,
    },

    #[error("source and destination are the same list: '{name}'")]
    SameList { name: String },

    #[error("config error: {message}")]
    Config { message: String },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
