//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the command grammar or lookup rules.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unrecognized command: '{input}'")]
    UnrecognizedCommand { input: String },

    #[error("malformed move command '{input}': {reason}")]
    MalformedMove { input: String, reason: String },

    #[error("no task list titled '{name}'")]
    ListNotFound { name: String },
}
