//! Infrastructure-level errors (wraps application errors)

use std::path::PathBuf;

use thiserror::Error;

use crate::application::ApplicationError;

/// Failure of a single call against the remote task service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("invalid response: {0}")]
    Decode(String),
}

/// Result type for remote task service calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Infrastructure errors wrap application errors and add I/O-level concerns.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to read client secret file {}: {message}", path.display())]
    ClientSecret { path: PathBuf, message: String },

    #[error("authorization failed: {message}")]
    Auth { message: String },

    #[error(
        "granted scope '{granted}' does not include '{required}'; \
         delete the token file and authorize again"
    )]
    InsufficientScope { granted: String, required: String },

    #[error("{0}")]
    Remote(#[from] RemoteError),
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an authorization error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
