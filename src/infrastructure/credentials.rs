//! File-backed credential store

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::infrastructure::auth::Token;
use crate::infrastructure::traits::CredentialStore;
use crate::infrastructure::{InfraError, InfraResult};

/// Stores the token as JSON in a single file, readable by the owner only.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentialStore {
    /// A missing or unparsable file yields `None`, which triggers a new authorization.
    fn load(&self) -> InfraResult<Option<Token>> {
        if !self.path.exists() {
            debug!("no token file at {}", self.path.display());
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| InfraError::io(format!("read token file {}", self.path.display()), e))?;
        match serde_json::from_str::<Token>(&content) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                warn!("ignoring unreadable token file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    fn save(&self, token: &Token) -> InfraResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    InfraError::io(format!("create directory {}", parent.display()), e)
                })?;
            }
        }

        let json = serde_json::to_string_pretty(token).map_err(|e| {
            InfraError::io(
                "serialize token",
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let context = || format!("cache oauth token in {}", self.path.display());
        let mut file = options
            .open(&self.path)
            .map_err(|e| InfraError::io(context(), e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| InfraError::io(context(), e))?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
