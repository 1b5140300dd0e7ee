//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Config file: `$XDG_CONFIG_HOME/gtask/gtask.toml`, or the file given with `--config`
//! 3. Environment variables: `GTASK_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::infrastructure::auth::TASKS_SCOPE;

/// Title of the list the service creates for every account.
pub const DEFAULT_LIST_NAME: &str = "Default List";

const DEFAULT_API_BASE_URL: &str = "https://tasks.googleapis.com/tasks/v1";
const DEFAULT_TASKLISTS_PAGE_SIZE: u32 = 10;
const DEFAULT_TASKS_PAGE_SIZE: u32 = 100;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Raw settings for intermediate parsing (`None` = not specified, keep base).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub credentials_file: Option<PathBuf>,
    pub token_file: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub scope: Option<String>,
    pub default_list_name: Option<String>,
    pub tasklists_page_size: Option<u32>,
    pub tasks_page_size: Option<u32>,
    pub timeout_secs: Option<u64>,
}

/// Unified configuration for gtask.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// OAuth client secret downloaded from the Google Cloud console
    pub credentials_file: PathBuf,
    /// Persisted access/refresh token
    pub token_file: PathBuf,
    /// Tasks API root
    pub api_base_url: String,
    /// OAuth scope requested on authorization
    pub scope: String,
    /// List used by `list tasks`
    pub default_list_name: String,
    /// maxResults per task list page
    pub tasklists_page_size: u32,
    /// maxResults per task page
    pub tasks_page_size: u32,
    /// HTTP timeout per request
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let dir = global_config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            credentials_file: dir.join("credentials.json"),
            token_file: dir.join("token.json"),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            scope: TASKS_SCOPE.to_string(),
            default_list_name: DEFAULT_LIST_NAME.to_string(),
            tasklists_page_size: DEFAULT_TASKLISTS_PAGE_SIZE,
            tasks_page_size: DEFAULT_TASKS_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Get the XDG config directory for gtask.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "gtask").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("gtask.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the path unchanged.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    /// Expand shell variables and tilde in path fields.
    fn expand_paths(&mut self) {
        self.credentials_file = expand_path(&self.credentials_file);
        self.token_file = expand_path(&self.token_file);
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            credentials_file: overlay
                .credentials_file
                .clone()
                .unwrap_or_else(|| self.credentials_file.clone()),
            token_file: overlay
                .token_file
                .clone()
                .unwrap_or_else(|| self.token_file.clone()),
            api_base_url: overlay
                .api_base_url
                .clone()
                .unwrap_or_else(|| self.api_base_url.clone()),
            scope: overlay.scope.clone().unwrap_or_else(|| self.scope.clone()),
            default_list_name: overlay
                .default_list_name
                .clone()
                .unwrap_or_else(|| self.default_list_name.clone()),
            tasklists_page_size: overlay
                .tasklists_page_size
                .unwrap_or(self.tasklists_page_size),
            tasks_page_size: overlay.tasks_page_size.unwrap_or(self.tasks_page_size),
            timeout_secs: overlay.timeout_secs.unwrap_or(self.timeout_secs),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Explicit config file; it must exist. Without it the
    ///   global file is used if present.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Config file
        match config_file {
            Some(path) => {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
            None => {
                if let Some(global_path) = global_config_path() {
                    if global_path.exists() {
                        let raw = load_raw_settings(&global_path)?;
                        current = current.merge_with(&raw);
                    }
                }
            }
        }

        // 3. Environment variables
        current = current.apply_env_overrides(Environment::with_prefix("GTASK"))?;

        current.expand_paths();
        current.validate()?;
        Ok(current)
    }

    /// Apply `GTASK_*` variables from `env` as explicit overrides.
    pub fn apply_env_overrides(mut self, env: Environment) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Some(val) = env_value::<String>(&config, "credentials_file")? {
            self.credentials_file = PathBuf::from(val);
        }
        if let Some(val) = env_value::<String>(&config, "token_file")? {
            self.token_file = PathBuf::from(val);
        }
        if let Some(val) = env_value(&config, "api_base_url")? {
            self.api_base_url = val;
        }
        if let Some(val) = env_value(&config, "scope")? {
            self.scope = val;
        }
        if let Some(val) = env_value(&config, "default_list_name")? {
            self.default_list_name = val;
        }
        if let Some(val) = env_value(&config, "tasklists_page_size")? {
            self.tasklists_page_size = val;
        }
        if let Some(val) = env_value(&config, "tasks_page_size")? {
            self.tasks_page_size = val;
        }
        if let Some(val) = env_value(&config, "timeout_secs")? {
            self.timeout_secs = val;
        }

        Ok(self)
    }

    /// Reject values no request could be built from.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.tasklists_page_size == 0 || self.tasks_page_size == 0 {
            return Err(ApplicationError::Config {
                message: "page sizes must be greater than zero".to_string(),
            });
        }
        if self.default_list_name.is_empty() {
            return Err(ApplicationError::Config {
                message: "default_list_name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# gtask configuration
#
# Locations (by precedence, lowest to highest):
#   File: ~/.config/gtask/gtask.toml   (or --config <file>)
#   Env:  GTASK_* environment variables (e.g. GTASK_TOKEN_FILE)

# OAuth client secret from the Google Cloud console
# credentials_file = "~/.config/gtask/credentials.json"

# Persisted token (created on first authorization)
# token_file = "~/.config/gtask/token.json"

# Tasks API root
# api_base_url = "https://tasks.googleapis.com/tasks/v1"

# Requested scope; moving tasks needs write access
# scope = "https://www.googleapis.com/auth/tasks"

# List shown by `gtask list tasks`
# default_list_name = "Default List"

# Results per request (all pages are always fetched)
# tasklists_page_size = 10
# tasks_page_size = 100

# HTTP timeout in seconds
# timeout_secs = 30
"#
        .to_string()
    }
}

/// Missing keys are `None`, malformed values are errors.
fn env_value<T: DeserializeOwned>(config: &Config, key: &str) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("GTASK").source(Some(map))
    }

    #[test]
    fn given_defaults_then_match_service_conventions() {
        let settings = Settings::default();
        assert_eq!(settings.default_list_name, "Default List");
        assert_eq!(settings.tasklists_page_size, 10);
        assert_eq!(settings.tasks_page_size, 100);
        assert_eq!(settings.scope, TASKS_SCOPE);
        assert!(settings.token_file.ends_with("token.json"));
        assert!(settings.credentials_file.ends_with("credentials.json"));
    }

    #[test]
    fn given_env_overrides_when_applied_then_replace_values() {
        let settings = Settings::default()
            .apply_env_overrides(env(&[
                ("GTASK_DEFAULT_LIST_NAME", "Inbox"),
                ("GTASK_TASKS_PAGE_SIZE", "25"),
                ("GTASK_TOKEN_FILE", "/tmp/gtask-token.json"),
            ]))
            .unwrap();

        assert_eq!(settings.default_list_name, "Inbox");
        assert_eq!(settings.tasks_page_size, 25);
        assert_eq!(settings.token_file, PathBuf::from("/tmp/gtask-token.json"));
        assert_eq!(settings.tasklists_page_size, 10);
    }

    #[test]
    fn given_non_numeric_page_size_when_applied_then_config_error() {
        let result =
            Settings::default().apply_env_overrides(env(&[("GTASK_TASKS_PAGE_SIZE", "lots")]));
        assert!(matches!(result, Err(ApplicationError::Config { .. })));
    }

    #[test]
    fn given_zero_page_size_when_validating_then_rejected() {
        let settings = Settings {
            tasks_page_size: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn given_tilde_in_token_file_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            token_file: PathBuf::from("~/.gtask/token.json"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        assert!(settings.token_file.starts_with(&home));
    }

    #[test]
    fn given_partial_overlay_when_merging_then_unspecified_fields_keep_base() {
        let base = Settings::default();
        let overlay = RawSettings {
            default_list_name: Some("Work".into()),
            timeout_secs: Some(5),
            ..RawSettings::default()
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.default_list_name, "Work");
        assert_eq!(merged.timeout_secs, 5);
        assert_eq!(merged.api_base_url, base.api_base_url);
        assert_eq!(merged.tasks_page_size, base.tasks_page_size);
    }

    #[test]
    fn given_settings_when_serialized_then_template_keys_match() {
        let toml = Settings::default().to_toml().unwrap();
        for key in [
            "credentials_file",
            "token_file",
            "api_base_url",
            "scope",
            "default_list_name",
            "tasklists_page_size",
            "tasks_page_size",
            "timeout_secs",
        ] {
            assert!(toml.contains(key), "missing {key}");
            assert!(Settings::template().contains(key), "template missing {key}");
        }
    }
}
