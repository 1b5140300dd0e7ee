//! Service container for dependency injection
//!
//! Bootstraps authorization and wires the application services to the
//! remote task service.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::{MoveService, TaskListService};
use crate::config::Settings;
use crate::infrastructure::auth::{
    scope_granted, Authenticator, ClientSecret, GoogleTokenEndpoint, TASKS_SCOPE,
};
use crate::infrastructure::credentials::FileCredentialStore;
use crate::infrastructure::google::{build_agent, GoogleTasksClient};
use crate::infrastructure::traits::{StdinPrompt, TaskService};
use crate::infrastructure::{InfraError, InfraResult};

/// Container holding the wired application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Remote task service
    pub tasks: Arc<dyn TaskService>,

    /// Scopes granted to the access token; `None` if the server could not tell
    pub granted_scope: Option<String>,
}

impl ServiceContainer {
    /// Authorize against Google and create a container with the real client.
    ///
    /// Reads the client secret, loads/refreshes the persisted token or runs
    /// the interactive authorization, then builds the REST client.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let secret = ClientSecret::from_file(&settings.credentials_file)?;
        let agent = build_agent(settings.timeout_secs);
        let authenticator = Authenticator::new(
            secret,
            settings.scope.clone(),
            Arc::new(FileCredentialStore::new(settings.token_file.clone())),
            Arc::new(StdinPrompt),
            Arc::new(GoogleTokenEndpoint::new(agent.clone())),
        );
        let token = authenticator.authorize()?;
        debug!("authorized, granted scope: {:?}", token.scope);

        let client = GoogleTasksClient::new(agent, &settings.api_base_url, token.access_token)?;
        Ok(Self::with_deps(settings, Arc::new(client), token.scope))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        tasks: Arc<dyn TaskService>,
        granted_scope: Option<String>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            tasks,
            granted_scope,
        }
    }

    pub fn task_list_service(&self) -> TaskListService {
        TaskListService::new(self.tasks.clone(), self.settings.clone())
    }

    pub fn move_service(&self) -> MoveService {
        MoveService::new(self.tasks.clone(), self.task_list_service())
    }

    /// Fail unless the token may create and delete tasks.
    ///
    /// An unknown grant passes; the first insert then reports any refusal.
    pub fn ensure_write_access(&self) -> InfraResult<()> {
        if scope_granted(self.granted_scope.as_deref(), TASKS_SCOPE) {
            return Ok(());
        }
        Err(InfraError::InsufficientScope {
            granted: self.granted_scope.clone().unwrap_or_default(),
            required: TASKS_SCOPE.to_string(),
        })
    }
}
