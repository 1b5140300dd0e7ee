//! I/O boundary traits for testability
//!
//! These traits abstract the remote task service, token persistence and the
//! interactive authorization prompt, allowing services to be tested with
//! in-memory implementations.

use std::io::{self, BufRead, Write};

use crate::domain::{Task, TaskList};
use crate::infrastructure::auth::{ClientSecret, Token, TokenResponse};
use crate::infrastructure::{InfraResult, RemoteResult};

/// One page of a listing call.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token for the following page, `None` on the last page
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    /// A page with no successor.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }
}

/// Which tasks a task listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// What the service shows by default: hidden tasks (completed and then
    /// cleared, e.g. in the web or mobile app) are left out
    #[default]
    Visible,
    /// Every task that is not deleted, including hidden and completed ones
    All,
}

/// Remote task service abstraction.
///
/// Every call is blocking and may fail with a transport, status or decode error.
pub trait TaskService: Send + Sync {
    /// List the user's task lists, at most `max_results` per page.
    fn list_tasklists(
        &self,
        max_results: u32,
        page_token: Option<&str>,
    ) -> RemoteResult<Page<TaskList>>;

    /// List the tasks of one list, at most `max_results` per page.
    fn list_tasks(
        &self,
        list_id: &str,
        visibility: Visibility,
        max_results: u32,
        page_token: Option<&str>,
    ) -> RemoteResult<Page<Task>>;

    /// Create a task in a list. The service assigns the id of the returned task.
    fn insert_task(&self, list_id: &str, task: &Task) -> RemoteResult<Task>;

    /// Delete a task from a list.
    fn delete_task(&self, list_id: &str, task_id: &str) -> RemoteResult<()>;
}

/// Persistence for the OAuth token.
pub trait CredentialStore: Send + Sync {
    /// Load the persisted token. `None` if nothing usable is stored.
    fn load(&self) -> InfraResult<Option<Token>>;

    /// Persist a token, replacing any previous one.
    fn save(&self, token: &Token) -> InfraResult<()>;

    /// Human readable location, shown when a token is saved.
    fn location(&self) -> String;
}

/// Calls against the OAuth server.
pub trait TokenEndpoint: Send + Sync {
    /// Exchange an authorization code for a token.
    fn exchange_code(&self, secret: &ClientSecret, code: &str) -> InfraResult<TokenResponse>;

    /// Obtain a fresh access token.
    fn refresh(&self, secret: &ClientSecret, refresh_token: &str) -> InfraResult<TokenResponse>;

    /// Scopes granted to `access_token`, space separated.
    fn granted_scope(&self, access_token: &str) -> InfraResult<Option<String>>;
}

/// Interactive step of the authorization-code flow.
pub trait CodePrompt: Send + Sync {
    /// Show `auth_url` to the user and return the code they paste back.
    fn authorization_code(&self, auth_url: &str) -> io::Result<String>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Prompt on stdout, read the code from stdin.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl CodePrompt for StdinPrompt {
    fn authorization_code(&self, auth_url: &str) -> io::Result<String> {
        println!(
            "Go to the following link in your browser then type the authorization code:\n{}",
            auth_url
        );
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        let code = line.trim();
        if code.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no authorization code entered",
            ));
        }
        Ok(code.to_string())
    }
}
