//! Test support: logging setup and an in-memory task service

use std::env;
use std::sync::{Mutex, MutexGuard, Once, PoisonError};

use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{Task, TaskList};
use crate::infrastructure::auth::{ClientSecret, TokenResponse};
use crate::infrastructure::traits::{Page, TaskService, TokenEndpoint, Visibility};
use crate::infrastructure::{InfraError, InfraResult, RemoteError, RemoteResult};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    // Create a filter for noisy modules
    let noisy_modules = ["ureq", "rustls"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = env::var("RUST_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// A call received by [`InMemoryTaskService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListTasklists { page_token: Option<String> },
    ListTasks {
        list_id: String,
        visibility: Visibility,
        page_token: Option<String>,
    },
    Insert { list_id: String, title: String },
    Delete { list_id: String, task_id: String },
}

#[derive(Default)]
struct State {
    lists: Vec<(TaskList, Vec<Task>)>,
    next_id: u64,
    calls: Vec<Call>,
    fail_insert_of: Option<String>,
    fail_delete_of: Option<String>,
}

impl State {
    fn list_mut(&mut self, list_id: &str) -> RemoteResult<&mut Vec<Task>> {
        self.lists
            .iter_mut()
            .find(|(list, _)| list.id == list_id)
            .map(|(_, tasks)| tasks)
            .ok_or_else(|| not_found(list_id))
    }
}

fn not_found(what: &str) -> RemoteError {
    RemoteError::Status {
        code: 404,
        body: format!("not found: {what}"),
    }
}

/// Serve `items` starting at the offset encoded in `token`.
fn page_of<T: Clone>(items: &[T], size: u32, token: Option<&str>) -> RemoteResult<Page<T>> {
    let start = match token {
        Some(t) => t
            .parse::<usize>()
            .map_err(|_| RemoteError::Status {
                code: 400,
                body: format!("invalid page token: {t}"),
            })?,
        None => 0,
    };
    let start = start.min(items.len());
    let end = (start + size as usize).min(items.len());
    Ok(Page {
        items: items[start..end].to_vec(),
        next_page_token: (end < items.len()).then(|| end.to_string()),
    })
}

/// In-memory stand-in for the remote task service.
///
/// Assigns fresh ids on insert, pages results with offset tokens, records
/// every call, and can be told to fail the insert or delete of a task by title.
#[derive(Default)]
pub struct InMemoryTaskService {
    state: Mutex<State>,
}

impl InMemoryTaskService {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a list with tasks titled `titles`; task ids are `<id>-<n>`.
    pub fn with_list(self, id: &str, title: &str, titles: &[&str]) -> Self {
        {
            let mut state = self.state();
            let tasks = titles
                .iter()
                .enumerate()
                .map(|(n, t)| {
                    let mut task = Task::new(*t).with_field("status", "needsAction");
                    task.id = Some(format!("{id}-{}", n + 1));
                    task
                })
                .collect();
            state.lists.push((TaskList::new(id, title), tasks));
        }
        self
    }

    /// Append a completed task that the service hides from default listings.
    pub fn with_hidden_task(self, list_id: &str, title: &str) -> Self {
        {
            let mut state = self.state();
            if let Ok(tasks) = state.list_mut(list_id) {
                let n = tasks.len() + 1;
                let mut task = Task::new(title)
                    .with_field("status", "completed")
                    .with_field("hidden", true);
                task.id = Some(format!("{list_id}-{n}"));
                tasks.push(task);
            }
        }
        self
    }

    /// Make the insert of the task titled `title` fail with HTTP 500.
    pub fn fail_insert_of(&self, title: &str) {
        self.state().fail_insert_of = Some(title.to_string());
    }

    /// Make the delete of the task titled `title` fail with HTTP 500.
    pub fn fail_delete_of(&self, title: &str) {
        self.state().fail_delete_of = Some(title.to_string());
    }

    /// Titles of the tasks currently in a list, hidden ones included, in order.
    pub fn titles_in(&self, list_id: &str) -> Vec<String> {
        self.tasks_of(list_id)
            .into_iter()
            .map(|t| t.title)
            .collect()
    }

    /// Tasks currently in a list, in order.
    pub fn tasks_of(&self, list_id: &str) -> Vec<Task> {
        self.state()
            .lists
            .iter()
            .find(|(list, _)| list.id == list_id)
            .map(|(_, tasks)| tasks.clone())
            .unwrap_or_default()
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Number of insert and delete calls received.
    pub fn mutation_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Insert { .. } | Call::Delete { .. }))
            .count()
    }
}

impl TaskService for InMemoryTaskService {
    fn list_tasklists(
        &self,
        max_results: u32,
        page_token: Option<&str>,
    ) -> RemoteResult<Page<TaskList>> {
        let mut state = self.state();
        state.calls.push(Call::ListTasklists {
            page_token: page_token.map(String::from),
        });
        let lists: Vec<TaskList> = state.lists.iter().map(|(l, _)| l.clone()).collect();
        page_of(&lists, max_results, page_token)
    }

    fn list_tasks(
        &self,
        list_id: &str,
        visibility: Visibility,
        max_results: u32,
        page_token: Option<&str>,
    ) -> RemoteResult<Page<Task>> {
        let mut state = self.state();
        state.calls.push(Call::ListTasks {
            list_id: list_id.to_string(),
            visibility,
            page_token: page_token.map(String::from),
        });
        let tasks: Vec<Task> = state
            .list_mut(list_id)?
            .iter()
            .filter(|t| {
                visibility == Visibility::All
                    || t.extra.get("hidden").and_then(|v| v.as_bool()) != Some(true)
            })
            .cloned()
            .collect();
        page_of(&tasks, max_results, page_token)
    }

    fn insert_task(&self, list_id: &str, task: &Task) -> RemoteResult<Task> {
        let mut state = self.state();
        state.calls.push(Call::Insert {
            list_id: list_id.to_string(),
            title: task.title.clone(),
        });
        if state.fail_insert_of.as_deref() == Some(task.title.as_str()) {
            return Err(RemoteError::Status {
                code: 500,
                body: "insert failed".to_string(),
            });
        }
        if task.id.is_some() {
            return Err(RemoteError::Status {
                code: 400,
                body: "id must not be set on insert".to_string(),
            });
        }

        state.next_id += 1;
        let mut created = task.clone();
        created.id = Some(format!("new-{}", state.next_id));
        state.list_mut(list_id)?.push(created.clone());
        Ok(created)
    }

    fn delete_task(&self, list_id: &str, task_id: &str) -> RemoteResult<()> {
        let mut state = self.state();
        state.calls.push(Call::Delete {
            list_id: list_id.to_string(),
            task_id: task_id.to_string(),
        });
        let fail_title = state.fail_delete_of.clone();
        let tasks = state.list_mut(list_id)?;
        let pos = tasks
            .iter()
            .position(|t| t.id.as_deref() == Some(task_id))
            .ok_or_else(|| not_found(task_id))?;
        if fail_title.as_deref() == Some(tasks[pos].title.as_str()) {
            return Err(RemoteError::Status {
                code: 500,
                body: "delete failed".to_string(),
            });
        }
        tasks.remove(pos);
        Ok(())
    }
}

/// Scripted OAuth server.
///
/// Every call fails unless an answer was configured. Calls are recorded by
/// name (`"exchange"`, `"refresh"`, `"tokeninfo"`).
#[derive(Default)]
pub struct ScriptedTokenEndpoint {
    token_info: Option<Option<String>>,
    refresh: Option<Option<String>>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedTokenEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer token info lookups with `scope`.
    pub fn with_token_info(mut self, scope: Option<&str>) -> Self {
        self.token_info = Some(scope.map(String::from));
        self
    }

    /// Answer refreshes with a new access token granting `scope`.
    pub fn with_refresh(mut self, scope: Option<&str>) -> Self {
        self.refresh = Some(scope.map(String::from));
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: &'static str) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl TokenEndpoint for ScriptedTokenEndpoint {
    fn exchange_code(&self, _secret: &ClientSecret, _code: &str) -> InfraResult<TokenResponse> {
        self.record("exchange");
        Err(InfraError::auth("exchange not scripted"))
    }

    fn refresh(&self, _secret: &ClientSecret, _refresh_token: &str) -> InfraResult<TokenResponse> {
        self.record("refresh");
        let scope = self
            .refresh
            .clone()
            .ok_or_else(|| InfraError::auth("refresh not scripted"))?;
        Ok(TokenResponse {
            access_token: "refreshed-access".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: Some(3600),
            refresh_token: None,
            scope,
        })
    }

    fn granted_scope(&self, _access_token: &str) -> InfraResult<Option<String>> {
        self.record("tokeninfo");
        self.token_info
            .clone()
            .ok_or_else(|| InfraError::auth("token info not scripted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
    }

    #[test]
    fn given_page_size_smaller_than_list_when_listing_then_returns_next_token() {
        let service = InMemoryTaskService::new().with_list("L1", "One", &["a", "b", "c"]);

        let first = service.list_tasks("L1", Visibility::Visible, 2, None).unwrap();
        let second = service
            .list_tasks("L1", Visibility::Visible, 2, first.next_page_token.as_deref())
            .unwrap();

        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next_page_token.as_deref(), Some("2"));
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.next_page_token, None);
    }

    #[test]
    fn given_hidden_task_when_listing_then_only_included_on_request() {
        let service = InMemoryTaskService::new()
            .with_list("L1", "One", &["a"])
            .with_hidden_task("L1", "done");

        let visible = service.list_tasks("L1", Visibility::Visible, 10, None).unwrap();
        let all = service.list_tasks("L1", Visibility::All, 10, None).unwrap();

        assert_eq!(visible.items.len(), 1);
        assert_eq!(all.items.len(), 2);
        assert_eq!(all.items[1].id.as_deref(), Some("L1-2"));
    }
}
