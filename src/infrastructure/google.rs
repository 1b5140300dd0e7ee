//! Google Tasks REST client (blocking, ureq)
//!
//! Endpoints used, relative to `api_base_url`:
//! - `GET    users/@me/lists`
//! - `GET    lists/{list}/tasks`
//! - `POST   lists/{list}/tasks`
//! - `DELETE lists/{list}/tasks/{task}`

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::domain::{Task, TaskList};
use crate::infrastructure::traits::{Page, TaskService, Visibility};
use crate::infrastructure::{RemoteError, RemoteResult};

/// Listing response envelope shared by task lists and tasks.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl<T> From<ListResponse<T>> for Page<T> {
    fn from(r: ListResponse<T>) -> Self {
        Page {
            items: r.items,
            next_page_token: r.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

/// Build the shared HTTP agent.
pub fn build_agent(timeout_secs: u64) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("gtask/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Authenticated client for the Google Tasks API.
pub struct GoogleTasksClient {
    agent: ureq::Agent,
    base_url: Url,
    access_token: String,
}

impl GoogleTasksClient {
    /// Create a client for `base_url` using a bearer `access_token`.
    pub fn new(agent: ureq::Agent, base_url: &str, access_token: impl Into<String>) -> RemoteResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RemoteError::Transport(format!("invalid API base URL '{base_url}': {e}")))?;
        Ok(Self {
            agent,
            base_url,
            access_token: access_token.into(),
        })
    }

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Transport(format!("API base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: &str, url: &Url) -> ureq::Request {
        debug!("{} {}", method, url);
        self.agent
            .request_url(method, url)
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .set("Accept", "application/json")
    }

    fn list<T: DeserializeOwned>(
        &self,
        mut request: ureq::Request,
        max_results: u32,
        page_token: Option<&str>,
    ) -> RemoteResult<Page<T>> {
        request = request.query("maxResults", &max_results.to_string());
        if let Some(token) = page_token {
            request = request.query("pageToken", token);
        }
        let response: ListResponse<T> = read_json(request.call())?;
        Ok(response.into())
    }
}

impl TaskService for GoogleTasksClient {
    fn list_tasklists(
        &self,
        max_results: u32,
        page_token: Option<&str>,
    ) -> RemoteResult<Page<TaskList>> {
        let url = self.endpoint(&["users", "@me", "lists"])?;
        self.list(self.request("GET", &url), max_results, page_token)
    }

    fn list_tasks(
        &self,
        list_id: &str,
        visibility: Visibility,
        max_results: u32,
        page_token: Option<&str>,
    ) -> RemoteResult<Page<Task>> {
        let url = self.endpoint(&["lists", list_id, "tasks"])?;
        self.list(task_query(self.request("GET", &url), visibility), max_results, page_token)
    }

    fn insert_task(&self, list_id: &str, task: &Task) -> RemoteResult<Task> {
        let url = self.endpoint(&["lists", list_id, "tasks"])?;
        read_json(self.request("POST", &url).send_json(task))
    }

    fn delete_task(&self, list_id: &str, task_id: &str) -> RemoteResult<()> {
        let url = self.endpoint(&["lists", list_id, "tasks", task_id])?;
        self.request("DELETE", &url)
            .call()
            .map(|_| ())
            .map_err(remote_error)
    }
}

/// The service leaves hidden tasks out unless asked for them.
fn task_query(request: ureq::Request, visibility: Visibility) -> ureq::Request {
    match visibility {
        Visibility::Visible => request,
        Visibility::All => request
            .query("showCompleted", "true")
            .query("showHidden", "true"),
    }
}

/// Decode a JSON body or map the ureq error.
pub(crate) fn read_json<T: DeserializeOwned>(
    result: Result<ureq::Response, ureq::Error>,
) -> RemoteResult<T> {
    result
        .map_err(remote_error)?
        .into_json::<T>()
        .map_err(|e| RemoteError::Decode(e.to_string()))
}

pub(crate) fn remote_error(e: ureq::Error) -> RemoteError {
    match e {
        ureq::Error::Status(code, response) => RemoteError::Status {
            code,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(t) => RemoteError::Transport(t.to_string()),
    }
}
