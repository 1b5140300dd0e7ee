//! Task list service
//!
//! Resolves list titles to ids and reads lists and tasks. All reads go
//! through `Pages`, so results are complete regardless of page size.

use std::sync::Arc;

use tracing::debug;

use crate::application::{ApplicationResult, Pages, RemoteResultExt};
use crate::config::Settings;
use crate::domain::{DomainError, Task, TaskList};
use crate::infrastructure::traits::{TaskService, Visibility};
use crate::infrastructure::RemoteResult;

/// Read-only operations on task lists.
#[derive(Clone)]
pub struct TaskListService {
    tasks: Arc<dyn TaskService>,
    settings: Arc<Settings>,
}

impl TaskListService {
    /// Create a new task list service.
    pub fn new(tasks: Arc<dyn TaskService>, settings: Arc<Settings>) -> Self {
        Self { tasks, settings }
    }

    /// Lazy sequence over all task lists in service order. Each call starts over.
    pub fn tasklist_pages(&self) -> impl Iterator<Item = RemoteResult<TaskList>> + '_ {
        let page_size = self.settings.tasklists_page_size;
        Pages::new(move |token: Option<&str>| self.tasks.list_tasklists(page_size, token))
    }

    /// Lazy sequence over the tasks of a list in service order.
    pub fn task_pages<'a>(
        &'a self,
        list_id: &'a str,
        visibility: Visibility,
    ) -> impl Iterator<Item = RemoteResult<Task>> + 'a {
        let page_size = self.settings.tasks_page_size;
        Pages::new(move |token: Option<&str>| {
            self.tasks.list_tasks(list_id, visibility, page_size, token)
        })
    }

    /// All task lists, in service order.
    pub fn tasklists(&self) -> ApplicationResult<Vec<TaskList>> {
        self.tasklist_pages()
            .collect::<RemoteResult<Vec<_>>>()
            .with_operation("list task lists")
    }

    /// First list whose title equals `name` exactly (case-sensitive, untrimmed).
    ///
    /// Stops fetching pages once a match is found.
    pub fn find(&self, name: &str) -> ApplicationResult<Option<TaskList>> {
        for list in self.tasklist_pages() {
            let list = list.with_operation("list task lists")?;
            if list.title == name {
                return Ok(Some(list));
            }
        }
        Ok(None)
    }

    /// Resolve a list title to the service's list id.
    pub fn resolve(&self, name: &str) -> ApplicationResult<String> {
        match self.find(name)? {
            Some(list) => {
                debug!("resolve: '{}' -> {}", name, list.id);
                Ok(list.id)
            }
            None => Err(DomainError::ListNotFound {
                name: name.to_string(),
            }
            .into()),
        }
    }

    /// Tasks of a list as the service shows them, in service order.
    pub fn tasks_in(&self, list_id: &str) -> ApplicationResult<Vec<Task>> {
        self.tasks_with(list_id, Visibility::Visible)
    }

    /// Every task of a list including hidden and completed ones, in service order.
    pub fn every_task_in(&self, list_id: &str) -> ApplicationResult<Vec<Task>> {
        self.tasks_with(list_id, Visibility::All)
    }

    fn tasks_with(&self, list_id: &str, visibility: Visibility) -> ApplicationResult<Vec<Task>> {
        self.task_pages(list_id, visibility)
            .collect::<RemoteResult<Vec<_>>>()
            .with_operation(&format!("list tasks of list {list_id}"))
    }

    /// Resolve `name`, then list its tasks.
    pub fn tasks_in_named(&self, name: &str) -> ApplicationResult<Vec<Task>> {
        let id = self.resolve(name)?;
        self.tasks_in(&id)
    }

    /// Tasks of the configured default list.
    pub fn default_list_tasks(&self) -> ApplicationResult<Vec<Task>> {
        self.tasks_in_named(&self.settings.default_list_name)
    }

    /// Every list with its tasks, lists in service order.
    pub fn all_tasks(&self) -> ApplicationResult<Vec<(TaskList, Vec<Task>)>> {
        self.tasklists()?
            .into_iter()
            .map(|list| {
                let tasks = self.tasks_in(&list.id)?;
                Ok((list, tasks))
            })
            .collect()
    }
}
