//! Move service: relocates every task of one list into another
//!
//! The remote API has no move primitive, so each task is inserted into the
//! destination and then deleted from the source, one task at a time, in
//! listing order. The first failure aborts the run:
//!
//! - tasks before the failing one are moved (new ids in the destination)
//! - the failing task is untouched if its insert failed, or present in both
//!   lists if its delete failed
//! - tasks after it stay in the source
//!
//! Nothing is retried or rolled back.
//!
//! Every task is moved, including completed tasks the service hides from
//! default listings. Copies are inserted as top-level tasks: the destination
//! does not keep the subtask hierarchy of the source, and a moved hidden task
//! is visible again (as completed) in the destination.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::services::TaskListService;
use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::traits::TaskService;
use crate::infrastructure::RemoteError;

/// Sub-step of moving a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStep {
    /// Creating the copy in the destination list
    Insert,
    /// Removing the original from the source list
    Delete,
}

impl fmt::Display for MoveStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveStep::Insert => write!(f, "insert"),
            MoveStep::Delete => write!(f, "delete"),
        }
    }
}

/// A task that was fully moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedTask {
    pub title: String,
    /// Id in the source list (no longer exists)
    pub old_id: String,
    /// Id assigned by the service in the destination list
    pub new_id: String,
}

/// Outcome of a completed move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveReport {
    pub moved: Vec<MovedTask>,
}

impl MoveReport {
    pub fn count(&self) -> usize {
        self.moved.len()
    }
}

/// Service for moving tasks between lists.
pub struct MoveService {
    tasks: Arc<dyn TaskService>,
    lists: TaskListService,
}

impl MoveService {
    /// Create a new move service.
    pub fn new(tasks: Arc<dyn TaskService>, lists: TaskListService) -> Self {
        Self { tasks, lists }
    }

    /// Resolve both titles, then move. Resolution happens before any mutation.
    pub fn move_named(&self, from_name: &str, to_name: &str) -> ApplicationResult<MoveReport> {
        let from_id = self.lists.resolve(from_name)?;
        let to_id = self.lists.resolve(to_name)?;
        if from_id == to_id {
            return Err(ApplicationError::SameList {
                name: from_name.to_string(),
            });
        }
        self.move_tasks(&from_id, &to_id)
    }

    /// Move every task of `from_list_id` into `to_list_id`.
    pub fn move_tasks(&self, from_list_id: &str, to_list_id: &str) -> ApplicationResult<MoveReport> {
        if from_list_id == to_list_id {
            return Err(ApplicationError::SameList {
                name: from_list_id.to_string(),
            });
        }

        // The complete listing is taken before the first delete so that
        // deletions cannot shift the page cursor. Hidden tasks are included.
        let tasks = self.lists.every_task_in(from_list_id)?;
        debug!(
            "move_tasks: {} task(s) from {} to {}",
            tasks.len(),
            from_list_id,
            to_list_id
        );

        let mut report = MoveReport::default();
        for task in tasks {
            let interrupted = |step: MoveStep, source: RemoteError| ApplicationError::MoveInterrupted {
                moved: report.count(),
                task_title: task.title.clone(),
                step,
                source,
            };

            let Some(old_id) = task.id.clone() else {
                return Err(interrupted(
                    MoveStep::Insert,
                    RemoteError::Decode("listed task has no id".to_string()),
                ));
            };

            let inserted = self
                .tasks
                .insert_task(to_list_id, &task.to_insert_payload())
                .map_err(|e| interrupted(MoveStep::Insert, e))?;

            if let Err(e) = self.tasks.delete_task(from_list_id, &old_id) {
                warn!(
                    "'{}' was copied to {} but not deleted from {}; it now exists in both lists",
                    task.title, to_list_id, from_list_id
                );
                return Err(interrupted(MoveStep::Delete, e));
            }

            let new_id = inserted.id.unwrap_or_default();
            info!("moved '{}' ({} -> {})", task.title, old_id, new_id);
            report.moved.push(MovedTask {
                title: task.title,
                old_id,
                new_id,
            });
        }

        Ok(report)
    }
}
