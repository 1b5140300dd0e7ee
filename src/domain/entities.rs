//! Domain entities: task lists and tasks as the remote service reports them

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields the service assigns itself and rejects or ignores on insert.
const SERVER_ASSIGNED_FIELDS: &[&str] = &[
    "etag",
    "selfLink",
    "position",
    "parent",
    "hidden",
    "webViewLink",
    "links",
];

/// A named container of tasks.
///
/// The title is the user-facing key, the id is the service key. Titles are not
/// guaranteed unique by the service; lookups take the first match in listing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Remaining service fields (kind, etag, updated, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskList {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            extra: Map::new(),
        }
    }
}

/// A single task, scoped to its owning list.
///
/// Everything besides `id` and `title` is carried as opaque payload in `extra`
/// so a move copies status, notes, due date etc. verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// New task without an id (the service assigns one on insert).
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            extra: Map::new(),
        }
    }

    /// Builder-style setter for an opaque service field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Read an opaque string field, e.g. `status` or `due`.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    /// Copy of this task suitable for inserting into another list.
    ///
    /// Drops the id and the server-assigned fields; all other fields are kept verbatim.
    /// Without `parent` the copy is a top-level task, so subtasks are flattened.
    pub fn to_insert_payload(&self) -> Task {
        let mut extra = self.extra.clone();
        for key in SERVER_ASSIGNED_FIELDS {
            extra.remove(*key);
        }
        Task {
            id: None,
            title: self.title.clone(),
            extra,
        }
    }
}
