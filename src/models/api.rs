use serde::{Deserialize, Serialize};

use super::task::{NewTask, TaskUpdate};

/// POST/PUT /tasks body. Missing or null fields default; unknown fields
/// (`id`, timestamps) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl TaskPayload {
    pub fn into_new_task(self) -> NewTask {
        NewTask {
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
        }
    }

    /// The path id always wins over anything the body carried.
    pub fn into_update(self, id: i64) -> TaskUpdate {
        TaskUpdate {
            id,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            completed: self.completed.unwrap_or(false),
        }
    }
}

/// GET /tasks query string. Decoded from raw pairs so a repeated key keeps
/// its first value instead of failing.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListTasksQuery {
    pub completed: Option<String>,
}

impl From<Vec<(String, String)>> for ListTasksQuery {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self {
            completed: pairs
                .into_iter()
                .find(|(key, _)| key == "completed")
                .map(|(_, value)| value),
        }
    }
}

/// Body of every JSON error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
