use serde::{Deserialize, Serialize};

use crate::{task::{TaskId, TaskMetadata}, task_priority::TaskPriority};

/// A task as the API shows it: identity under `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub image: Vec<String>,
    pub priority: TaskPriority,
    pub tags: Vec<String>,
    pub completed: bool,
    pub metadata: TaskMetadata,
}
