use serde::{Deserialize, Serialize};

use crate::task::TaskId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskToggleResponse {
    pub message: String,
    pub task_id: TaskId,
    pub completed: bool,
}
