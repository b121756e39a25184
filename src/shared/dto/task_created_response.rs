use serde::{Deserialize, Serialize};

use crate::{task::TaskId, task_response::TaskResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreatedResponse {
    pub message: String,
    pub task: TaskResponse,
    pub id: TaskId,
}
