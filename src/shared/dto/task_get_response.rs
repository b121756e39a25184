use serde::{Deserialize, Serialize};

use crate::task_response::TaskResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskGetResponse {
    pub message: String,
    pub task: TaskResponse,
}
