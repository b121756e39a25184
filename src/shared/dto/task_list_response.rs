use serde::{Deserialize, Serialize};

use crate::{pagination::PageInfo, task_response::TaskResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub message: String,
    /// Seconds spent in the store for this page.
    pub duration: f64,
    pub tasks: Vec<TaskResponse>,
    pub pagination: PageInfo,
}
