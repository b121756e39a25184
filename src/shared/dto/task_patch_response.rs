use serde::{Deserialize, Serialize};

use crate::{data_access::document::Document, task_response::TaskResponse};

/// Either the full updated task, or (when reading it back failed) the
/// update set that was written plus a warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskPatchResponse {
    Updated {
        message: String,
        task: TaskResponse,
    },
    Degraded {
        message: String,
        modified: Document,
        warning: String,
    },
}
