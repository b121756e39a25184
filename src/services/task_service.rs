//! Task operations over a document collection.
//!
//! Everything between the HTTP layer and the store lives here: validation,
//! identity parsing, timestamps, pagination and the patch outcome. Handlers
//! only translate the results into response bodies.

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    api_error::ApiError,
    clock::{timestamp_value, Clock},
    create_task_request::CreateTaskRequest,
    data_access::{
        collection::{Deadline, DocumentCollection},
        document::{Document, Filter, FindOptions, ReturnDocument, Sort},
    },
    pagination::{PageInfo, PageRequest},
    settings::Timeouts,
    task::{Task, TaskId, COMPLETED_PATH, CREATED_AT_PATH, UPDATED_AT_PATH},
    task_patch::{PatchOutcome, TaskPatch},
};

pub const REFETCH_WARNING: &str = "Task updated but failed to retrieve updated version";

/// One page of tasks, newest first.
#[derive(Debug, Clone)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub info: PageInfo,
    /// Seconds spent counting and fetching.
    pub duration: f64,
}

pub struct TaskService {
    collection: Arc<dyn DocumentCollection>,
    clock: Clock,
    timeouts: Timeouts,
}

impl TaskService {
    pub fn new(collection: Arc<dyn DocumentCollection>, timeouts: Timeouts) -> Self {
        TaskService { collection, clock: Clock::new(), timeouts }
    }

    pub fn parse_id(raw: &str) -> Result<TaskId, ApiError> {
        TaskId::parse(raw).map_err(|_| ApiError::InvalidIdentifier(raw.to_string()))
    }

    fn deadline(&self) -> Deadline {
        Deadline::after(self.timeouts.operation)
    }

    fn not_found(id: impl std::fmt::Display) -> ApiError {
        ApiError::NotFound(format!("No task with ID '{id}'"))
    }

    fn decode(doc: Document) -> Result<Task, ApiError> {
        Task::from_document(doc).map_err(|e| ApiError::persistence("Failed to decode task", e))
    }

    // ── Commands ───────────────────────────────────────────────

    pub async fn create(&self, request: CreateTaskRequest) -> Result<Task, ApiError> {
        let fields = request.validate().map_err(ApiError::Validation)?;
        let task = Task::new(TaskId::generate(), fields, self.clock.now());
        let doc = task
            .to_document()
            .map_err(|e| ApiError::persistence("Failed to encode task", e))?;

        self.collection
            .insert_one(Deadline::after(self.timeouts.insert), doc)
            .await
            .map_err(|e| ApiError::persistence("Failed to create task", e))?;

        tracing::debug!(task_id = %task.id, "task created");
        Ok(task)
    }

    /// Apply a sparse update. A write that went through is never reported as
    /// a failure: if the read-back fails the caller gets the submitted set.
    pub async fn patch(&self, id: TaskId, body: Value) -> Result<PatchOutcome, ApiError> {
        let Value::Object(raw) = body else {
            return Err(ApiError::MalformedInput("Request body must be a JSON object".into()));
        };
        let patch = TaskPatch::parse(raw)?;
        let set = patch.to_update(self.clock.now());
        let filter = Filter::by_id(id.to_string());

        let result = self
            .collection
            .update_one(self.deadline(), filter.clone(), set.clone())
            .await
            .map_err(|e| ApiError::persistence("Failed to update task", e))?;
        if result.matched_count == 0 {
            return Err(Self::not_found(id));
        }
        tracing::debug!(task_id = %id, fields = patch.field_count(), "task patched");

        let refetched = match self.collection.find_one(self.deadline(), filter).await {
            Ok(Some(doc)) => Task::from_document(doc).map_err(|e| e.to_string()),
            Ok(None) => Err("task vanished after update".to_string()),
            Err(e) => Err(e.to_string()),
        };
        match refetched {
            Ok(task) => Ok(PatchOutcome::FullSuccess(task)),
            Err(reason) => {
                tracing::warn!(task_id = %id, %reason, "patched task could not be read back");
                Ok(PatchOutcome::PartialSuccess { submitted: set, warning: REFETCH_WARNING.into() })
            }
        }
    }

    /// Flip `completed`. Returns the task as it is after the write.
    pub async fn toggle_complete(&self, id: TaskId) -> Result<Task, ApiError> {
        let filter = Filter::by_id(id.to_string());
        let current = self
            .collection
            .find_one(self.deadline(), filter.clone())
            .await
            .map_err(|e| ApiError::persistence("Failed to retrieve task", e))?
            .ok_or_else(|| Self::not_found(id))?;
        let completed = Self::decode(current)?.completed;

        let mut set = Document::new();
        set.insert(COMPLETED_PATH.to_string(), Value::Bool(!completed));
        set.insert(UPDATED_AT_PATH.to_string(), timestamp_value(self.clock.now()));

        let updated = self
            .collection
            .find_one_and_update(self.deadline(), filter, set, ReturnDocument::After)
            .await
            .map_err(|e| ApiError::persistence("Failed to update task", e))?
            .ok_or_else(|| Self::not_found(id))?;

        let task = Self::decode(updated)?;
        tracing::debug!(task_id = %id, completed = task.completed, "task toggled");
        Ok(task)
    }

    /// Remove a task. Deleting an id that does not exist still succeeds.
    pub async fn delete(&self, raw_id: &str) -> Result<(), ApiError> {
        if raw_id.is_empty() {
            return Err(ApiError::NotFound("Task ID is required".into()));
        }
        let id = Self::parse_id(raw_id)?;
        let result = self
            .collection
            .delete_one(self.deadline(), Filter::by_id(id.to_string()))
            .await
            .map_err(|e| ApiError::persistence("Failed to delete task", e))?;
        tracing::debug!(task_id = %id, deleted = result.deleted_count, "task delete");
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────

    pub async fn list(&self, request: PageRequest) -> Result<TaskPage, ApiError> {
        let start = Instant::now();
        let total = self
            .collection
            .count_documents(self.deadline(), Filter::all())
            .await
            .map_err(|e| ApiError::persistence("Failed to count tasks", e))?;

        let options = FindOptions::new()
            .skip(request.skip())
            .limit(request.limit)
            .sort(Sort::descending(CREATED_AT_PATH));
        let docs = self
            .collection
            .find(self.deadline(), Filter::all(), options)
            .await
            .map_err(|e| ApiError::persistence("Failed to fetch tasks", e))?;
        let tasks = docs.into_iter().map(Self::decode).collect::<Result<Vec<_>, _>>()?;

        let duration = start.elapsed().as_secs_f64();
        tracing::debug!(total, page = request.page, returned = tasks.len(), duration, "tasks listed");
        Ok(TaskPage { tasks, info: PageInfo::new(total, request), duration })
    }

    pub async fn get(&self, id: TaskId) -> Result<Task, ApiError> {
        let doc = self
            .collection
            .find_one(self.deadline(), Filter::by_id(id.to_string()))
            .await
            .map_err(|e| ApiError::persistence("Failed to retrieve task", e))?
            .ok_or_else(|| Self::not_found(id))?;
        Self::decode(doc)
    }

    pub async fn ping(&self) -> Result<(), ApiError> {
        self.collection.ping(self.deadline()).await?;
        Ok(())
    }
}
