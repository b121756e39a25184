use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::{
    api_error::ApiError,
    app_state::SharedState,
    create_task_request::CreateTaskRequest,
    list_tasks_query::ListTasksQuery,
    services::task_service::TaskService,
    task_created_response::TaskCreatedResponse,
    task_get_response::TaskGetResponse,
    task_list_response::TaskListResponse,
    task_patch::PatchOutcome,
    task_patch_response::TaskPatchResponse,
    task_toggle_response::TaskToggleResponse,
};

pub struct TaskController {}

impl TaskController {
    pub async fn create(
        State(state): State<SharedState>,
        body: Result<Json<CreateTaskRequest>, JsonRejection>,
    ) -> Result<(StatusCode, Json<TaskCreatedResponse>), ApiError> {
        let Json(request) = body?;
        let task = state.tasks.create(request).await?;
        Ok((
            StatusCode::CREATED,
            Json(TaskCreatedResponse {
                message: "Task created successfully".into(),
                id: task.id,
                task: task.to_response(),
            }),
        ))
    }

    pub async fn list(
        State(state): State<SharedState>,
        Query(query): Query<ListTasksQuery>,
    ) -> Result<Json<TaskListResponse>, ApiError> {
        let page = state.tasks.list(query.page_request()).await?;
        Ok(Json(TaskListResponse {
            message: "Tasks retrieved successfully".into(),
            duration: page.duration,
            tasks: page.tasks.iter().map(|t| t.to_response()).collect(),
            pagination: page.info,
        }))
    }

    pub async fn get(
        State(state): State<SharedState>,
        Path(raw_id): Path<String>,
    ) -> Result<Json<TaskGetResponse>, ApiError> {
        let id = TaskService::parse_id(&raw_id)?;
        let task = state.tasks.get(id).await?;
        Ok(Json(TaskGetResponse {
            message: "Task retrieved successfully".into(),
            task: task.to_response(),
        }))
    }

    /// The id is checked before the body so a bad id wins over a bad body.
    pub async fn patch(
        State(state): State<SharedState>,
        Path(raw_id): Path<String>,
        body: Result<Json<Value>, JsonRejection>,
    ) -> Result<Json<TaskPatchResponse>, ApiError> {
        let id = TaskService::parse_id(&raw_id)?;
        let Json(body) = body?;
        let message = "Task updated successfully".to_string();
        let response = match state.tasks.patch(id, body).await? {
            PatchOutcome::FullSuccess(task) => {
                TaskPatchResponse::Updated { message, task: task.to_response() }
            }
            PatchOutcome::PartialSuccess { submitted, warning } => {
                TaskPatchResponse::Degraded { message, modified: submitted, warning }
            }
        };
        Ok(Json(response))
    }

    pub async fn toggle_complete(
        State(state): State<SharedState>,
        Path(raw_id): Path<String>,
    ) -> Result<Json<TaskToggleResponse>, ApiError> {
        let id = TaskService::parse_id(&raw_id)?;
        let task = state.tasks.toggle_complete(id).await?;
        let message = if task.completed {
            "Task marked as complete"
        } else {
            "Task marked as incomplete"
        };
        Ok(Json(TaskToggleResponse {
            message: message.into(),
            task_id: task.id,
            completed: task.completed,
        }))
    }

    pub async fn delete(
        State(state): State<SharedState>,
        Path(raw_id): Path<String>,
    ) -> Result<StatusCode, ApiError> {
        state.tasks.delete(&raw_id).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
