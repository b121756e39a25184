// Requests
pub mod create_task_request;
pub mod list_tasks_query;


// Responses
pub mod error_response;
pub mod health_response;
pub mod task_created_response;
pub mod task_get_response;
pub mod task_list_response;
pub mod task_patch_response;
pub mod task_response;
pub mod task_toggle_response;
