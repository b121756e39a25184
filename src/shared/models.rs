pub mod api_error;
pub mod app_state;
pub mod clock;
pub mod pagination;
pub mod settings;
pub mod task;
pub mod task_patch;
pub mod task_priority;
