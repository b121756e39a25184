use std::sync::Arc;
use axum::{Router, routing::{get, patch}};
use crate::{app_state::AppState, task_controller::TaskController};

pub const ROUTER_PATH: &str = "/tasks";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(ROUTER_PATH, get(TaskController::list).post(TaskController::create))
        .route(
            format!("{}/:id", ROUTER_PATH).as_str(),
            get(TaskController::get).patch(TaskController::patch).delete(TaskController::delete),
        )
        .route(format!("{}/:id/complete", ROUTER_PATH).as_str(), patch(TaskController::toggle_complete))
        .with_state(app_state)
}
