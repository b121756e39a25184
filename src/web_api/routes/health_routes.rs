use std::sync::Arc;
use axum::{Router, routing::get};
use crate::{app_state::AppState, health_controller::HealthController};

pub const ROUTER_PATH: &str = "/health";

pub fn get_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(ROUTER_PATH, get(HealthController::get))
        .with_state(app_state)
}
