use axum::{extract::State, Json};

use crate::{api_error::ApiError, app_state::SharedState, health_response::HealthResponse};

pub struct HealthController {}

impl HealthController {
    pub async fn get(State(state): State<SharedState>) -> Result<Json<HealthResponse>, ApiError> {
        state.tasks.ping().await?;
        Ok(Json(HealthResponse { status: "ok".into() }))
    }
}
