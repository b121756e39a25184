use std::sync::Arc;

use crate::data_access::collection::DocumentCollection;
use crate::services::task_service::TaskService;
use crate::settings::Timeouts;

pub struct AppState {
    pub tasks: TaskService,
}

impl AppState {
    pub fn new(collection: Arc<dyn DocumentCollection>, timeouts: Timeouts) -> Self {
        AppState { tasks: TaskService::new(collection, timeouts) }
    }
}

pub type SharedState = Arc<AppState>;
