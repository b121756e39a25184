use serde::Deserialize;

use crate::pagination::PageRequest;

/// Raw `?page=&limit=` values. Kept as strings so junk coerces to the
/// defaults instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListTasksQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.limit.as_deref())
    }
}
