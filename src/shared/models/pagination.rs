use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// A page window after coercion. Bad input never fails a list request, it
/// falls back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT }
    }
}

impl PageRequest {
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = parse_positive(page).unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive(limit)
            .filter(|l| *l <= MAX_LIMIT)
            .unwrap_or(DEFAULT_LIMIT);
        PageRequest { page, limit }
    }

    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw?.trim().parse::<i64>().ok().filter(|n| *n >= 1).map(|n| n as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl PageInfo {
    pub fn new(total: u64, request: PageRequest) -> Self {
        let total_pages = total.div_ceil(request.limit.max(1));
        PageInfo {
            total,
            page: request.page,
            limit: request.limit,
            total_pages,
            has_more: request.page < total_pages,
        }
    }
}
