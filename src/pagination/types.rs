//! Pagination state and the strategy trait

use serde_json::Value;

/// Outcome of reading one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Request again with this cursor
    Cursor(String),
    Done,
}

impl NextPage {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Position within one paginated walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationState {
    /// Pages read so far
    pub page: u32,
    /// Cursor for the next request, `None` on the first
    pub cursor: Option<String>,
    /// Records seen across all pages
    pub total_fetched: u64,
}

impl PaginationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a page of `records` as read
    pub fn record_page(&mut self, records: usize) {
        self.page += 1;
        self.total_fetched += records as u64;
    }
}

pub trait Paginator: Send + Sync {
    /// Query parameters selecting the page `state` points at
    fn page_params(&self, state: &PaginationState) -> Vec<(String, String)>;

    /// Record a fetched page and decide whether another one follows
    fn advance(&self, body: &Value, records: usize, state: &mut PaginationState) -> NextPage;
}

/// Scalar at a dotted path such as `pagination.next_cursor`, as a string
///
/// A leading `$.` is ignored. Null, missing, object and array values give
/// `None`.
pub fn extract_path(value: &Value, path: &str) -> Option<String> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    let found = path
        .split('.')
        .try_fold(value, |node, key| node.as_object()?.get(key))?;

    match found {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
