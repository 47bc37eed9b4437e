//! Cursor and single-page strategies

use super::types::{extract_path, NextPage, PaginationState, Paginator};
use serde_json::Value;
use tracing::warn;

/// Opaque cursor echoed back as a query parameter
///
/// The walk ends when the response has no cursor, an empty one, or
/// repeats the cursor that produced it.
#[derive(Debug, Clone)]
pub struct CursorPaginator {
    /// Query parameter the cursor is sent in
    pub cursor_param: String,
    /// Where the next cursor sits in the body
    pub cursor_path: String,
}

impl CursorPaginator {
    pub fn new(cursor_param: impl Into<String>, cursor_path: impl Into<String>) -> Self {
        Self {
            cursor_param: cursor_param.into(),
            cursor_path: cursor_path.into(),
        }
    }
}

impl Paginator for CursorPaginator {
    fn page_params(&self, state: &PaginationState) -> Vec<(String, String)> {
        state
            .cursor
            .iter()
            .map(|cursor| (self.cursor_param.clone(), cursor.clone()))
            .collect()
    }

    fn advance(&self, body: &Value, records: usize, state: &mut PaginationState) -> NextPage {
        state.record_page(records);

        let next = extract_path(body, &self.cursor_path).filter(|c| !c.is_empty());
        match next {
            None => NextPage::Done,
            Some(cursor) if state.cursor.as_ref() == Some(&cursor) => {
                warn!("API returned the same cursor twice ({cursor}), stopping pagination");
                NextPage::Done
            }
            Some(cursor) => {
                state.cursor = Some(cursor.clone());
                NextPage::Cursor(cursor)
            }
        }
    }
}

/// The whole collection arrives in one response
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPaginator;

impl Paginator for NoPaginator {
    fn page_params(&self, _state: &PaginationState) -> Vec<(String, String)> {
        Vec::new()
    }

    fn advance(&self, _body: &Value, records: usize, state: &mut PaginationState) -> NextPage {
        state.record_page(records);
        NextPage::Done
    }
}
