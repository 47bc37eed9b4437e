//! Pagination
//!
//! List endpoints return a page of `data` plus an opaque
//! `pagination.next_cursor`; the single-object account endpoint has no
//! pages at all. Each strategy maps a response onto the parameters of the
//! next request and marks the walk done in `PaginationState`.

mod strategies;
mod types;

pub use strategies::{CursorPaginator, NoPaginator};
pub use types::{extract_path, NextPage, PaginationState, Paginator};
