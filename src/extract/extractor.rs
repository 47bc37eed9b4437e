//! Page fetching

use super::windows::report_windows;
use crate::config::TapConfig;
use crate::decode::{JsonDecoder, RecordDecoder};
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::pagination::{CursorPaginator, NoPaginator, PaginationState, Paginator};
use crate::streams::TapStream;
use crate::types::JsonValue;
use chrono::NaiveDate;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Query parameter carrying the next-page cursor
pub const CURSOR_PARAM: &str = "cursor";

/// Location of the next-page cursor in a response body
pub const CURSOR_PATH: &str = "pagination.next_cursor";

/// Date format of report window parameters
const WINDOW_FORMAT: &str = "%Y-%m-%d";

/// One fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Stream the records belong to
    pub stream: TapStream,
    /// Report day, `None` for full-table streams
    pub window: Option<NaiveDate>,
    /// Page number within the window, starting at 1
    pub number: u32,
    /// Raw records
    pub records: Vec<JsonValue>,
    /// No further pages follow for this window
    pub last_in_window: bool,
}

/// Lazy sequence of pages
pub type PageStream<'a> = BoxStream<'a, Result<Page>>;

/// Iteration state carried between pages
struct Cursor {
    windows: VecDeque<Option<NaiveDate>>,
    active: Option<(Option<NaiveDate>, PaginationState)>,
}

/// Fetches stream pages from the Ads API
#[derive(Debug)]
pub struct Extractor {
    client: HttpClient,
    config: TapConfig,
    decoder: JsonDecoder,
}

impl Extractor {
    /// Create an extractor over an authenticated client
    pub fn new(client: HttpClient, config: TapConfig) -> Self {
        Self {
            client,
            config,
            decoder: JsonDecoder::data_envelope(),
        }
    }

    /// Tap configuration
    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// Windows a stream is read in
    ///
    /// Reports get one window per day starting from the bookmark; other
    /// streams get a single unbounded window.
    pub fn windows(
        &self,
        stream: TapStream,
        bookmark: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Vec<Option<NaiveDate>> {
        match stream {
            TapStream::AdsReports => report_windows(&self.config, bookmark, today)
                .into_iter()
                .map(Some)
                .collect(),
            _ => vec![None],
        }
    }

    /// Lazily fetch every page of a stream
    ///
    /// Nothing is requested until the stream is polled. Restarting from a
    /// later bookmark skips the windows before it.
    pub fn fetch(
        &self,
        stream: TapStream,
        bookmark: Option<NaiveDate>,
        today: NaiveDate,
    ) -> PageStream<'_> {
        let windows: VecDeque<_> = self.windows(stream, bookmark, today).into();
        match (windows.front(), windows.back()) {
            (Some(Some(first)), Some(Some(last))) => {
                info!(stream = %stream, "Requesting report days {first} through {last}");
            }
            (None, _) => info!(stream = %stream, "No report days to request"),
            _ => {}
        }

        let cursor = Cursor {
            windows,
            active: None,
        };

        stream::try_unfold(cursor, move |mut cursor| async move {
            let (window, mut pagination) = match cursor.active.take() {
                Some(active) => active,
                None => match cursor.windows.pop_front() {
                    Some(window) => (window, PaginationState::new()),
                    None => return Ok(None),
                },
            };

            let page = self.fetch_page(stream, window, &mut pagination).await?;
            if !page.last_in_window {
                cursor.active = Some((window, pagination));
            }
            Ok(Some((page, cursor)))
        })
        .boxed()
    }

    async fn fetch_page(
        &self,
        stream: TapStream,
        window: Option<NaiveDate>,
        pagination: &mut PaginationState,
    ) -> Result<Page> {
        let paginator = paginator_for(stream);
        let url = self.config.endpoint_url(stream.endpoint())?;

        let mut request = RequestConfig::new();
        if let Some(day) = window {
            let day = day.format(WINDOW_FORMAT).to_string();
            debug!(stream = %stream, "Querying date {day}");
            request = request.query("starts_at", &day).query("ends_at", &day);
        }
        for (key, value) in paginator.page_params(pagination) {
            request = request.query(key, value);
        }

        let body = self.client.get_json(&url, request).await?;
        let records = self.decoder.decode(&body)?;
        let next = paginator.advance(&body, records.len(), pagination);

        debug!(
            stream = %stream,
            page = pagination.page,
            records = records.len(),
            total = pagination.total_fetched,
            "Fetched page"
        );

        Ok(Page {
            stream,
            window,
            number: pagination.page,
            records,
            last_in_window: next.is_done(),
        })
    }
}

fn paginator_for(stream: TapStream) -> Box<dyn Paginator> {
    if stream.is_paginated() {
        Box::new(CursorPaginator::new(CURSOR_PARAM, CURSOR_PATH))
    } else {
        Box::new(NoPaginator)
    }
}
