//! Record extraction
//!
//! Turns a stream plus its bookmark into a lazy sequence of pages. Report
//! requests are split into one window per day; every other stream is read
//! in full on each run.

mod extractor;
mod windows;

pub use extractor::{Extractor, Page, PageStream, CURSOR_PARAM, CURSOR_PATH};
pub use windows::{report_start, report_windows};
