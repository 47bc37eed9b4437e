//! Report date windows

use crate::config::TapConfig;
use chrono::{Days, NaiveDate};

/// First report day to request
///
/// Resumes from the bookmark, then reaches back `conversion_window` days so
/// late-attributed conversions are read again. Never earlier than
/// `starts_at`.
pub fn report_start(config: &TapConfig, bookmark: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    let resume = bookmark.map_or(config.starts_at, |b| b.max(config.starts_at));
    let look_back = today
        .checked_sub_days(Days::new(u64::from(config.conversion_window)))
        .unwrap_or(NaiveDate::MIN);

    resume.min(look_back).max(config.starts_at)
}

/// Days to request, one window each, through `ends_at` (or today)
///
/// Empty when the start lies after the last day.
pub fn report_windows(
    config: &TapConfig,
    bookmark: Option<NaiveDate>,
    today: NaiveDate,
) -> Vec<NaiveDate> {
    let start = report_start(config, bookmark, today);
    let end = config.ends_at.unwrap_or(today);

    start.iter_days().take_while(|day| *day <= end).collect()
}
